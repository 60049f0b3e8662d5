//! Measurement units and their canonical families.

use serde::{Deserialize, Serialize};

/// Canonical basis a per-unit price is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Kilogram,
    Litre,
    Each,
    #[default]
    Unknown,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Kilogram => "kilogram",
            UnitType::Litre => "litre",
            UnitType::Each => "each",
            UnitType::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for UnitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kilogram" => Ok(UnitType::Kilogram),
            "litre" => Ok(UnitType::Litre),
            "each" => Ok(UnitType::Each),
            "unknown" => Ok(UnitType::Unknown),
            _ => Err(format!("Unknown unit type: {}", s)),
        }
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A measurement unit as printed on a listing, before canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureUnit {
    Kilogram,
    Gram,
    Litre,
    Millilitre,
    Centilitre,
    Each,
}

impl MeasureUnit {
    pub const ALL: [MeasureUnit; 6] = [
        MeasureUnit::Kilogram,
        MeasureUnit::Gram,
        MeasureUnit::Litre,
        MeasureUnit::Millilitre,
        MeasureUnit::Centilitre,
        MeasureUnit::Each,
    ];

    /// Spellings accepted for this unit. Matching is exact and case-sensitive,
    /// and no spelling appears under more than one unit.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            MeasureUnit::Kilogram => &["kilograms", "kilogram", "kilo", "kg"],
            MeasureUnit::Gram => &["grams", "gram", "g"],
            MeasureUnit::Litre => &["litres", "litre", "l"],
            MeasureUnit::Millilitre => &["millilitres", "millilitre", "ml"],
            MeasureUnit::Centilitre => &["centilitres", "centilitre", "cl"],
            MeasureUnit::Each => &["each", "unit", "units", "item", "items", "sht"],
        }
    }

    /// Classify a unit token such as `"kg"` or `"70cl"`'s `"cl"`.
    pub fn classify(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.synonyms().contains(&token))
    }

    /// The canonical family this unit is reported in.
    pub fn unit_type(self) -> UnitType {
        match self {
            MeasureUnit::Kilogram | MeasureUnit::Gram => UnitType::Kilogram,
            MeasureUnit::Litre | MeasureUnit::Millilitre | MeasureUnit::Centilitre => {
                UnitType::Litre
            }
            MeasureUnit::Each => UnitType::Each,
        }
    }

    /// Convert `amount` charged for `quantity` of this unit into a price per
    /// canonical unit.
    ///
    /// Whole units (kilogram, litre) are taken as already canonical. Item
    /// prices scale by quantity.
    pub fn canonicalize(self, amount: f64, quantity: f64) -> f64 {
        match self {
            MeasureUnit::Kilogram | MeasureUnit::Litre => amount,
            MeasureUnit::Gram | MeasureUnit::Millilitre => amount * (1000.0 / quantity),
            MeasureUnit::Centilitre => amount * (100.0 / quantity),
            MeasureUnit::Each => amount * quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_synonyms_are_disjoint() {
        let mut seen = HashSet::new();
        for unit in MeasureUnit::ALL {
            for synonym in unit.synonyms() {
                assert!(seen.insert(*synonym), "{} listed twice", synonym);
            }
        }
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(MeasureUnit::classify("kg"), Some(MeasureUnit::Kilogram));
        assert_eq!(MeasureUnit::classify("KG"), None);
        assert_eq!(MeasureUnit::classify("l"), Some(MeasureUnit::Litre));
        assert_eq!(MeasureUnit::classify("L"), None);
    }

    #[test]
    fn test_unit_families() {
        assert_eq!(MeasureUnit::Gram.unit_type(), UnitType::Kilogram);
        assert_eq!(MeasureUnit::Centilitre.unit_type(), UnitType::Litre);
        assert_eq!(MeasureUnit::Each.unit_type(), UnitType::Each);
    }

    #[test]
    fn test_unit_type_roundtrip_strings() {
        for unit_type in [
            UnitType::Kilogram,
            UnitType::Litre,
            UnitType::Each,
            UnitType::Unknown,
        ] {
            assert_eq!(unit_type.as_str().parse::<UnitType>(), Ok(unit_type));
        }
        assert!("stone".parse::<UnitType>().is_err());
        assert!("Kilogram".parse::<UnitType>().is_err());
    }

    #[test]
    fn test_unit_type_serializes_lowercase() {
        let json = serde_json::to_string(&UnitType::Kilogram).unwrap();
        assert_eq!(json, "\"kilogram\"");
    }
}
