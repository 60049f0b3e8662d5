//! User agent selection for seller requests.
//!
//! Grocery search pages serve reduced markup to unknown clients, so the
//! default is a current desktop browser string rather than a bot identifier.

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Browser user agents `rotate` mode chooses from.
pub const ROTATING_USER_AGENTS: &[&str] = &[
    DEFAULT_USER_AGENT,
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
];

fn rotating_user_agent() -> &'static str {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as usize)
        .unwrap_or(0);
    ROTATING_USER_AGENTS[nanos % ROTATING_USER_AGENTS.len()]
}

/// Resolve user agent from config value.
/// - None => default browser user agent
/// - "rotate" => one of `ROTATING_USER_AGENTS`, picked on each call
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config {
        None | Some("") => DEFAULT_USER_AGENT.to_string(),
        Some("rotate") => rotating_user_agent().to_string(),
        Some(custom) => custom.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent() {
        assert_eq!(resolve_user_agent(None), DEFAULT_USER_AGENT);
        assert_eq!(resolve_user_agent(Some("")), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_rotating_user_agent() {
        let ua = resolve_user_agent(Some("rotate"));
        assert!(ROTATING_USER_AGENTS.contains(&ua.as_str()));
    }

    #[test]
    fn test_custom_user_agent() {
        assert_eq!(resolve_user_agent(Some("PriceBot/1.0")), "PriceBot/1.0");
    }
}
