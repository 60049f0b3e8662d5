// Hand-written to match the tables created by `DbContext::init_schema`.

diesel::table! {
    products (id) {
        id -> BigInt,
        seller -> Text,
        name -> Text,
        currency -> Text,
        price -> Double,
        price_per_unit -> Double,
        discount_price -> Double,
        discount_price_per_unit -> Double,
        discount_price_in_words -> Text,
        unit_type -> Text,
        url -> Text,
        image_url -> Text,
    }
}

diesel::table! {
    searches (search_term) {
        search_term -> Text,
        fetch_count -> Integer,
        last_fetch -> Text,
        expiry -> Text,
    }
}

diesel::table! {
    search_products (search_term, generation, position) {
        search_term -> Text,
        generation -> Integer,
        position -> Integer,
        product_id -> BigInt,
    }
}

diesel::table! {
    baskets (client_id, product_id) {
        client_id -> Text,
        product_id -> BigInt,
        added_at -> Text,
    }
}

diesel::joinable!(search_products -> products (product_id));
diesel::joinable!(baskets -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(products, searches, search_products, baskets);
