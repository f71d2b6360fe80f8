//! Column families of the embedded `RocksDB` backend.

/// Column family names.
pub mod cf {
    /// Profiles, keyed by `user_id`.
    pub const PROFILES: &str = "profiles";

    /// Comics for sale, keyed by `comic_id`.
    pub const COMICS: &str = "comics";

    /// Orders, keyed by `order_id` (ULID).
    pub const ORDERS: &str = "orders";

    /// Index: orders by buyer, keyed by `user_id || order_id`. Empty values.
    pub const ORDERS_BY_USER: &str = "orders_by_user";

    /// Receipts, keyed by the `order_id` they pay for. One per order.
    pub const RECEIPTS_BY_ORDER: &str = "receipts_by_order";

    /// Cart rows, keyed by `user_id || comic_id`.
    pub const CART: &str = "cart";
}

/// Every column family, for opening the database.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::PROFILES,
        cf::COMICS,
        cf::ORDERS,
        cf::ORDERS_BY_USER,
        cf::RECEIPTS_BY_ORDER,
        cf::CART,
    ]
}
