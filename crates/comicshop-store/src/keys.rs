//! Key encoding for the `RocksDB` column families.

use comicshop_core::{ComicId, OrderId, UserId};

/// Profile key.
#[must_use]
pub fn profile_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Comic key.
#[must_use]
pub fn comic_key(comic_id: &ComicId) -> Vec<u8> {
    comic_id.as_bytes().to_vec()
}

/// Order key. Also the key of the order's receipt.
#[must_use]
pub fn order_key(order_id: &OrderId) -> Vec<u8> {
    order_id.to_bytes().to_vec()
}

/// Buyer index key: `user_id (16 bytes) || order_id (16 bytes)`.
///
/// ULIDs sort by time, so a prefix scan yields a buyer's orders oldest first.
#[must_use]
pub fn user_order_key(user_id: &UserId, order_id: &OrderId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&order_id.to_bytes());
    key
}

/// Cart key: `user_id (16 bytes) || comic_id (16 bytes)`.
#[must_use]
pub fn cart_key(user_id: &UserId, comic_id: &ComicId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(comic_id.as_bytes());
    key
}

/// Prefix shared by every key that starts with `user_id`.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// The order ID half of a buyer index key, or `None` for a short key.
#[must_use]
pub fn order_id_from_user_key(key: &[u8]) -> Option<OrderId> {
    let bytes: [u8; 16] = key.get(16..32)?.try_into().ok()?;
    Some(OrderId::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_keys_start_with_user() {
        let user_id = UserId::generate();
        let order_id = OrderId::generate();
        let comic_id = ComicId::generate();

        let order_key = user_order_key(&user_id, &order_id);
        assert_eq!(order_key.len(), 32);
        assert!(order_key.starts_with(&user_prefix(&user_id)));
        assert!(cart_key(&user_id, &comic_id).starts_with(&user_prefix(&user_id)));
    }

    #[test]
    fn order_id_is_recovered_from_index_key() {
        let user_id = UserId::generate();
        let order_id = OrderId::generate();
        let key = user_order_key(&user_id, &order_id);

        assert_eq!(order_id_from_user_key(&key), Some(order_id));
        assert_eq!(order_id_from_user_key(&key[..20]), None);
    }
}
