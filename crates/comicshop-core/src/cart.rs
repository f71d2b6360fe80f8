//! Shopping cart rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ComicId, UserId};

/// A comic in a user's cart. Keyed by `(user_id, comic_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart owner.
    pub user_id: UserId,
    /// Comic in the cart.
    pub comic_id: ComicId,
    /// Units wanted.
    pub quantity: i64,
    /// When the comic was first added.
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Create a cart row stamped with the current time.
    #[must_use]
    pub fn new(user_id: UserId, comic_id: ComicId, quantity: i64) -> Self {
        Self {
            user_id,
            comic_id,
            quantity,
            added_at: Utc::now(),
        }
    }
}
