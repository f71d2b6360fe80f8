//! Profiles and comics listed for sale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ComicId, UserId};

/// A user profile held by the hosted auth backend.
///
/// The storefront only reads the display name when an order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// The profile's user ID.
    pub user_id: UserId,
    /// Display name copied onto orders.
    pub username: String,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Create a profile with the current timestamp.
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            created_at: Utc::now(),
        }
    }
}

/// A comic listed for sale, with its remaining stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comic {
    /// Comic ID.
    pub id: ComicId,
    /// Seller's user ID.
    pub user_id: UserId,
    /// Title shown in the storefront.
    pub title: String,
    /// Unit price in minor units.
    pub price_cents: i64,
    /// Lower-case ISO-4217 currency code.
    pub currency: String,
    /// Units left. Never negative.
    pub stock: i64,
    /// Cover image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// When the listing was created.
    pub created_at: DateTime<Utc>,
    /// When the listing was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Comic {
    /// Create a listing with a fresh ID.
    #[must_use]
    pub fn new(
        seller: UserId,
        title: impl Into<String>,
        price_cents: i64,
        currency: impl Into<String>,
        stock: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ComicId::generate(),
            user_id: seller,
            title: title.into(),
            price_cents,
            currency: currency.into(),
            stock,
            image: None,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a cover image URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}
