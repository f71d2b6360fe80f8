//! Cart handlers.

use std::sync::Arc;

use axum::extract::State;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use comicshop_core::{CartItem, Comic, ComicId, ShopError, UserId};

use super::required;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

/// Cart query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuery {
    /// Cart owner.
    pub user_id: Option<String>,
}

/// A cart row with the comic it refers to.
#[derive(Debug, Serialize)]
pub struct CartLine {
    /// The cart row.
    #[serde(flatten)]
    pub item: CartItem,
    /// The comic, unless it has been delisted.
    pub comic: Option<Comic>,
}

/// Cart response.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    /// Rows in the order they were added.
    pub items: Vec<CartLine>,
}

/// List a user's cart.
///
/// `GET /api/cart?userId=`
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CartQuery>,
) -> Result<ApiJson<CartResponse>, ApiError> {
    let user_id: UserId = required(query.user_id.as_deref(), "userId")?;
    let rows = state.store.list_cart(&user_id).await?;

    let comics = try_join_all(rows.iter().map(|row| state.store.get_comic(&row.comic_id))).await?;

    let items = rows
        .into_iter()
        .zip(comics)
        .map(|(item, comic)| CartLine { item, comic })
        .collect();

    Ok(ApiJson(CartResponse { items }))
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    /// Cart owner.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Comic to add.
    #[serde(default)]
    pub comic_id: Option<String>,
    /// Units to add (default 1).
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Add a comic to a cart. Returns the resulting row.
///
/// `POST /api/cart`
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<AddToCartRequest>,
) -> Result<ApiJson<CartItem>, ApiError> {
    let user_id: UserId = required(request.user_id.as_deref(), "userId")?;
    let comic_id: ComicId = required(request.comic_id.as_deref(), "comicId")?;
    let quantity = request.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(ApiError::BadRequest("quantity must be positive".into()));
    }

    if state.store.get_comic(&comic_id).await?.is_none() {
        return Err(ShopError::not_found("comic", comic_id).into());
    }

    let row = state
        .store
        .add_to_cart(&CartItem::new(user_id, comic_id, quantity))
        .await?;
    Ok(ApiJson(row))
}
