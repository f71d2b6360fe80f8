//! Administrative stock handler.

use std::sync::Arc;

use axum::extract::State;
use serde::Deserialize;

use comicshop_core::{Comic, ComicId};

use super::required;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Stock update request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockRequest {
    /// Comic to update.
    #[serde(default)]
    pub comic_id: Option<String>,
    /// The comic's new total stock.
    #[serde(default)]
    pub new_stock: Option<i64>,
}

/// Overwrite a comic's total stock. Returns the updated rows.
///
/// `POST /api/stock`
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<UpdateStockRequest>,
) -> Result<ApiJson<Vec<Comic>>, ApiError> {
    let comic_id: ComicId = required(request.comic_id.as_deref(), "comicId")?;
    let resulting_stock = request
        .new_stock
        .ok_or_else(|| ApiError::BadRequest("newStock is required".into()))?;
    if resulting_stock < 0 {
        return Err(ApiError::BadRequest("newStock must be >= 0".into()));
    }

    let comic = state.store.set_stock(&comic_id, resulting_stock).await?;
    tracing::info!(comic_id = %comic_id, stock = comic.stock, "Stock updated");

    Ok(ApiJson(vec![comic]))
}
