//! Catalogue handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use serde::Deserialize;

use comicshop_core::{Comic, ComicId, ShopError};

use super::{page_size, required};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

/// Catalogue paging parameters.
#[derive(Debug, Deserialize)]
pub struct ListComicsQuery {
    /// Page size.
    pub limit: Option<usize>,
    /// Rows to skip.
    pub offset: Option<usize>,
}

/// List comics for sale, oldest listing first.
///
/// `GET /api/comics`
pub async fn list_comics(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListComicsQuery>,
) -> Result<ApiJson<Vec<Comic>>, ApiError> {
    let comics = state
        .store
        .list_comics(page_size(query.limit), query.offset.unwrap_or(0))
        .await?;
    Ok(ApiJson(comics))
}

/// Fetch one comic.
///
/// `GET /api/comics/:id`
pub async fn get_comic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiJson<Comic>, ApiError> {
    let comic_id: ComicId = required(Some(id.as_str()), "comic id")?;
    let comic = state
        .store
        .get_comic(&comic_id)
        .await?
        .ok_or_else(|| ShopError::not_found("comic", comic_id))?;
    Ok(ApiJson(comic))
}
