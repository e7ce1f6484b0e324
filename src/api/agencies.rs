use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};

use crate::{
    error::Result,
    models::{Agency, ApiResponse, Page},
    services::DirectoryGateway,
    utils::ensure_page_in_range,
};

use super::{require_user, AppState, ListQuery};

/// GET /api/v1/agencies
pub async fn list_agencies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<Agency>>>> {
    let user = require_user(&headers, &state)?;
    let page_query = query.resolve(&state.config)?;

    let gateway = DirectoryGateway::new(state.directory.clone());
    let page = gateway.list_agencies(page_query).await?;
    ensure_page_in_range(&page)?;

    tracing::debug!("User {} viewed agencies page {}", user.id, page.page);
    Ok(Json(ApiResponse::success(page)))
}
