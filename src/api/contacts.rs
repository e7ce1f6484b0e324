use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use crate::{
    error::Result,
    models::{ApiResponse, ContactWithAgency},
    services::{DirectoryGateway, QuotaOutcome, QuotaStatus, QuotaTracker},
    utils::ensure_page_in_range,
};

use super::{require_user, today, AppState, ListQuery};

#[derive(Debug, Serialize)]
pub struct ContactsPageResponse {
    pub items: Vec<ContactWithAgency>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
    pub page_size: i64,
    pub limit_reached: bool,
    pub usage: QuotaStatus,
}

/// GET /api/v1/contacts
///
/// A reached daily limit is a normal response with no items and
/// `limit_reached` set, so the client can show the upgrade prompt.
pub async fn list_contacts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<ContactsPageResponse>>> {
    let user = require_user(&headers, &state)?;
    let page_query = query.resolve(&state.config)?;
    let day = today(&state);

    let gateway = DirectoryGateway::new(state.directory.clone());
    let tracker = QuotaTracker::new(state.usage.clone());

    let outcome = tracker
        .check_and_consume(&user.id, day, page_query.page_size, || {
            gateway.list_contacts(page_query)
        })
        .await?;

    let response = match outcome {
        QuotaOutcome::Admitted { value: page, status } => {
            ensure_page_in_range(&page)?;
            ContactsPageResponse {
                items: page.items,
                total: page.total,
                total_pages: page.total_pages,
                page: page.page,
                page_size: page.page_size,
                limit_reached: false,
                usage: status,
            }
        }
        QuotaOutcome::Exceeded { status } => ContactsPageResponse {
            items: Vec::new(),
            total: 0,
            total_pages: 0,
            page: page_query.page,
            page_size: page_query.page_size,
            limit_reached: true,
            usage: status,
        },
    };

    Ok(Json(ApiResponse::success(response)))
}

/// GET /api/v1/usage
pub async fn get_usage(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<QuotaStatus>>> {
    let user = require_user(&headers, &state)?;
    let tracker = QuotaTracker::new(state.usage.clone());
    let status = tracker.peek(&user.id, today(&state)).await?;
    Ok(Json(ApiResponse::success(status)))
}
