use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use crate::{
    error::Result,
    models::{ApiResponse, EntityKind},
    services::{DirectoryGateway, QuotaStatus, QuotaTracker},
};

use super::{require_user, today, AppState};

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total_agencies: i64,
    pub total_contacts: i64,
    pub daily_contact_limit: i32,
    pub usage: QuotaStatus,
}

/// GET /api/v1/dashboard/summary
///
/// Counts only; viewing the summary never consumes contact quota.
pub async fn get_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<DashboardSummary>>> {
    let user = require_user(&headers, &state)?;

    let gateway = DirectoryGateway::new(state.directory.clone());
    let tracker = QuotaTracker::new(state.usage.clone());

    let total_agencies = gateway.total(EntityKind::Agencies).await?;
    let total_contacts = gateway.total(EntityKind::Contacts).await?;
    let usage = tracker.peek(&user.id, today(&state)).await?;

    Ok(Json(ApiResponse::success(DashboardSummary {
        total_agencies,
        total_contacts,
        daily_contact_limit: tracker.limit(),
        usage,
    })))
}
