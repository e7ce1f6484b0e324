use axum::{extract::State, http::HeaderMap, Json};

use crate::{
    error::Result,
    models::{ApiResponse, CurrentUser},
};

use super::{require_user, AppState};

/// GET /api/v1/profile/me
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CurrentUser>>> {
    let user = require_user(&headers, &state)?;
    Ok(Json(ApiResponse::success(user)))
}
