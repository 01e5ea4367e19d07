use axum::{
    Extension, Json,
    extract::State,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_payment_reference;
use super::{ApiError, ApiKeyDto, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct IssueKeyRequest {
    #[serde(default)]
    pub reference: String,
}

/// GET /api-key
pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ApiKeyDto>>, ApiError> {
    let api_key = state.api_keys().current(user.id).await?;
    Ok(Json(ApiResponse::success(ApiKeyDto { api_key })))
}

/// POST /api-key
/// Exchange a verified payment reference for an API key
pub async fn issue_api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<IssueKeyRequest>,
) -> Result<Json<ApiResponse<ApiKeyDto>>, ApiError> {
    let reference = validate_payment_reference(&payload.reference)?;

    let api_key = state.api_keys().issue(user.id, reference).await?;

    Ok(Json(ApiResponse::success(ApiKeyDto {
        api_key: Some(api_key),
    })))
}
