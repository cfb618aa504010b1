use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Serialize;

use crate::{
    AppState,
    error::ApiError,
    history::{HistoryParams, HistoryQuery},
    measurement::{SiteOutcome, run_measurement_round},
    sites::Site,
    store::PingRecord,
};

/// The `{ success, data | error }` envelope every endpoint answers with.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[axum::debug_handler]
pub async fn trigger_round(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SiteOutcome>>>, ApiError> {
    let outcomes = run_measurement_round(&state).await?;
    Ok(Json(ApiResponse::ok(outcomes)))
}

#[axum::debug_handler]
pub async fn get_history(
    State(state): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<PingRecord>>>, ApiError> {
    let Query(params) = params?;
    let query = HistoryQuery::from_params(params)?;
    let records = state.store.history(&query).await?;
    Ok(Json(ApiResponse::ok(records)))
}

pub async fn list_sites(State(state): State<AppState>) -> Json<ApiResponse<Vec<Site>>> {
    Json(ApiResponse::ok(state.sites.to_vec()))
}
