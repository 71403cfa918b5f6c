//! Health check endpoint

use axum::{extract::State, response::Json};

use crate::query::ServiceMeta;
use crate::service::{server::AppState, types::HealthResponse};

/// Report that the service is up
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let data = &state.config.normalizer.data;
    Json(HealthResponse {
        status: "ok".to_string(),
        liftover_configured: data.grch37_to_38.is_some() || data.grch38_to_37.is_some(),
        service_meta: ServiceMeta::now(),
    })
}
