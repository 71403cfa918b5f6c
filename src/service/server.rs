//! Web server setup using Axum framework

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::context::QueryContext;
use crate::query::QueryHandler;
use crate::service::{
    config::ServiceConfig,
    handlers,
    types::{ErrorResponse, ServiceError},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Runs every query operation
    pub handler: Arc<QueryHandler>,
    /// Service configuration
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(handler: QueryHandler, config: ServiceConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            config: Arc::new(config),
        }
    }
}

/// Create the Axum application, building collaborators from configuration
pub fn create_app(config: ServiceConfig) -> Result<(Router, AppState), ServiceError> {
    let ctx = QueryContext::from_config(&config.normalizer)?;
    let handler = QueryHandler::new(ctx)?;
    let state = AppState::new(handler, config);
    let app = build_router(state.clone())?;
    Ok((app, state))
}

/// Routes and middleware over an existing state
pub fn build_router(state: AppState) -> Result<Router, ServiceError> {
    let max_size = parse_size(&state.config.server.max_request_size)
        .map_err(|e| ServiceError::ConfigError(format!("Invalid max_request_size: {}", e)))?;

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/variation/to_vrs", get(handlers::variation::to_vrs))
        .route("/variation/normalize", get(handlers::variation::normalize))
        .route(
            "/variation/hgvs_to_copy_number_count",
            get(handlers::variation::hgvs_to_copy_number_count),
        )
        .route(
            "/variation/hgvs_to_copy_number_change",
            get(handlers::variation::hgvs_to_copy_number_change),
        )
        .route(
            "/variation/parsed_to_cn_var",
            post(handlers::variation::parsed_to_cn_var),
        )
        .route(
            "/variation/parsed_to_cx_var",
            post(handlers::variation::parsed_to_cx_var),
        )
        .route(
            "/variation/amplification_to_cx_var",
            get(handlers::variation::amplification_to_cx_var),
        )
        .route(
            "/variation/alignment_mapper/p_to_c",
            get(handlers::variation::p_to_c),
        )
        .route(
            "/variation/alignment_mapper/c_to_g",
            get(handlers::variation::c_to_g),
        )
        .route(
            "/variation/alignment_mapper/p_to_g",
            get(handlers::variation::p_to_g),
        )
        .fallback(handle_404)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_size));

    Ok(app)
}

/// Handle 404 errors
async fn handle_404() -> (StatusCode, Json<ErrorResponse>) {
    let error = ServiceError::BadRequest("Endpoint not found".to_string());
    (StatusCode::NOT_FOUND, Json(error.to_response()))
}

/// Parse size strings like "10MB", "1GB", etc.
fn parse_size(size_str: &str) -> Result<usize, String> {
    let size_str = size_str.to_uppercase();

    // Longer suffixes first so "MB" is not read as "B"
    for (suffix, scale) in [("GB", 1024 * 1024 * 1024), ("MB", 1024 * 1024), ("KB", 1024), ("B", 1)] {
        if let Some(num_str) = size_str.strip_suffix(suffix) {
            let num: usize = num_str
                .parse()
                .map_err(|_| format!("Invalid size format: {}", size_str))?;
            return Ok(num * scale);
        }
    }

    size_str
        .parse::<usize>()
        .map_err(|_| format!("Invalid size format: {}", size_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("100").unwrap(), 100);
        assert_eq!(parse_size("100B").unwrap(), 100);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("10MB").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_size("1GB").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("10mb").unwrap(), 10 * 1024 * 1024);

        assert!(parse_size("invalid").is_err());
        assert!(parse_size("10XB").is_err());
    }

    #[test]
    fn test_create_app_with_defaults() {
        let (_, state) = create_app(ServiceConfig::default()).unwrap();
        assert_eq!(state.config.server.port, 8000);
    }

    #[test]
    fn test_bad_body_limit_is_config_error() {
        let mut config = ServiceConfig::default();
        config.server.max_request_size = "lots".to_string();
        assert!(matches!(
            create_app(config),
            Err(ServiceError::ConfigError(_))
        ));
    }
}
