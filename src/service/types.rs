//! Request, health and error types for the VRS web service

use axum::{http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

use crate::error::FerroError;
use crate::query::ServiceMeta;
use crate::reference::{Assembly, ResidueMode};
use crate::translate::DupDelMode;
use crate::vrs::CopyChange;

/// `GET /variation/to_vrs`
#[derive(Debug, Clone, Deserialize)]
pub struct ToVrsParams {
    pub q: String,
}

/// `GET /variation/normalize`
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeParams {
    pub q: String,
    #[serde(default)]
    pub hgvs_dup_del_mode: DupDelMode,
    #[serde(default)]
    pub baseline_copies: Option<u64>,
    #[serde(default)]
    pub copy_change: Option<CopyChange>,
}

/// `GET /variation/hgvs_to_copy_number_count`
#[derive(Debug, Clone, Deserialize)]
pub struct HgvsToCopyNumberCountParams {
    pub hgvs_expr: String,
    pub baseline_copies: u64,
    #[serde(default)]
    pub do_liftover: bool,
}

/// `GET /variation/hgvs_to_copy_number_change`
#[derive(Debug, Clone, Deserialize)]
pub struct HgvsToCopyNumberChangeParams {
    pub hgvs_expr: String,
    #[serde(default)]
    pub copy_change: Option<CopyChange>,
    #[serde(default)]
    pub do_liftover: bool,
}

/// `GET /variation/alignment_mapper/p_to_c`
#[derive(Debug, Clone, Deserialize)]
pub struct ProteinToCdnaParams {
    pub p_ac: String,
    pub p_start_pos: u64,
    pub p_end_pos: u64,
    #[serde(default)]
    pub residue_mode: ResidueMode,
}

/// `GET /variation/alignment_mapper/c_to_g`
#[derive(Debug, Clone, Deserialize)]
pub struct CdnaToGenomicParams {
    pub c_ac: String,
    pub c_start_pos: u64,
    pub c_end_pos: u64,
    #[serde(default)]
    pub cds_start: Option<u64>,
    #[serde(default)]
    pub residue_mode: ResidueMode,
    #[serde(default)]
    pub target_genome_assembly: Assembly,
}

/// `GET /variation/alignment_mapper/p_to_g`
#[derive(Debug, Clone, Deserialize)]
pub struct ProteinToGenomicParams {
    pub p_ac: String,
    pub p_start_pos: u64,
    pub p_end_pos: u64,
    #[serde(default)]
    pub residue_mode: ResidueMode,
    #[serde(default)]
    pub target_genome_assembly: Assembly,
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Whether chain files were configured for liftover
    pub liftover_configured: bool,
    pub service_meta: ServiceMeta,
}

/// Standard error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Service error types
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Convert to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidQuery(_) | ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::ConfigError(_) | ServiceError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Convert to error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: match self {
                ServiceError::InvalidQuery(_) => "invalid_query".to_string(),
                ServiceError::BadRequest(_) => "bad_request".to_string(),
                ServiceError::ConfigError(_) => "config_error".to_string(),
                ServiceError::InternalError(_) => "internal_error".to_string(),
            },
            message: self.to_string(),
            details: None,
        }
    }

    /// Status and body for an axum handler rejection
    pub fn into_rejection(self) -> (StatusCode, Json<ErrorResponse>) {
        (self.status_code(), Json(self.to_response()))
    }
}

impl From<FerroError> for ServiceError {
    fn from(err: FerroError) -> Self {
        match err {
            FerroError::Config { .. } | FerroError::Io { .. } | FerroError::Json { .. } => {
                ServiceError::ConfigError(err.to_string())
            }
            other => ServiceError::InternalError(other.detailed_message()),
        }
    }
}
