//! Response bodies returned by [`QueryHandler`](super::QueryHandler)
//!
//! Every response carries `warnings`; domain failures never become errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alignment::{CdnaRepresentation, GenomicRepresentation};
use crate::vrs::{CopyNumberChange, CopyNumberCount, Variation};

/// Service name reported in [`ServiceMeta`]
pub const SERVICE_NAME: &str = "ferro-vrs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMeta {
    pub name: String,
    pub version: String,
    pub response_datetime: DateTime<Utc>,
}

impl ServiceMeta {
    pub fn now() -> Self {
        Self {
            name: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            response_datetime: Utc::now(),
        }
    }
}

impl Default for ServiceMeta {
    fn default() -> Self {
        Self::now()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToVrsResponse {
    pub search_term: String,
    pub variations: Vec<Variation>,
    pub warnings: Vec<String>,
    pub service_meta: ServiceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeResponse {
    pub variation_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<Variation>,
    pub warnings: Vec<String>,
    pub service_meta: ServiceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HgvsToCopyNumberCountResponse {
    pub hgvs_expr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_number_count: Option<CopyNumberCount>,
    pub warnings: Vec<String>,
    pub service_meta: ServiceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HgvsToCopyNumberChangeResponse {
    pub hgvs_expr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_number_change: Option<CopyNumberChange>,
    pub warnings: Vec<String>,
    pub service_meta: ServiceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedToCnVarResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_number_count: Option<CopyNumberCount>,
    pub warnings: Vec<String>,
    pub service_meta: ServiceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedToCxVarResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_number_change: Option<CopyNumberChange>,
    pub warnings: Vec<String>,
    pub service_meta: ServiceMeta,
}

/// Inputs echoed back by the amplification endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmplificationQuery {
    pub gene: String,
    #[serde(default)]
    pub sequence_id: Option<String>,
    #[serde(default)]
    pub start: Option<u64>,
    #[serde(default)]
    pub end: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmplificationToCxVarResponse {
    pub query: AmplificationQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplification_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_number_change: Option<CopyNumberChange>,
    pub warnings: Vec<String>,
    pub service_meta: ServiceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToCdnaResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_data: Option<CdnaRepresentation>,
    pub warnings: Vec<String>,
    pub service_meta: ServiceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToGenomicResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g_data: Option<GenomicRepresentation>,
    pub warnings: Vec<String>,
    pub service_meta: ServiceMeta,
}
