// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-vrs: variation normalization to GA4GH VRS
//!
//! Part of the ferro bioinformatics toolkit.
//!
//! Free text (`BRAF V600E`), HGVS (`NC_000007.13:g.140453136A>T`) and gnomAD
//! VCF (`7-140453136-A-T`) queries are tokenized, classified, validated
//! against reference data and translated into VRS variations with
//! computed identifiers.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ferro_vrs::{MockProvider, QueryContext, QueryHandler};
//!
//! let mut provider = MockProvider::new();
//! provider.add_sequence("NC_000007.13", "TTGCAGCAGCATTACGGACT");
//!
//! let handler = QueryHandler::new(QueryContext::from_provider(Arc::new(provider))).unwrap();
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .enable_all()
//!     .build()
//!     .unwrap();
//! let response = runtime.block_on(handler.to_vrs("NC_000007.13:g.1T>A"));
//! assert_eq!(response.variations.len(), 1);
//! ```

pub mod alignment;
pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod liftover;
pub mod query;
pub mod reference;
#[cfg(feature = "web-service")]
pub mod service;
pub mod token;
pub mod tokenize;
pub mod translate;
pub mod validate;
pub mod vrs;

// Re-export commonly used types
pub use classify::{Classification, ClassificationType, Classifier};
pub use config::NormalizerConfig;
pub use context::QueryContext;
pub use error::{ErrorCode, FerroError};
pub use query::QueryHandler;
pub use reference::MockProvider;
pub use tokenize::Tokenizer;
pub use translate::DupDelMode;
pub use vrs::{Allele, CopyChange, CopyNumberChange, CopyNumberCount, Variation};

/// Result type alias for ferro-vrs operations
pub type Result<T> = std::result::Result<T, FerroError>;
