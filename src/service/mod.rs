//! Web service for variation normalization
//!
//! An axum transport over [`QueryHandler`](crate::query::QueryHandler). Each
//! route maps to one query operation. Domain failures are answered with
//! `200 OK` and a `warnings` list; only malformed requests are rejected.

pub mod config;
pub mod handlers;
pub mod server;
pub mod types;
pub mod validation;

pub use config::{ServerConfig, ServiceConfig};
pub use server::{build_router, create_app, AppState};
pub use types::*;
