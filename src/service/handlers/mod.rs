//! HTTP request handlers for the VRS web service

pub mod health;
pub mod variation;
