//! # BoardVault Service
//!
//! REST surface over a single custody vault.

pub mod api;
pub mod config;

pub use api::{create_router, AppState, CALLER_HEADER};
pub use config::ServiceConfig;
