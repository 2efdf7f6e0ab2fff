//! Shared utilities, configuration, and error handling for Tokochat
//!
//! This crate provides common functionality used across the chat subsystem:
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP mapping
//! - Custom axum extractors (validated JSON, history paging)
//! - Repository error types

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;

pub use config::Config;
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::{HistoryQuery, ValidatedJson};
