//! Core types and shared functionality for bizdesk.
//!
//! This crate provides:
//! - The uniform backend response envelope
//! - Unified error types
//! - In-memory response and page caches with tag-based invalidation
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod envelope;
pub mod error;

pub use cache::{Cache, PageCache, ResponseCache, TagRule, TagRules};
pub use config::{AppConfig, ConfigError};
pub use envelope::Envelope;
pub use error::Error;
