//! Core types, configuration, and error handling for diffsarif.
//!
//! This crate provides the shared foundation used by all other diffsarif crates:
//! - [`DiffSarifError`] — unified error type using `thiserror` and `miette`
//! - [`Config`] — configuration loaded from `.diffsarif.toml`
//! - Shared types: [`DiffUnit`], [`IssueRecord`], [`Credential`]

mod config;
mod error;
mod types;

pub use config::{AnalysisConfig, Config, LlmConfig, ReportConfig, ServerConfig};
pub use error::DiffSarifError;
pub use types::{Credential, DiffUnit, IssueRecord};

/// A convenience `Result` type for diffsarif operations.
pub type Result<T> = std::result::Result<T, DiffSarifError>;
