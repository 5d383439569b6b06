//! Foundation types for docdelta.
//!
//! This crate provides the shared vocabulary used by every other docdelta
//! crate: content digests, run identifiers, the tri-state comparison
//! outcome, the failure taxonomy, and the runtime configuration.
//!
//! # Key Types
//!
//! - [`ContentDigest`]: BLAKE3 digest of file content
//! - [`RunId`]: UUID v7 identifier for one comparison run
//! - [`DiffOutcome`]: Changed / Unchanged / Failed result of a strategy
//! - [`FailureKind`] / [`DiffFailure`]: Structured failure taxonomy
//! - [`DiffConfig`]: TOML-loadable configuration

pub mod config;
pub mod digest;
pub mod error;
pub mod outcome;
pub mod run;

pub use config::DiffConfig;
pub use digest::ContentDigest;
pub use error::ConfigError;
pub use outcome::{DiffFailure, DiffOutcome, FailureKind};
pub use run::RunId;
