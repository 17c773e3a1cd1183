//! snapruner core — the typed run configuration and its validating loader.
//!
//! Public API surface:
//! - [`types`] — [`RunConfig`] and its per-section structs
//! - [`config`] — YAML loader with one-shot type coercion and CLI overrides
//! - [`error`] — [`ConfigError`]
//!
//! Everything downstream of the loader works with fully typed values; no
//! other crate touches YAML or performs coercion.

pub mod config;
pub mod error;
pub mod types;

pub use config::CliOverrides;
pub use error::ConfigError;
pub use types::{AppriseConfig, LoggingConfig, RunConfig, ScrubConfig, SnapraidConfig};
