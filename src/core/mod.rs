//! Core types for config-updater
//!
//! Holds the crate's error model:
//! - [`UpdateError`] - typed failures returned by version checks and installs
//! - [`RegistryFailure`] - whether a registry failure was transport or payload
//! - [`ErrorContext`] - CLI presentation with details and suggestions
//! - [`user_friendly_error`] - converts any `anyhow::Error` into an [`ErrorContext`]

pub mod error;

pub use error::{ErrorContext, RegistryFailure, UpdateError, user_friendly_error};
