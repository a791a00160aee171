//! Integration test suite for config-updater
//!
//! End-to-end tests of version checks, installs, and the CLI against a mock registry.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **check**: version discovery through the registry
//! - **install**: the install pipeline, with stub and real extraction
//! - **concurrency**: racing installs against one cache directory
//! - **cli**: the `config-updater` binary

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod concurrency;
