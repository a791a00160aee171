//! Cache directory management.
//!
//! The cache directory is shared scratch space owned by the caller. This crate only
//! keeps its update lock there; see [`lock`].

pub mod lock;

pub use lock::UpdateLock;
