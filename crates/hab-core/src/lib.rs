//! # hab-core
//!
//! Core library for the hab CLI providing:
//! - Runtime configuration types (network, GitHub, platform, display)
//! - Hierarchical configuration loading (embedded defaults, user file, environment)

pub mod config;
pub mod error;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::RuntimeConfig;
