//! Common test infrastructure for hab-update tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Tool identity, versions, binary content, digests
//! - `builders`: Fluent builder for GitHub release JSON payloads
//! - `mock_server`: Wiremock setup helpers for the release API and assets
//! - `updater_helpers`: Fake executables, manifests, observers and renamers

// Each test binary uses a different subset of the helpers
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod constants;
pub mod mock_server;
pub mod updater_helpers;

pub use builders::*;
pub use constants::*;
pub use mock_server::*;
pub use updater_helpers::*;
