//! Type definitions for hab configuration

mod runtime_config;

pub use runtime_config::*;
