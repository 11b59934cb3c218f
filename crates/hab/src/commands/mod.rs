//! Command implementations

pub mod upgrade;
pub mod version;
