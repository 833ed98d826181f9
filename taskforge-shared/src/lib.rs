//! # Taskforge Shared Library
//!
//! Shared types and business logic used by the Taskforge API server.
//!
//! ## Module Organization
//!
//! - `models`: database models and their operations
//! - `query`: the filter / sort / include / pagination engine and access
//!   scope enforcement
//! - `auth`: JWT validation and the caller identity context
//! - `db`: connection pool management

pub mod auth;
pub mod db;
pub mod models;
pub mod query;

/// Current version of the Taskforge shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
