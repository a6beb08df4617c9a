//! Database library providing libSQL (Turso) connectors and shared utilities.
//!
//! # Features
//!
//! - `config` (default) - Configuration support with `core_config::FromEnv`
//!
//! # Example
//!
//! ```ignore
//! use database::libsql::{self, LibsqlConfig};
//! use core_config::FromEnv;
//!
//! let config = LibsqlConfig::from_env()?;
//! let db = libsql::connect_with_retry(&config, None).await?;
//! libsql::check_health(&db).await?;
//! ```

pub mod common;
pub mod libsql;

pub use common::{DatabaseError, DatabaseResult, RetryConfig, retry, retry_with_backoff};
