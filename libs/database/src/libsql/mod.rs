//! libSQL connector and utilities
//!
//! Opens either a remote Turso database (`libsql://`, `https://`, `wss://`)
//! or a local SQLite file, and exposes a `SELECT 1` readiness probe.

mod config;
mod connector;
mod health;

pub use config::LibsqlConfig;
pub use connector::{connect, connect_with_retry};
pub use health::check_health;

// Re-export libsql types for convenience
pub use ::libsql::{Connection, Database, Row, Rows, Value};
