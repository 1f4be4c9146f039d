//! SurrealDB persistence for the basalt platform core.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Store implementations for the `basalt-core` traits
//!   ([`SurrealCredentialStore`], [`SurrealSchemaStore`])

mod connection;
mod error;
mod schema;
mod store;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
pub use store::{SurrealCredentialStore, SurrealSchemaStore};
