//! Basalt core — domain models, permission model, schema compiler,
//! and the store traits that abstract the storage collaborator.

pub mod acl;
pub mod error;
pub mod models;
pub mod schema;
pub mod store;

pub use error::{BasaltError, BasaltResult};
