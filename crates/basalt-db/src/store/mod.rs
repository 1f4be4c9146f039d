//! SurrealDB implementations of the `basalt-core` store traits.

mod collection;
mod credential;

pub use collection::SurrealSchemaStore;
pub use credential::SurrealCredentialStore;
