//! Authentication and authorization for the platform core.
//!
//! This crate owns everything between an `Authorization` header and an
//! authorized operation: header parsing, password hashing, bearer
//! tokens, the per-request context with its guarded accessors, and the
//! credential lifecycle service. Persistence stays behind the store
//! traits from `basalt-core`.

pub mod authenticator;
pub mod config;
pub mod context;
pub mod header;
pub mod password;
pub mod service;
pub mod token;

pub use authenticator::{Authenticator, SUPERDOG_PREFIX};
pub use config::AuthConfig;
pub use context::{RequestContext, TenantRule};
pub use service::{CredentialService, IssuedToken, SignUp};
