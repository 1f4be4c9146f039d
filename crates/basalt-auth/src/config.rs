//! Authentication configuration.

use crate::password;

/// Configuration for credential management.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Bearer access token lifetime in seconds (default: 86_400 = 24 hours).
    pub token_lifetime_secs: u64,
    /// Password reset code lifetime in seconds (default: 86_400 = 24 hours).
    pub reset_code_lifetime_secs: u64,
    /// Minimum password length for policy enforcement (default: 6).
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_lifetime_secs: 86_400,
            reset_code_lifetime_secs: 86_400,
            min_password_length: password::DEFAULT_MIN_LENGTH,
        }
    }
}
