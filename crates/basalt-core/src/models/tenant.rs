//! Tenant domain model.
//!
//! A tenant is an isolated namespace for one customer's data,
//! credentials, and collection schemas. The tenant id is derived from
//! the request host name and doubles as the storage namespace name.

use crate::error::{BasaltError, BasaltResult};

/// The distinguished root tenant.
///
/// Hosts addressed without a tenant subdomain resolve to it. It holds
/// the platform-owner (superdog) credentials and is rejected by
/// tenant-scoped guarded accessors.
pub const ROOT_TENANT: &str = "api";

/// Substring reserved for the platform itself, forbidden in tenant ids.
const RESERVED: &str = "basalt";

const MIN_ID_LENGTH: usize = 4;

/// Returns true if `id` is a well-formed tenant id: lowercase
/// alphanumeric, at least four characters, not containing the
/// platform's reserved substring.
pub fn is_valid_id(id: &str) -> bool {
    id.len() >= MIN_ID_LENGTH
        && id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && !id.contains(RESERVED)
}

/// Validates a tenant id, reporting violations as validation errors.
pub fn check_id(id: &str) -> BasaltResult<()> {
    if id.is_empty() {
        return Err(BasaltError::validation("tenant id must not be empty"));
    }
    if !is_valid_id(id) {
        return Err(BasaltError::validation(format!(
            "tenant id [{id}] must be at least {MIN_ID_LENGTH} characters long, \
             only composed of a-z and 0-9 characters, \
             and must not contain [{RESERVED}]"
        )));
    }
    Ok(())
}

/// Derives the tenant id from the request host name.
///
/// A three-label host (`<tenant>.<domain>.<tld>`) addresses the first
/// label; any other host form addresses the root tenant. Pure and
/// total: an unparseable host simply falls back to the root tenant,
/// which tenant-scoped privilege checks reject later.
pub fn resolve_tenant(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() == 3 {
        labels[0].to_string()
    } else {
        ROOT_TENANT.to_string()
    }
}
