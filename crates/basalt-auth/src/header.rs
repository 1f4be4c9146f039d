//! `Authorization` header parsing.
//!
//! Supported schemes are `Basic` (base64 `login:secret`) and `Bearer`
//! (opaque token). Malformed values fail with an authentication error
//! before any store lookup; secrets never appear in error messages.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use basalt_core::error::{BasaltError, BasaltResult};

/// A parsed `Authorization` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    Basic { name: String, secret: String },
    Bearer { token: String },
}

/// Parses an `Authorization: <scheme> <credentials>` header value.
pub fn parse(header: &str) -> BasaltResult<AuthScheme> {
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BasaltError::authentication("no authorization scheme specified"))?;
    let value = parts
        .next()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BasaltError::authentication("invalid authorization header"))?;

    if scheme.eq_ignore_ascii_case("Basic") {
        parse_basic(value)
    } else if scheme.eq_ignore_ascii_case("Bearer") {
        Ok(AuthScheme::Bearer {
            token: value.to_string(),
        })
    } else {
        Err(BasaltError::authentication(format!(
            "authorization scheme [{scheme}] not supported"
        )))
    }
}

fn parse_basic(value: &str) -> BasaltResult<AuthScheme> {
    let decoded = STANDARD
        .decode(value)
        .map_err(|_| BasaltError::authentication("authorization token is not base 64 encoded"))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| BasaltError::authentication("authorization token is not valid utf-8"))?;

    let (name, secret) = decoded
        .split_once(':')
        .ok_or_else(|| BasaltError::authentication("invalid authorization token"))?;

    if name.is_empty() {
        return Err(BasaltError::authentication("no username specified"));
    }
    if secret.is_empty() {
        return Err(BasaltError::authentication("no password specified"));
    }

    Ok(AuthScheme::Basic {
        name: name.to_string(),
        secret: secret.to_string(),
    })
}

/// Encodes a `Basic` header value for a login/secret pair. Test and
/// client helper.
pub fn basic(name: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{name}:{secret}")))
}

/// Encodes a `Bearer` header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
