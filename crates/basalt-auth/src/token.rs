//! Opaque bearer access token generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Generates a cryptographically random opaque access token
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_access_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}
