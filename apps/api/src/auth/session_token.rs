// Session token generation
// Opaque bearer tokens drawn from the OS CSPRNG

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes per token (256 bits)
pub const TOKEN_BYTES: usize = 32;

/// Generates a new opaque session token
///
/// 32 random bytes, base64url-encoded without padding (43 characters).
///
/// # Example
/// ```
/// use marketplace_api::auth::session_token::generate_session_token;
///
/// let token = generate_session_token();
/// assert_eq!(token.len(), 43);
/// ```
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn parse_bearer(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
