// Password hashing utilities
// Uses bcrypt for secure password hashing

use bcrypt::{hash, verify, DEFAULT_COST};

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hashes a password using bcrypt
///
/// # Example
/// ```
/// use marketplace_api::auth::password::hash_password;
///
/// let hash = hash_password("my_password").expect("valid hash");
/// ```
pub fn hash_password(password: &str) -> Result<String, String> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hashes a password with an explicit bcrypt work factor (4..=31)
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, String> {
    hash(password, cost).map_err(|e| e.to_string())
}

/// Verifies a password against a bcrypt hash
///
/// # Returns
/// * `Ok(bool)` - True if password matches, false otherwise
/// * `Err(String)` - If the stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    verify(password, hash).map_err(|e| e.to_string())
}

/// Checks the password policy, returning the violation message
pub fn check_password_policy(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}
