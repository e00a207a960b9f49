// Authentication primitives
// Password hashing and opaque session tokens

pub mod password;
pub mod session_token;
