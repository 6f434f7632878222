use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};

/// Shortest confirmation code ever issued, whatever the configuration says.
pub const MIN_CODE_LENGTH: usize = 10;

/// Generate a confirmation code from the thread-local CSPRNG.
pub fn generate_code(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length.max(MIN_CODE_LENGTH))
        .map(char::from)
        .collect()
}

/// Hex SHA-256 digest stored in place of the code itself.
pub fn digest(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Returns true if `code` hashes to `stored_digest`.
pub fn matches(code: &str, stored_digest: &str) -> bool {
    digest(code) == stored_digest
}
