//! Checksums used to detect repeated bank statement imports.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Calculate SHA-256 checksum of text content.
///
/// # Arguments
/// * `content` - Content to hash, usually canonical JSON
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Checksum of a value's JSON form.
///
/// Two batches with the same lines for the same bank account hash the same,
/// whatever file they were read from.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let content = serde_json::to_string(value)?;
    Ok(calculate_checksum(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = r#"{"amount": 120.5}"#;
        assert_eq!(calculate_checksum(content), calculate_checksum(content));
        assert_eq!(calculate_checksum(content).len(), 64);
    }

    #[test]
    fn test_fingerprint_depends_on_order() {
        let a = fingerprint(&[("2025-01-02", 10.0), ("2025-01-03", -4.0)]).unwrap();
        let b = fingerprint(&[("2025-01-03", -4.0), ("2025-01-02", 10.0)]).unwrap();
        assert_ne!(a, b);
        assert_eq!(
            a,
            fingerprint(&[("2025-01-02", 10.0), ("2025-01-03", -4.0)]).unwrap()
        );
    }
}
