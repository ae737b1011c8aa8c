use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Admin password held by the server
///
/// The value never leaves the process: it is not logged (`Debug` is
/// redacted) and never rendered into a page.
#[derive(Debug, Clone)]
pub struct SharedSecret(Arc<SecretString>);

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::from(secret.into())))
    }

    /// Compare a candidate password verbatim
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.0.expose_secret().as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        // Constant time over the common length
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_exactly() {
        let secret = SharedSecret::new("s3cret");
        assert!(secret.matches("s3cret"));
        assert!(!secret.matches("s3cret "));
        assert!(!secret.matches("S3CRET"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = SharedSecret::new("s3cret");
        assert!(!format!("{secret:?}").contains("s3cret"));
    }
}
