//! Secure secret management
//!
//! Holds the completion-service API key so it is redacted in logs and
//! `config` output and zeroized from memory when dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const REDACTED: &str = "[REDACTED]";

/// A string that never prints its contents and is wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    pub fn new(value: String) -> Self {
        Self { inner: value }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Self {
        Self::new(value.to_string())
    }

    /// Read a secret from an environment variable, ignoring blank values.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Self::new)
    }

    /// Get a reference to the inner string
    ///
    /// # Security Warning
    /// Avoid logging or displaying the returned value.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    /// First five characters followed by `...`, for diagnostics.
    pub fn masked_prefix(&self) -> String {
        let prefix: String = self.inner.chars().take(5).collect();
        format!("{}...", prefix)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

// Never serialize the actual secret
impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::new)
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        SecretString::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        SecretString::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let secret = SecretString::from_str("sk-live-abcdef");
        assert_eq!(format!("{:?}", secret), REDACTED);
        assert_eq!(format!("{}", secret), REDACTED);
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"[REDACTED]\"");
        assert_eq!(secret.expose_secret(), "sk-live-abcdef");
    }

    #[test]
    fn test_masked_prefix() {
        let secret = SecretString::from_str("sk-live-abcdef");
        assert_eq!(secret.masked_prefix(), "sk-li...");
        assert_eq!(SecretString::from_str("ab").masked_prefix(), "ab...");
    }

    #[test]
    fn test_deserialize_keeps_value() {
        let secret: SecretString = serde_json::from_str("\"sk-live-123\"").unwrap();
        assert_eq!(secret.expose_secret(), "sk-live-123");
        assert_eq!(secret.len(), 11);
    }

    #[test]
    fn test_from_env_missing() {
        assert!(SecretString::from_env("TURING_ARENA_TEST_NONEXISTENT_KEY_98765").is_none());
    }
}
