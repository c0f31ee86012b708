//! Human verification and anonymous identity.
//!
//! Verification is a stub: any proof is accepted. What matters is the
//! gating policy. By default a fresh page load starts unverified, so every
//! visit must re-verify before joining a game.

use crate::config::SecretString;
use sha2::{Digest, Sha256};

/// Per-visitor verification state.
#[derive(Debug, Clone, Default)]
pub struct VerificationSession {
    persist: bool,
    verified: bool,
}

impl VerificationSession {
    /// `persist` keeps a verification across page loads.
    pub fn new(persist: bool) -> Self {
        Self {
            persist,
            verified: false,
        }
    }

    /// Called when the lobby is (re)entered.
    pub fn begin_page_load(&mut self) {
        if !self.persist {
            self.verified = false;
        }
    }

    /// Record a successful verification.
    pub fn mark_verified(&mut self) {
        tracing::debug!("Visitor verified");
        self.verified = true;
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }
}

/// Anonymous identity: a random secret and its public commitment.
#[derive(Debug, Clone)]
pub struct ZkIdentity {
    secret: SecretString,
    commitment: String,
}

impl ZkIdentity {
    pub fn generate() -> Self {
        Self::from_secret(SecretString::new(uuid::Uuid::new_v4().simple().to_string()))
    }

    pub fn from_secret(secret: SecretString) -> Self {
        let commitment = commitment(secret.expose_secret());
        Self { secret, commitment }
    }

    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    /// Nullifier for this identity. One vote per nullifier.
    pub fn nullifier(&self) -> String {
        nullifier(self.secret.expose_secret())
    }
}

/// `0x`-prefixed SHA-256 of the secret.
pub fn commitment(secret: &str) -> String {
    format!("0x{}", hex::encode(Sha256::digest(secret.as_bytes())))
}

/// `0x`-prefixed SHA-256 of `nullifier:<secret>`.
pub fn nullifier(secret: &str) -> String {
    let digest = Sha256::digest(format!("nullifier:{}", secret).as_bytes());
    format!("0x{}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_page_load_clears_verification() {
        let mut session = VerificationSession::new(false);
        assert!(!session.is_verified());
        session.mark_verified();
        assert!(session.is_verified());
        session.begin_page_load();
        assert!(!session.is_verified());
    }

    #[test]
    fn test_persisted_verification_survives_reload() {
        let mut session = VerificationSession::new(true);
        session.mark_verified();
        session.begin_page_load();
        assert!(session.is_verified());
    }

    #[test]
    fn test_commitment_and_nullifier_differ() {
        let c = commitment("secret");
        let n = nullifier("secret");
        assert_eq!(c.len(), 66);
        assert!(c.starts_with("0x"));
        assert_ne!(c, n);
        assert_eq!(c, commitment("secret"));
    }

    #[test]
    fn test_commitment_known_digest() {
        assert_eq!(
            commitment("abc"),
            "0xba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_identity_is_deterministic_per_secret() {
        let a = ZkIdentity::from_secret(SecretString::from_str("s1"));
        let b = ZkIdentity::from_secret(SecretString::from_str("s1"));
        assert_eq!(a.commitment(), b.commitment());
        assert_eq!(a.nullifier(), b.nullifier());
        assert_ne!(ZkIdentity::generate().commitment(), a.commitment());
    }
}
