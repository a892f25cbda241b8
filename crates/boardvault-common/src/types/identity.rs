//! Identity - opaque caller identity
//!
//! Callers arrive already authenticated by the surrounding collaborator
//! (session credential, signed transaction). The vault only compares
//! identities for equality, so any stable string works. Board members are
//! typically `did:key` identifiers derived from an Ed25519 public key.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// Maximum accepted identity length in bytes
pub const MAX_IDENTITY_LEN: usize = 256;

/// Opaque, unique caller identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Create an identity from a string, rejecting empty or oversized values
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }
        if trimmed.len() > MAX_IDENTITY_LEN {
            return Err(IdentityError::TooLong(trimmed.len()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(IdentityError::Whitespace);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generate a fresh `did:key` identity together with its signing key
    ///
    /// # Example
    /// ```
    /// use boardvault_common::Identity;
    ///
    /// let (member, _signing_key) = Identity::generate();
    /// assert!(member.as_str().starts_with("did:key:z"));
    /// ```
    pub fn generate() -> (Self, SigningKey) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let id = Self::from_public_key(&signing_key.verifying_key().to_bytes());
        (id, signing_key)
    }

    /// Derive a `did:key` identity from an Ed25519 public key
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        // Ed25519 multicodec prefix: 0xed 0x01
        let mut prefixed = vec![0xed, 0x01];
        prefixed.extend_from_slice(public_key);

        let encoded = bs58::encode(&prefixed).into_string();
        Self(format!("did:key:z{}", encoded))
    }

    /// Borrow the identity string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.0
    }
}

/// Errors related to identity parsing
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Identity must not be empty")]
    Empty,

    #[error("Identity too long: {0} bytes")]
    TooLong(usize),

    #[error("Identity must not contain whitespace")]
    Whitespace,
}
