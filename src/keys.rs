//! Key types with memory safety guarantees.

use crate::error::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand_core::CryptoRngCore;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of an X25519 key or agreement output in bytes
pub const KEY_SIZE_32: usize = 32;

/// Largest symmetric key this crate hands out
pub const MAX_SYMMETRIC_KEY_SIZE: usize = 64;

/// Symmetric key of caller-chosen length with automatic zeroization on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey(Vec<u8>);

impl SymmetricKey {
    /// Creates a symmetric key from raw bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if `bytes` is empty or longer than
    /// [`MAX_SYMMETRIC_KEY_SIZE`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidInput("symmetric key is empty"));
        }
        if bytes.len() > MAX_SYMMETRIC_KEY_SIZE {
            return Err(Error::InvalidInput("symmetric key is too long"));
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Returns the key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey([REDACTED])")
    }
}

/// X25519 public key (32 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; KEY_SIZE_32]);

impl PublicKey {
    /// Size in bytes
    pub const SIZE: usize = KEY_SIZE_32;

    /// Create from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_SIZE_32]) -> Self {
        Self(bytes)
    }

    /// Create from a slice that must be exactly 32 bytes long.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` on any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE_32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidInput("public key must be 32 bytes"))?;
        Ok(Self(bytes))
    }

    /// Decode from standard base64, the encoding attestation services use in
    /// their JSON responses.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` on malformed base64 or a wrong length.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = STANDARD.decode(encoded)?;
        Self::from_slice(&decoded)
    }

    /// Get raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE_32] {
        &self.0
    }

    pub(crate) fn to_x25519(self) -> X25519PublicKey {
        X25519PublicKey::from(self.0)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey([REDACTED])")
    }
}

impl From<&StaticSecret> for PublicKey {
    fn from(secret: &StaticSecret) -> Self {
        Self(*X25519PublicKey::from(secret).as_bytes())
    }
}

/// X25519 secret key with automatic zeroization
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(StaticSecret);

impl SecretKey {
    /// Generate a new random secret key
    pub fn generate<R: CryptoRngCore>(rng: &mut R) -> Self {
        Self(StaticSecret::random_from_rng(rng))
    }

    /// Create from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_SIZE_32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Get the corresponding public key
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(&self.0)
    }

    /// Perform Diffie-Hellman key agreement
    #[must_use]
    pub fn diffie_hellman(&self, public: &PublicKey) -> DhOutput {
        let shared = self.0.diffie_hellman(&public.to_x25519());
        DhOutput(*shared.as_bytes())
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

/// Output of Diffie-Hellman operation (32 bytes)
/// Automatically zeroized on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DhOutput([u8; KEY_SIZE_32]);

impl DhOutput {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE_32] {
        &self.0
    }
}

impl std::fmt::Debug for DhOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DhOutput([REDACTED])")
    }
}
