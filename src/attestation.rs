//! Remote attestation envelope for contact discovery.
//!
//! After a client has verified that a contact-discovery service runs inside a
//! genuine enclave, both sides hold a pair of session keys and the service has
//! issued a request id. [`RemoteAttestation`] carries that pair as one unit:
//! the keys mean nothing without the id they were issued for, and vice versa.
//!
//! The envelope performs no cryptography. The handshake that produces it and
//! the request encoder that consumes it live outside this crate.
//! [`AttestationKeys::derive`] gives the handshake a way to compute the session
//! keys from its Diffie-Hellman inputs.

use crate::error::{Error, Result};
use crate::kdf::KeyDerivation;
use crate::keys::{
    DhOutput, KEY_SIZE_32, MAX_SYMMETRIC_KEY_SIZE, PublicKey, SecretKey, SymmetricKey,
};

use tracing::debug;
use zeroize::Zeroize;

/// Session keys established by one attestation handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationKeys {
    client_key: SymmetricKey,
    server_key: SymmetricKey,
}

impl AttestationKeys {
    #[must_use]
    pub fn new(client_key: SymmetricKey, server_key: SymmetricKey) -> Self {
        Self {
            client_key,
            server_key,
        }
    }

    /// Derives the session keys from the client's ephemeral secret and the
    /// server's ephemeral and static public keys.
    ///
    /// ```text
    /// master = DH(client_eph, server_eph) || DH(client_eph, server_static)
    /// salt   = pub(client_eph) || server_eph || server_static
    /// okm    = HKDF-v3(master, salt, "", 2 * key_length)
    /// ```
    ///
    /// The first `key_length` bytes become the client key, the rest the
    /// server key.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if `key_length` is zero or larger than
    /// [`MAX_SYMMETRIC_KEY_SIZE`].
    pub fn derive(
        client_ephemeral: &SecretKey,
        server_ephemeral: &PublicKey,
        server_static: &PublicKey,
        key_length: usize,
    ) -> Result<Self> {
        Self::from_agreements(
            &client_ephemeral.diffie_hellman(server_ephemeral),
            &client_ephemeral.diffie_hellman(server_static),
            [&client_ephemeral.public_key(), server_ephemeral, server_static],
            key_length,
        )
    }

    /// Enclave-side counterpart of [`AttestationKeys::derive`], yielding the
    /// same pair from the server's secrets and the client's ephemeral key.
    ///
    /// # Errors
    /// Same as [`AttestationKeys::derive`].
    pub fn derive_as_server(
        server_ephemeral: &SecretKey,
        server_static: &SecretKey,
        client_ephemeral: &PublicKey,
        key_length: usize,
    ) -> Result<Self> {
        Self::from_agreements(
            &server_ephemeral.diffie_hellman(client_ephemeral),
            &server_static.diffie_hellman(client_ephemeral),
            [
                client_ephemeral,
                &server_ephemeral.public_key(),
                &server_static.public_key(),
            ],
            key_length,
        )
    }

    fn from_agreements(
        ephemeral_to_ephemeral: &DhOutput,
        ephemeral_to_static: &DhOutput,
        public_keys: [&PublicKey; 3],
        key_length: usize,
    ) -> Result<Self> {
        if key_length == 0 || key_length > MAX_SYMMETRIC_KEY_SIZE {
            return Err(Error::InvalidInput("attestation key length out of range"));
        }

        let mut master = [0u8; 2 * KEY_SIZE_32];
        master[..KEY_SIZE_32].copy_from_slice(ephemeral_to_ephemeral.as_bytes());
        master[KEY_SIZE_32..].copy_from_slice(ephemeral_to_static.as_bytes());

        let mut salt = [0u8; 3 * KEY_SIZE_32];
        for (chunk, key) in salt.chunks_exact_mut(KEY_SIZE_32).zip(public_keys) {
            chunk.copy_from_slice(key.as_bytes());
        }

        let okm = KeyDerivation::v3().derive(&master, Some(&salt[..]), &[], 2 * key_length);
        master.zeroize();
        let okm = okm?;

        let parts = okm.split(&[key_length, key_length])?;
        Ok(Self {
            client_key: SymmetricKey::from_slice(parts[0])?,
            server_key: SymmetricKey::from_slice(parts[1])?,
        })
    }

    /// Key protecting client-to-server traffic
    #[must_use]
    pub fn client_key(&self) -> &SymmetricKey {
        &self.client_key
    }

    /// Key protecting server-to-client traffic
    #[must_use]
    pub fn server_key(&self) -> &SymmetricKey {
        &self.server_key
    }
}

/// A request id bound to the session keys of a completed attestation.
///
/// There is no `Default`: an envelope always has a non-empty
/// request id. Key material is not validated here; handing in keys from a
/// failed or partial handshake is a caller error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAttestation {
    request_id: Vec<u8>,
    keys: AttestationKeys,
}

impl RemoteAttestation {
    /// Binds `request_id` to `keys`. Both are moved in as-is.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if `request_id` is empty.
    pub fn new(request_id: Vec<u8>, keys: AttestationKeys) -> Result<Self> {
        if request_id.is_empty() {
            return Err(Error::InvalidInput("attestation request id is empty"));
        }

        debug!(
            request_id_len = request_id.len(),
            "remote attestation envelope created"
        );
        Ok(Self { request_id, keys })
    }

    #[must_use]
    pub fn request_id(&self) -> &[u8] {
        &self.request_id
    }

    #[must_use]
    pub fn keys(&self) -> &AttestationKeys {
        &self.keys
    }

    /// Gives the request id and keys back to the caller.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, AttestationKeys) {
        (self.request_id, self.keys)
    }
}
