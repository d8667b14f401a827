//! Explicitly constructed protocol context.
//!
//! Everything the transport layer needs from the core is reachable from one
//! [`ProtocolContext`] value that the application builds and passes down.
//! There is no global provider or listener registry.

use crate::attestation::{AttestationKeys, RemoteAttestation};
use crate::config::ProtocolConfig;
use crate::connectivity::ConnectivityNotifier;
use crate::credentials::{CredentialsProvider, authorization_header};
use crate::error::Result;
use crate::kdf::KeyDerivation;
use crate::keys::{PublicKey, SecretKey};

use std::sync::Arc;
use tracing::info;

/// Configuration, credentials and connectivity fan-out for one account
/// session.
#[derive(Clone)]
pub struct ProtocolContext {
    config: ProtocolConfig,
    credentials: Arc<dyn CredentialsProvider>,
    connectivity: Arc<ConnectivityNotifier>,
}

impl ProtocolContext {
    /// Builds a context with a fresh, empty connectivity notifier.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if `config` fails validation.
    pub fn new(config: ProtocolConfig, credentials: Arc<dyn CredentialsProvider>) -> Result<Self> {
        config.validate()?;
        info!(kdf_variant = ?config.kdf_variant, "protocol context created");

        Ok(Self {
            config,
            credentials,
            connectivity: Arc::new(ConnectivityNotifier::new()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Key derivation bound to the configured variant.
    #[must_use]
    pub fn key_derivation(&self) -> KeyDerivation {
        KeyDerivation::new(self.config.kdf_variant)
    }

    #[must_use]
    pub fn credentials(&self) -> &dyn CredentialsProvider {
        self.credentials.as_ref()
    }

    /// Basic authorization header for the session's account.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        authorization_header(self.credentials.as_ref())
    }

    /// Notifier the transport reports channel lifecycle to.
    #[must_use]
    pub fn connectivity(&self) -> &Arc<ConnectivityNotifier> {
        &self.connectivity
    }

    /// Derives attestation session keys with the configured key length and
    /// binds them to `request_id`.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if `request_id` is empty.
    pub fn remote_attestation(
        &self,
        request_id: Vec<u8>,
        client_ephemeral: &SecretKey,
        server_ephemeral: &PublicKey,
        server_static: &PublicKey,
    ) -> Result<RemoteAttestation> {
        let keys = AttestationKeys::derive(
            client_ephemeral,
            server_ephemeral,
            server_static,
            self.config.attestation_key_length,
        )?;
        RemoteAttestation::new(request_id, keys)
    }
}

impl std::fmt::Debug for ProtocolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolContext")
            .field("config", &self.config)
            .field("connectivity", &self.connectivity)
            .finish()
    }
}
