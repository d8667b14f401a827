//! Protocol core configuration.

use crate::error::{Error, Result};
use crate::kdf::HkdfVariant;
use crate::keys::MAX_SYMMETRIC_KEY_SIZE;

use serde::{Deserialize, Serialize};

/// Default length of each attestation session key in bytes.
pub const DEFAULT_ATTESTATION_KEY_LENGTH: usize = 32;

/// Settings chosen by the embedding application.
///
/// Which HKDF variant a deployment speaks is decided here; the protocol core
/// never negotiates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Iteration-offset variant used for key derivation.
    pub kdf_variant: HkdfVariant,

    /// Length of each attestation session key (client and server).
    pub attestation_key_length: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            kdf_variant: HkdfVariant::default(),
            attestation_key_length: DEFAULT_ATTESTATION_KEY_LENGTH,
        }
    }
}

impl ProtocolConfig {
    /// Parses and validates a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` on malformed TOML, unknown keys or
    /// out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `Error::InvalidConfig` if `attestation_key_length` is outside
    /// `1..=64`.
    pub fn validate(&self) -> Result<()> {
        if self.attestation_key_length == 0
            || self.attestation_key_length > MAX_SYMMETRIC_KEY_SIZE
        {
            return Err(Error::InvalidConfig(format!(
                "attestation_key_length must be between 1 and {MAX_SYMMETRIC_KEY_SIZE}, got {}",
                self.attestation_key_length
            )));
        }
        Ok(())
    }
}
