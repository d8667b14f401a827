//! HMAC-based extract-and-expand key derivation.
//!
//! Two wire-incompatible variants exist. They share the extract step and the
//! salt default, and differ only in the number the expansion step gives its
//! first HMAC iteration:
//!
//! - [`HkdfVariant::V2`] starts counting at `0` (legacy message version 2)
//! - [`HkdfVariant::V3`] starts counting at `1`, which is plain RFC 5869
//!
//! Identical inputs therefore yield different output under each variant. The
//! variant is fixed when a [`KeyDerivation`] is constructed; choosing one is a
//! configuration decision made outside this module.

use crate::error::{Error, Result};

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Output size of the underlying hash (SHA-256)
pub const HASH_OUTPUT_SIZE: usize = 32;

/// Largest output the expansion step can produce (`255 × HASH_OUTPUT_SIZE`)
pub const MAX_OUTPUT_LENGTH: usize = 255 * HASH_OUTPUT_SIZE;

/// Selects the iteration start offset of the expansion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HkdfVariant {
    /// Expansion counter starts at 0
    V2,
    /// Expansion counter starts at 1 (RFC 5869)
    #[default]
    V3,
}

impl HkdfVariant {
    /// First counter byte fed to the expansion HMAC.
    #[must_use]
    pub const fn iteration_start_offset(self) -> usize {
        match self {
            HkdfVariant::V2 => 0,
            HkdfVariant::V3 => 1,
        }
    }
}

/// Key material produced by a single derivation.
///
/// Owned by the caller and zeroized on drop. The derivation module keeps no
/// copy.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeyMaterial(Vec<u8>);

impl DerivedKeyMaterial {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Carves the material into consecutive sub-keys of the given lengths.
    ///
    /// The lengths are the caller's contract and must account for every byte.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if the lengths do not sum to [`Self::len`].
    pub fn split(&self, lengths: &[usize]) -> Result<Vec<&[u8]>> {
        let total = lengths
            .iter()
            .try_fold(0usize, |acc, len| acc.checked_add(*len))
            .ok_or(Error::InvalidInput("sub-key lengths overflow"))?;
        if total != self.0.len() {
            return Err(Error::InvalidInput(
                "sub-key lengths do not match derived length",
            ));
        }

        let mut rest = self.0.as_slice();
        let mut parts = Vec::with_capacity(lengths.len());
        for len in lengths {
            let (head, tail) = rest.split_at(*len);
            parts.push(head);
            rest = tail;
        }
        Ok(parts)
    }
}

impl std::fmt::Debug for DerivedKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DerivedKeyMaterial([REDACTED; {}])", self.0.len())
    }
}

/// HKDF-SHA256 bound to one iteration-offset variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyDerivation {
    variant: HkdfVariant,
}

impl KeyDerivation {
    #[must_use]
    pub const fn new(variant: HkdfVariant) -> Self {
        Self { variant }
    }

    /// Counter starts at 0.
    #[must_use]
    pub const fn v2() -> Self {
        Self::new(HkdfVariant::V2)
    }

    /// Counter starts at 1 (RFC 5869).
    #[must_use]
    pub const fn v3() -> Self {
        Self::new(HkdfVariant::V3)
    }

    #[must_use]
    pub const fn variant(&self) -> HkdfVariant {
        self.variant
    }

    /// Derives `output_length` bytes from `secret`.
    ///
    /// Computes `PRK = HMAC(salt, secret)` and then expands it as
    /// `T(i) = HMAC(PRK, T(i-1) || info || i)` for
    /// `i = offset .. offset + ceil(L / 32)`, truncating the concatenation to
    /// `L` bytes. An absent salt is treated as 32 zero bytes under both
    /// variants.
    ///
    /// # Errors
    /// - `Error::InvalidInput` if `secret` is empty
    /// - `Error::InvalidOutputLength` if `output_length` exceeds
    ///   [`MAX_OUTPUT_LENGTH`]
    pub fn derive(
        &self,
        secret: &[u8],
        salt: Option<&[u8]>,
        info: &[u8],
        output_length: usize,
    ) -> Result<DerivedKeyMaterial> {
        if secret.is_empty() {
            return Err(Error::InvalidInput("secret is empty"));
        }
        if output_length > MAX_OUTPUT_LENGTH {
            return Err(Error::InvalidOutputLength {
                requested: output_length,
                max: MAX_OUTPUT_LENGTH,
            });
        }

        let zero_salt = [0u8; HASH_OUTPUT_SIZE];
        let (mut prk, _) = Hkdf::<Sha256>::extract(Some(salt.unwrap_or(&zero_salt[..])), secret);

        let okm = self.expand(&prk, info, output_length);
        prk.as_mut_slice().zeroize();

        trace!(
            variant = ?self.variant,
            output_length,
            salted = salt.is_some(),
            "derived key material"
        );
        Ok(DerivedKeyMaterial(okm?))
    }

    /// Derives with the default all-zero salt.
    ///
    /// # Errors
    /// Same as [`KeyDerivation::derive`].
    pub fn derive_secrets(
        &self,
        secret: &[u8],
        info: &[u8],
        output_length: usize,
    ) -> Result<DerivedKeyMaterial> {
        self.derive(secret, None, info, output_length)
    }

    fn expand(&self, prk: &[u8], info: &[u8], output_length: usize) -> Result<Vec<u8>> {
        let iterations = output_length.div_ceil(HASH_OUTPUT_SIZE);
        let offset = self.variant.iteration_start_offset();

        let mut okm = Vec::with_capacity(output_length);
        let mut mixin: Vec<u8> = Vec::with_capacity(HASH_OUTPUT_SIZE);

        for i in offset..offset + iterations {
            // Both variants stay within a single counter byte: at most
            // 255 iterations starting at 0 or 1.
            let counter = u8::try_from(i)
                .map_err(|_| Error::InvalidOutputLength {
                    requested: output_length,
                    max: MAX_OUTPUT_LENGTH,
                })?;

            let mut mac = HmacSha256::new_from_slice(prk)
                .map_err(|_| Error::InvalidInput("pseudorandom key"))?;
            mac.update(&mixin);
            mac.update(info);
            mac.update(&[counter]);
            let mut step = mac.finalize().into_bytes();

            let take = (output_length - okm.len()).min(step.len());
            okm.extend_from_slice(&step[..take]);

            mixin.clear();
            mixin.extend_from_slice(&step);
            step.as_mut_slice().zeroize();
        }

        mixin.zeroize();
        Ok(okm)
    }
}
