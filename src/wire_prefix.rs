//! Wire prefixes for message-subtype dispatch.
//!
//! Every outgoing message is preceded by a short prefix computed from its
//! body, so a receiver can tell a plain message from one carrying a prekey
//! bundle (or a key exchange) before parsing anything.
//!
//! # Format
//!
//! ```text
//! digest = SHA1^1000(TAG || message)
//! bytes  = digest[0..3], with the top two bits of bytes[0] replaced by the kind
//! prefix = base64(bytes)                          // always 4 characters
//! ```
//!
//! The kind bits decide the first base64 character, so each kind owns a
//! disjoint band of lead characters:
//!
//! | kind           | bits | lead characters |
//! |----------------|------|-----------------|
//! | `Message`      | `00` | `A`..=`P`       |
//! | `PreKeyBundle` | `01` | `Q`..=`f`       |
//! | `KeyExchange`  | `10` | `g`..=`v`       |
//!
//! Two kinds can never produce the same prefix for any message.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};
use tracing::trace;

/// Length of the encoded prefix in characters
pub const PREFIX_SIZE: usize = 4;

const PREFIX_BYTES: usize = 3;
const HASH_ITERATIONS: usize = 1000;
const KIND_SHIFT: u32 = 6;
const KIND_MASK: u8 = 0b1100_0000;

/// Message subtype announced by a wire prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixKind {
    /// Ordinary ciphertext message
    Message,
    /// Message carrying a prekey bundle for asynchronous session setup
    PreKeyBundle,
    /// Interactive key exchange message
    KeyExchange,
}

impl PrefixKind {
    pub const ALL: [PrefixKind; 3] = [
        PrefixKind::Message,
        PrefixKind::PreKeyBundle,
        PrefixKind::KeyExchange,
    ];

    fn tag(self) -> &'static [u8] {
        match self {
            PrefixKind::Message => b"?TextSecureMessage",
            PrefixKind::PreKeyBundle => b"?TextSecurePreKeyBundle",
            PrefixKind::KeyExchange => b"?TextSecureKeyExchange",
        }
    }

    fn bits(self) -> u8 {
        match self {
            PrefixKind::Message => 0b00,
            PrefixKind::PreKeyBundle => 0b01,
            PrefixKind::KeyExchange => 0b10,
        }
    }

    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(PrefixKind::Message),
            0b01 => Some(PrefixKind::PreKeyBundle),
            0b10 => Some(PrefixKind::KeyExchange),
            _ => None,
        }
    }
}

/// Computes the prefix for `message` as the given kind.
#[must_use]
pub fn calculate_prefix(kind: PrefixKind, message: &str) -> String {
    match kind {
        PrefixKind::Message => calculate_message_prefix(message),
        PrefixKind::PreKeyBundle => calculate_prekey_bundle_prefix(message),
        PrefixKind::KeyExchange => calculate_key_exchange_prefix(message),
    }
}

#[must_use]
pub fn calculate_message_prefix(message: &str) -> String {
    encode_prefix(PrefixKind::Message, message)
}

#[must_use]
pub fn calculate_prekey_bundle_prefix(message: &str) -> String {
    encode_prefix(PrefixKind::PreKeyBundle, message)
}

#[must_use]
pub fn calculate_key_exchange_prefix(message: &str) -> String {
    encode_prefix(PrefixKind::KeyExchange, message)
}

/// Returns `prefix || message`, ready for transmission.
///
/// An empty `message` still gets a prefix, but the resulting wire string is
/// only [`PREFIX_SIZE`] characters long and never classifies on receipt.
#[must_use]
pub fn prefixed(kind: PrefixKind, message: &str) -> String {
    let mut wire = calculate_prefix(kind, message);
    wire.push_str(message);
    wire
}

/// Splits a received wire string into its kind and body.
///
/// Returns `None` when the input is not longer than [`PREFIX_SIZE`] or when
/// the prefix does not match the body under the kind its lead character
/// announces.
#[must_use]
pub fn strip(wire: &str) -> Option<(PrefixKind, &str)> {
    if wire.len() <= PREFIX_SIZE {
        return None;
    }
    let prefix = wire.get(..PREFIX_SIZE)?;
    let body = wire.get(PREFIX_SIZE..)?;

    let lead = STANDARD.decode(prefix).ok()?;
    let kind = PrefixKind::from_bits(lead.first()? >> KIND_SHIFT)?;

    if encode_prefix(kind, body) == prefix {
        Some((kind, body))
    } else {
        trace!(?kind, "wire prefix does not match message body");
        None
    }
}

/// Kind announced by a correctly prefixed wire string.
#[must_use]
pub fn classify(wire: &str) -> Option<PrefixKind> {
    strip(wire).map(|(kind, _)| kind)
}

#[must_use]
pub fn is_message(wire: &str) -> bool {
    classify(wire) == Some(PrefixKind::Message)
}

#[must_use]
pub fn is_prekey_bundle(wire: &str) -> bool {
    classify(wire) == Some(PrefixKind::PreKeyBundle)
}

#[must_use]
pub fn is_key_exchange(wire: &str) -> bool {
    classify(wire) == Some(PrefixKind::KeyExchange)
}

fn encode_prefix(kind: PrefixKind, message: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(kind.tag());
    hasher.update(message.as_bytes());
    let mut running = hasher.finalize();

    for _ in 1..HASH_ITERATIONS {
        running = Sha1::digest(running);
    }

    let mut bytes = [0u8; PREFIX_BYTES];
    bytes.copy_from_slice(&running[..PREFIX_BYTES]);
    bytes[0] = (bytes[0] & !KIND_MASK) | (kind.bits() << KIND_SHIFT);

    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_four_characters() {
        for kind in PrefixKind::ALL {
            assert_eq!(calculate_prefix(kind, "hello").len(), PREFIX_SIZE);
            assert_eq!(calculate_prefix(kind, "").len(), PREFIX_SIZE);
        }
    }

    #[test]
    fn test_prefix_is_deterministic() {
        assert_eq!(
            calculate_prekey_bundle_prefix("payload"),
            calculate_prekey_bundle_prefix("payload")
        );
    }

    #[test]
    fn test_dispatch_matches_base_routines() {
        let msg = "Zm9vYmFy";
        assert_eq!(
            calculate_prefix(PrefixKind::Message, msg),
            calculate_message_prefix(msg)
        );
        assert_eq!(
            calculate_prefix(PrefixKind::PreKeyBundle, msg),
            calculate_prekey_bundle_prefix(msg)
        );
        assert_eq!(
            calculate_prefix(PrefixKind::KeyExchange, msg),
            calculate_key_exchange_prefix(msg)
        );
    }

    #[test]
    fn test_lead_character_bands() {
        for msg in ["", "a", "hello world", "ciphertext-body-0123456789"] {
            let m = calculate_message_prefix(msg).chars().next().unwrap();
            let p = calculate_prekey_bundle_prefix(msg).chars().next().unwrap();
            let k = calculate_key_exchange_prefix(msg).chars().next().unwrap();

            assert!(('A'..='P').contains(&m), "message lead {m}");
            assert!(('Q'..='Z').contains(&p) || ('a'..='f').contains(&p), "bundle lead {p}");
            assert!(('g'..='v').contains(&k), "key exchange lead {k}");
        }
    }

    #[test]
    fn test_classify_roundtrip() {
        for kind in PrefixKind::ALL {
            let wire = prefixed(kind, "body");
            assert_eq!(classify(&wire), Some(kind));
            assert_eq!(strip(&wire), Some((kind, "body")));
        }
    }

    #[test]
    fn test_classify_rejects_short_and_tampered() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("ABCD"), None);

        let wire = prefixed(PrefixKind::Message, "body");
        let tampered = format!("{}bodY", &wire[..PREFIX_SIZE]);
        assert_eq!(classify(&tampered), None);
    }

    #[test]
    fn test_empty_body_never_classifies() {
        for kind in PrefixKind::ALL {
            let wire = prefixed(kind, "");
            assert_eq!(wire.len(), PREFIX_SIZE);
            assert_eq!(classify(&wire), None);
            assert_eq!(strip(&wire), None);
        }
    }

    #[test]
    fn test_predicates() {
        let wire = prefixed(PrefixKind::PreKeyBundle, "bundle");
        assert!(is_prekey_bundle(&wire));
        assert!(!is_message(&wire));
        assert!(!is_key_exchange(&wire));
    }

    #[test]
    fn test_multibyte_boundary_is_not_a_panic() {
        assert_eq!(classify("ééé"), None);
    }
}
