//! Property-based tests for the protocol core
//!
//! Uses proptest to verify invariants across random inputs

use hkdf::Hkdf;
use proptest::prelude::*;
use sha2::Sha256;
use textsecure_core::kdf::{KeyDerivation, MAX_OUTPUT_LENGTH};
use textsecure_core::wire_prefix::{self, PrefixKind};
use textsecure_core::Error;

fn kind() -> impl Strategy<Value = PrefixKind> {
    prop::sample::select(PrefixKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_variants_always_differ(
        secret in prop::collection::vec(any::<u8>(), 1..64),
        salt in prop::option::of(prop::collection::vec(any::<u8>(), 0..64)),
        info in prop::collection::vec(any::<u8>(), 0..32),
        len in 16usize..200
    ) {
        let v2 = KeyDerivation::v2().derive(&secret, salt.as_deref(), &info, len).unwrap();
        let v3 = KeyDerivation::v3().derive(&secret, salt.as_deref(), &info, len).unwrap();

        prop_assert_eq!(v2.len(), len);
        prop_assert_eq!(v3.len(), len);
        prop_assert_ne!(v2.as_bytes(), v3.as_bytes());
    }

    #[test]
    fn test_v3_agrees_with_rfc5869(
        secret in prop::collection::vec(any::<u8>(), 1..64),
        salt in prop::collection::vec(any::<u8>(), 0..64),
        info in prop::collection::vec(any::<u8>(), 0..32),
        len in 0usize..300
    ) {
        let ours = KeyDerivation::v3().derive(&secret, Some(salt.as_slice()), &info, len).unwrap();

        let reference = Hkdf::<Sha256>::new(Some(salt.as_slice()), &secret);
        let mut expected = vec![0u8; len];
        reference.expand(&info, &mut expected).unwrap();

        prop_assert_eq!(ours.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_derivation_is_deterministic(
        secret in prop::collection::vec(any::<u8>(), 1..64),
        len in 0usize..100
    ) {
        for kdf in [KeyDerivation::v2(), KeyDerivation::v3()] {
            let first = kdf.derive_secrets(&secret, b"ctx", len).unwrap();
            let second = kdf.derive_secrets(&secret, b"ctx", len).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn test_oversized_output_rejected(extra in 1usize..10_000) {
        let requested = MAX_OUTPUT_LENGTH + extra;
        let result = KeyDerivation::v3().derive(b"secret", None, b"", requested);

        prop_assert_eq!(
            result,
            Err(Error::InvalidOutputLength { requested, max: MAX_OUTPUT_LENGTH })
        );
    }

    #[test]
    fn test_prefix_kinds_never_collide(message in ".*") {
        let standard = wire_prefix::calculate_prefix(PrefixKind::Message, &message);
        let bundle = wire_prefix::calculate_prefix(PrefixKind::PreKeyBundle, &message);
        let exchange = wire_prefix::calculate_prefix(PrefixKind::KeyExchange, &message);

        prop_assert_ne!(&standard, &bundle);
        prop_assert_ne!(&standard, &exchange);
        prop_assert_ne!(&bundle, &exchange);
    }

    #[test]
    fn test_prefixed_messages_classify(kind in kind(), message in ".+") {
        let wire = wire_prefix::prefixed(kind, &message);

        prop_assert_eq!(wire_prefix::strip(&wire), Some((kind, message.as_str())));
    }
}
