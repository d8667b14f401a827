//! Secure-channel protocol core for an end-to-end encrypted messenger.
//!
//! This crate holds the pieces of the messaging protocol that sit beneath the
//! application and above the transport: deriving keys, carrying attestation
//! session keys for contact discovery, tagging messages on the wire, and
//! telling interested parties about the state of the channel.
//!
//! # Components
//!
//! - [`kdf`]: HKDF-SHA256 with a construction-time choice of iteration
//!   offset (`V2` counts from 0, `V3` from 1 as in RFC 5869)
//! - [`attestation`]: a request id bound to the session keys of a completed
//!   remote attestation
//! - [`wire_prefix`]: four-character prefixes that let a receiver dispatch on
//!   message subtype before decoding
//! - [`credentials`]: the account identity the transport authenticates with
//! - [`connectivity`]: lifecycle events fanned out to registered listeners
//! - [`context`]: the explicitly passed object that ties the above together
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use textsecure_core::{
//!     KeyDerivation, ProtocolConfig, ProtocolContext, StaticCredentialsProvider,
//!     wire_prefix::{self, PrefixKind},
//! };
//!
//! let credentials = Arc::new(StaticCredentialsProvider::new("+14155550100", "secret", None));
//! let context = ProtocolContext::new(ProtocolConfig::default(), credentials).unwrap();
//!
//! // Derive 32 bytes with the configured variant
//! let key = context
//!     .key_derivation()
//!     .derive(b"shared-secret", None, b"ctx", 32)
//!     .unwrap();
//! assert_eq!(key.len(), 32);
//! assert_ne!(key, KeyDerivation::v2().derive(b"shared-secret", None, b"ctx", 32).unwrap());
//!
//! // Tag an outgoing prekey-bundle message and recognise it on receipt
//! let wire = wire_prefix::prefixed(PrefixKind::PreKeyBundle, "Mw8KIQ...");
//! assert_eq!(wire_prefix::classify(&wire), Some(PrefixKind::PreKeyBundle));
//! ```
//!
//! # Concurrency
//!
//! Everything except [`ConnectivityNotifier`] is an immutable value or a pure
//! function. The notifier guards its listener set internally and never
//! reenters a listener. Nothing here blocks on I/O.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unreachable_pub)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![warn(clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    missing_docs,
    clippy::missing_errors_doc,
    clippy::missing_fields_in_debug,
    clippy::module_name_repetitions
)]

pub mod attestation;
pub mod config;
pub mod connectivity;
pub mod context;
pub mod credentials;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod wire_prefix;

// Re-export main types
pub use attestation::{AttestationKeys, RemoteAttestation};
pub use config::ProtocolConfig;
pub use connectivity::{ConnectivityEvent, ConnectivityListener, ConnectivityNotifier, ListenerId};
pub use context::ProtocolContext;
pub use credentials::{CredentialsProvider, StaticCredentialsProvider};
pub use error::{Error, Result};
pub use kdf::{DerivedKeyMaterial, HkdfVariant, KeyDerivation};
pub use keys::{PublicKey, SecretKey, SymmetricKey};
pub use wire_prefix::PrefixKind;
