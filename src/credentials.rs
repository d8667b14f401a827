//! Account credentials consumed by the transport layer.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Identity and authentication state for one account session.
///
/// Implemented by whatever owns the account (a preferences store, a test
/// fixture). The protocol core only reads from it. Implementations must
/// answer from cached or local state and never block.
pub trait CredentialsProvider: Send + Sync {
    /// Account identifier, usually the registered phone number
    fn user(&self) -> &str;

    /// Server password or authentication token
    fn password(&self) -> &str;

    /// Key used to authenticate pushed envelopes, if the account has one
    fn signaling_key(&self) -> Option<&str>;
}

/// Fixed credentials supplied once at session start.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StaticCredentialsProvider {
    user: String,
    password: String,
    signaling_key: Option<String>,
}

impl StaticCredentialsProvider {
    #[must_use]
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        signaling_key: Option<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            signaling_key,
        }
    }
}

impl CredentialsProvider for StaticCredentialsProvider {
    fn user(&self) -> &str {
        &self.user
    }

    fn password(&self) -> &str {
        &self.password
    }

    fn signaling_key(&self) -> Option<&str> {
        self.signaling_key.as_deref()
    }
}

impl std::fmt::Debug for StaticCredentialsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentialsProvider")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field(
                "signaling_key",
                &self.signaling_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// HTTP basic authorization header for the provider's account.
///
/// `"Basic " + base64(user ":" password)`
#[must_use]
pub fn authorization_header(credentials: &dyn CredentialsProvider) -> String {
    let raw = format!("{}:{}", credentials.user(), credentials.password());
    format!("Basic {}", STANDARD.encode(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_provider_accessors() {
        let creds = StaticCredentialsProvider::new("+14155550100", "hunter2", Some("c2lnbmFs".into()));

        assert_eq!(creds.user(), "+14155550100");
        assert_eq!(creds.password(), "hunter2");
        assert_eq!(creds.signaling_key(), Some("c2lnbmFs"));
    }

    #[test]
    fn test_authorization_header() {
        let creds = StaticCredentialsProvider::new("user", "pass", None);
        assert_eq!(authorization_header(&creds), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = StaticCredentialsProvider::new("alice", "hunter2", Some("sig".into()));
        let rendered = format!("{creds:?}");

        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("sig\""));
    }
}
