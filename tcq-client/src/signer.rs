//! HMAC request signing.
//!
//! Every request carries `Authorization: TC {access_id}:{signature}` and a
//! `Timestamp` header. The backend rebuilds the canonical message from the
//! request it received, so its byte layout must not drift:
//!
//! ```text
//! {path}?{query}:{METHOD}:{timestamp}    when a query string is present
//! {path}:{METHOD}:{timestamp}            otherwise
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Header values produced for one outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub timestamp: String,
}

/// Signs requests with an API user's access id and secret key.
#[derive(Clone)]
pub struct HmacSigner {
    access_id: String,
    secret_key: SecretString,
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner")
            .field("access_id", &self.access_id)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl HmacSigner {
    /// An empty secret is accepted here and yields a signature nobody will
    /// honor. Reject it where credentials enter the program.
    pub fn new(access_id: impl Into<String>, secret_key: SecretString) -> Self {
        Self {
            access_id: access_id.into(),
            secret_key,
        }
    }

    pub fn access_id(&self) -> &str {
        &self.access_id
    }

    /// Sign a request. `query` must already be percent-encoded and carry no
    /// leading `?`; an empty string counts as absent. `timestamp` defaults to
    /// the current Unix time in seconds.
    pub fn sign(
        &self,
        api_path: &str,
        method: &Method,
        query: Option<&str>,
        timestamp: Option<&str>,
    ) -> SignedHeaders {
        let timestamp = timestamp
            .map(str::to_string)
            .unwrap_or_else(|| chrono::Utc::now().timestamp().to_string());
        let message = canonical_message(api_path, method, query, &timestamp);

        let mut mac = HmacSha256::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(message.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        SignedHeaders {
            authorization: format!("TC {}:{}", self.access_id, signature),
            timestamp,
        }
    }
}

/// The exact string the backend recomputes to verify a signature.
pub fn canonical_message(
    api_path: &str,
    method: &Method,
    query: Option<&str>,
    timestamp: &str,
) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(query) => format!("{}?{}:{}:{}", api_path, query, method.as_str(), timestamp),
        None => format!("{}:{}:{}", api_path, method.as_str(), timestamp),
    }
}

// =============================================================================
// TESTS
// =============================================================================
