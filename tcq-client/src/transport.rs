//! Signed HTTP transport.

use crate::error::{ApiError, ApiResult};
use crate::signer::HmacSigner;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "v3";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Ordered query parameters. Order is preserved in the signed query string.
pub type QueryParams = Vec<(&'static str, String)>;

/// Where and as whom to talk to the API.
#[derive(Clone)]
pub struct ApiCredentials {
    pub access_id: String,
    pub secret_key: SecretString,
    /// Instance name, the `{instance}` in `https://{instance}.threatconnect.com`.
    pub instance: String,
    pub api_version: String,
    pub request_timeout_ms: u64,
}

impl ApiCredentials {
    pub fn new(
        access_id: impl Into<String>,
        secret_key: SecretString,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            access_id: access_id.into(),
            secret_key,
            instance: instance.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn base_url(&self) -> String {
        format!(
            "https://{}.threatconnect.com/api/{}",
            self.instance, self.api_version
        )
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("access_id", &self.access_id)
            .field("secret_key", &"[REDACTED]")
            .field("instance", &self.instance)
            .field("api_version", &self.api_version)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

/// Something that can issue an authenticated GET and hand back parsed JSON.
///
/// `endpoint` is relative to the API root, e.g. `/indicators/42`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, endpoint: &str, params: &[(&'static str, String)]) -> ApiResult<Value>;
}

// ============================================================================
// REST CLIENT
// ============================================================================

#[derive(Clone, Debug)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    api_prefix: String,
    signer: HmacSigner,
}

impl RestClient {
    pub fn new(credentials: &ApiCredentials) -> ApiResult<Self> {
        if credentials.instance.trim().is_empty() {
            return Err(ApiError::Config("instance name is empty".to_string()));
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(credentials.request_timeout_ms))
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            client,
            base_url: credentials.base_url(),
            api_prefix: format!("/api/{}", credentials.api_version),
            signer: HmacSigner::new(
                credentials.access_id.clone(),
                credentials.secret_key.clone(),
            ),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> ApiResult<Value> {
        let query = encode_query(params);
        let signed_path = format!("{}{}", self.api_prefix, endpoint);
        let signed = self.signer.sign(&signed_path, &method, Some(&query), None);

        let mut url = format!("{}{}", self.base_url, endpoint);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        tracing::debug!(method = %method, url = %url, "Sending API request");

        let authorization = HeaderValue::from_str(&signed.authorization)
            .map_err(|e| ApiError::Config(e.to_string()))?;
        let timestamp = HeaderValue::from_str(&signed.timestamp)
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let response = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, authorization)
            .header("Timestamp", timestamp)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Network error");
                ApiError::Network(e)
            })?;

        let status = response.status();
        let body = response.text().await?;
        if let Some(err) = map_status(status, &body) {
            tracing::warn!(status = status.as_u16(), "API request rejected");
            return Err(err);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Transport for RestClient {
    async fn get(&self, endpoint: &str, params: &[(&'static str, String)]) -> ApiResult<Value> {
        self.send(Method::GET, endpoint, params).await
    }
}

/// Form-encode parameters the way the backend expects to see them signed:
/// spaces become `+`, and `(`, `)` and `,` stay literal.
pub fn encode_query(params: &[(&'static str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(raw: &str) -> String {
    urlencoding::encode(raw)
        .replace("%20", "+")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2C", ",")
}

/// Map an error status to its [`ApiError`]. `None` for success codes.
pub fn map_status(status: StatusCode, body: &str) -> Option<ApiError> {
    let body = body.to_string();
    match status.as_u16() {
        401 => Some(ApiError::Unauthorized { body }),
        404 => Some(ApiError::NotFound { body }),
        429 => Some(ApiError::RateLimited { body }),
        code if code >= 400 => Some(ApiError::Status { code, body }),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
