use crate::config::TimeoutConfig;
use crate::model::Poem;
use crate::remote::decode::{decode_poem, decode_poem_list};
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB

/// Errors from a single API request.
///
/// These never escape the acquisition engine; strategies log them and
/// treat the request as having returned nothing.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded its endpoint timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Body did not decode as a poem under any accepted shape
    #[error("Response did not contain a poem")]
    Decode,
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

impl FetchError {
    /// Returns true if repeating the request may succeed.
    ///
    /// `Decode` counts as transient because the random endpoint serves a
    /// different poem on every call.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout(_)
            | FetchError::Network(_)
            | FetchError::IncompleteResponse { .. }
            | FetchError::Decode => true,
            FetchError::HttpStatus(status) => *status >= 500 || *status == 429,
            FetchError::ResponseTooLarge
            | FetchError::InvalidUrl(_)
            | FetchError::InsecureBaseUrl => false,
        }
    }
}

/// Limit redirects to 3 hops and refuse loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(to = %url, hop = attempt.previous().len() + 1, "Following redirect");
        attempt.follow()
    })
}

/// Thin client for the poetry API.
///
/// Every request is a `GET` with `Accept: application/json` and carries the
/// timeout configured for its endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    timeouts: TimeoutConfig,
}

impl ApiClient {
    /// Build a client with its own connection pool.
    pub fn new(base_url: &str, timeouts: TimeoutConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;
        Self::with_client(http, base_url, timeouts)
    }

    /// Build a client around an existing `reqwest::Client`.
    ///
    /// The base URL must be HTTPS; plain HTTP is accepted only for localhost
    /// so tests can point at a local mock server.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        timeouts: TimeoutConfig,
    ) -> Result<Self, FetchError> {
        let base = base_url.trim_end_matches('/');
        Url::parse(base)?;

        if !base.starts_with("https://") {
            let is_localhost =
                base.starts_with("http://127.0.0.1") || base.starts_with("http://localhost");
            if !is_localhost {
                tracing::error!(base_url = %base, "Rejecting non-HTTPS API base URL");
                return Err(FetchError::InsecureBaseUrl);
            }
            tracing::warn!(base_url = %base, "Using non-HTTPS API base URL (localhost only)");
        }

        Ok(Self {
            http,
            base: base.to_string(),
            timeouts,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// `GET /api/ganjoor/poem/{id}`
    pub async fn poem_by_id(&self, id: i64) -> Result<Poem, FetchError> {
        let url = self.endpoint(&format!("/api/ganjoor/poem/{id}"))?;
        let bytes = self.get(url, self.timeouts.by_id()).await?;
        decode_poem(&bytes).ok_or(FetchError::Decode)
    }

    /// `GET /api/ganjoor/poet/{id}/poems`
    pub async fn poems_by_poet(&self, poet_id: i64) -> Result<Vec<Poem>, FetchError> {
        let url = self.endpoint(&format!("/api/ganjoor/poet/{poet_id}/poems"))?;
        let bytes = self.get(url, self.timeouts.by_poet()).await?;
        Ok(decode_poem_list(&bytes))
    }

    /// `GET /api/ganjoor/poems/search?term=...`
    pub async fn search(&self, term: &str) -> Result<Vec<Poem>, FetchError> {
        let mut url = self.endpoint("/api/ganjoor/poems/search")?;
        url.query_pairs_mut().append_pair("term", term);
        let bytes = self.get(url, self.timeouts.search()).await?;
        Ok(decode_poem_list(&bytes))
    }

    /// `GET /api/ganjoor/poem/random`
    pub async fn random_poem(&self) -> Result<Poem, FetchError> {
        let url = self.endpoint("/api/ganjoor/poem/random")?;
        let bytes = self.get(url, self.timeouts.random()).await?;
        decode_poem(&bytes).ok_or(FetchError::Decode)
    }

    /// Fetch a random poem, retrying transient failures.
    ///
    /// Makes at most `retries + 1` attempts with a short exponential backoff
    /// (250ms, 500ms, ...).
    pub async fn random_poem_with_retry(&self, retries: u32) -> Result<Poem, FetchError> {
        let mut attempt = 0;

        loop {
            match self.random_poem().await {
                Ok(poem) => return Ok(poem),
                Err(e) if e.is_retryable() && attempt < retries => {
                    let delay = Duration::from_millis(250u64 << attempt.min(6));
                    tracing::debug!(
                        error = %e,
                        retry = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying random poem fetch"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        Ok(Url::parse(&format!("{}{}", self.base, path))?)
    }

    /// One deadline covers the whole exchange, headers and body alike.
    async fn get(&self, url: Url, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        tokio::time::timeout(timeout, self.get_body(url))
            .await
            .map_err(|_| FetchError::Timeout(timeout))?
    }

    async fn get_body(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            tracing::debug!(url = %url, status = %response.status(), "API request failed");
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_RESPONSE_SIZE).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
