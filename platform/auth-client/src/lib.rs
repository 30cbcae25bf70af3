//! # Verification Client
//!
//! Remote-call wrapper used by the passport registry and the attachments
//! service to turn an inbound bearer credential into a validated identity.
//!
//! The identity service is the sole holder of the signing secret; every
//! other service delegates trust through this client. [`AuthClient::verify`]
//! collapses every failure (missing credential, network failure, timeout,
//! non-2xx response, malformed body) to `None`, so callers have exactly one
//! branch: authenticated or not. A degraded verifier can therefore never be
//! mistaken for a valid identity.
//!
//! No caching, no retry: each request pays one bounded round trip. The two
//! consumers of this client are per-request handlers, not hot paths.

use serde::Deserialize;
use std::time::Duration;

/// Default bound on the verification round trip.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors constructing the client. Verification itself never errors; it
/// returns `None`.
#[derive(Debug, thiserror::Error)]
pub enum AuthClientError {
    #[error("failed to build HTTP client: {0}")]
    Http(String),
}

/// The decoded, signature-checked claims behind a bearer credential.
///
/// Transient: lives for one request's authorization decision and is never
/// persisted or cached.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedIdentity {
    /// Identity subject (user id)
    pub subject: String,
    pub email: String,
    pub role: String,
}

impl VerifiedIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Client for the identity service's verification endpoint.
#[derive(Clone)]
pub struct AuthClient {
    base_url: String,
    http: reqwest::Client,
}

impl AuthClient {
    /// Create a client for the identity service at `base_url`.
    ///
    /// The timeout bounds the whole verification round trip so an
    /// unavailable verifier degrades callers to "unauthenticated" within
    /// bounded time instead of hanging.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthClientError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Verify a bearer credential against the identity service.
    ///
    /// `authorization` is the raw `Authorization` header value, forwarded
    /// unmodified. Returns the validated identity, or `None` for every
    /// failure mode; callers must not (and cannot) distinguish them.
    pub async fn verify(&self, authorization: Option<&str>) -> Option<VerifiedIdentity> {
        let authorization = authorization?;

        let url = format!("{}/api/auth/verify", self.base_url);
        let response = match self
            .http
            .get(&url)
            .header("Authorization", authorization)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "verification call failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "verification rejected");
            return None;
        }

        match response.json::<VerifiedIdentity>().await {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::debug!(error = %e, "malformed verification response");
                None
            }
        }
    }
}
