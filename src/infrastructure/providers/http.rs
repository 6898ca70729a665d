//! Shared HTTP plumbing for generation providers: pooled client, client-side
//! throttling and status classification.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client as ReqwestClient, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::errors::ConfigurationError;
use crate::domain::models::RateLimitConfig;
use crate::domain::ports::GenerationError;

/// HTTP client plus a token-bucket limiter for one provider.
#[derive(Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(
        provider: &str,
        timeout: Duration,
        rate_limit: &RateLimitConfig,
    ) -> Result<Self, ConfigurationError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ConfigurationError::ProviderInit {
                provider: provider.to_string(),
                reason: e.to_string(),
            })?;

        let per_minute = NonZeroU32::new(rate_limit.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(rate_limit.burst_size).unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_minute(per_minute).allow_burst(burst));

        Ok(Self {
            client,
            limiter: Arc::new(limiter),
        })
    }

    pub const fn client(&self) -> &ReqwestClient {
        &self.client
    }

    /// Wait for a rate-limit slot, send, and decode a JSON success body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, GenerationError> {
        self.limiter.until_ready().await;

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            let error = classify_status(status, body, retry_after);
            warn!(status = status.as_u16(), error = %error, "provider returned an error");
            return Err(error);
        }

        let body = response.text().await.map_err(map_transport_error)?;
        debug!(status = status.as_u16(), bytes = body.len(), "provider response received");
        serde_json::from_str(&body).map_err(|e| GenerationError::InvalidResponse(e.to_string()))
    }
}

/// Map a non-success status onto the error taxonomy. 429, or any body that
/// names a rate limit, is the distinguished rate-limit condition.
pub fn classify_status(status: StatusCode, body: String, retry_after: Option<u64>) -> GenerationError {
    let lowered = body.to_lowercase();
    if status == StatusCode::TOO_MANY_REQUESTS
        || lowered.contains("rate_limit")
        || lowered.contains("rate limit")
    {
        return GenerationError::RateLimited {
            message: format!("{}: {}", status.as_u16(), body.trim()),
            retry_after_secs: retry_after,
        };
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GenerationError::Authentication(body.trim().to_string())
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GenerationError::Timeout,
        _ => GenerationError::Api {
            status: status.as_u16(),
            body: body.trim().to_string(),
        },
    }
}

pub fn map_transport_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout
    } else if err.is_decode() {
        GenerationError::InvalidResponse(err.to_string())
    } else {
        GenerationError::Network(err.to_string())
    }
}
