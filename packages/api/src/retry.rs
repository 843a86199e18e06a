//! HTTP retry helper for transient errors.
//!
//! Every API request goes through [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so connection failures,
//! timeouts, HTTP 429, and HTTP 5xx get automatic retry with exponential
//! backoff. 4xx statuses (other than 429) are permanent and never retried.
//!
//! Retry lives strictly at this layer. The pagination engine above it
//! never retries: a request that fails here after all attempts surfaces as
//! a mid-session transport failure with partial results.

use std::time::Duration;

use review_harvest_fetch::TransportError;

/// Maximum retry attempts for transient errors. With exponential backoff
/// (2s, 4s, 8s) the total wait before giving up is 14 seconds.
const MAX_RETRIES: u32 = 3;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`], since builders are consumed by
/// `.send()`.
///
/// # Errors
///
/// Returns [`TransportError`] if the request fails after all retries, the
/// server answers with a non-retryable status, or the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, TransportError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_secs(1u64 << attempt); // 2s, 4s, 8s
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        let response = match build_request().send().await {
            Ok(response) => response,
            Err(e) => {
                if is_transient(&e) && attempt < MAX_RETRIES {
                    log::warn!("  transient error: {e}");
                    continue;
                }
                return Err(TransportError::Http(e));
            }
        };

        let status = response.status();
        let endpoint = response.url().path().to_owned();

        // 429 and 5xx are worth retrying; other 4xx are permanent.
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            if attempt < MAX_RETRIES {
                log::warn!("  HTTP {status} from {endpoint}");
                continue;
            }
            return Err(TransportError::Status {
                status: status.as_u16(),
                endpoint,
            });
        }
        if status.is_client_error() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                endpoint,
            });
        }

        return response.json().await.map_err(TransportError::Http);
    }

    unreachable!("retry loop exited without returning")
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}
