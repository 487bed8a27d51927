//! Retry policy and error classification for release downloads.

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of attempts for one download.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// HTTP failures that will not succeed on retry.
#[derive(Debug, Error)]
pub enum NonRetryableError {
    /// HTTP 404: the release was not uploaded at the expected location.
    #[error("release asset not found: {0}")]
    NotFound(String),
    /// HTTP 401/403.
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// HTTP 429.
    #[error("rate limited: {0}. Try again later.")]
    RateLimited(String),
    /// Other 4xx responses.
    #[error("request error: {0}")]
    ClientError(String),
}

/// Classifies an error as retryable or non-retryable.
/// Returns `Ok(())` when retrying may help.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "<unknown url>".to_string());

    if let Some(status) = error.status() {
        match status {
            StatusCode::NOT_FOUND => return Err(NonRetryableError::NotFound(url)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(NonRetryableError::AccessDenied(format!(
                    "HTTP {} for {}",
                    status.as_u16(),
                    url
                )));
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(NonRetryableError::RateLimited(url)),
            s if s.is_client_error() => {
                return Err(NonRetryableError::ClientError(format!(
                    "HTTP {} for {}",
                    s.as_u16(),
                    url
                )));
            }
            // 5xx server errors are retryable
            _ => {}
        }
    }

    // Connection errors, timeouts, etc. are retryable
    Ok(())
}

/// Wraps an error from `error_for_status()`, converting non-retryable
/// statuses into [`NonRetryableError`].
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn status_error(status: usize) -> reqwest::Error {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/asset.tar.gz")
            .with_status(status)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/asset.tar.gz", server.url()))
            .send()
            .await
            .unwrap();
        response.error_for_status().unwrap_err()
    }

    #[test]
    fn test_non_retryable_error_display() {
        let err = NonRetryableError::NotFound("https://example.com/a.tar.gz".to_string());
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("a.tar.gz"));

        let err = NonRetryableError::RateLimited("x".to_string());
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_classify_error_not_found() {
        let err = status_error(404).await;
        let result = classify_error(&err);
        assert!(matches!(result, Err(NonRetryableError::NotFound(ref url)) if url.ends_with("/asset.tar.gz")));
    }

    #[tokio::test]
    async fn test_classify_error_access_denied() {
        let err = status_error(403).await;
        assert!(matches!(
            classify_error(&err),
            Err(NonRetryableError::AccessDenied(_))
        ));

        let err = status_error(401).await;
        assert!(matches!(
            classify_error(&err),
            Err(NonRetryableError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_error_too_many_requests() {
        let err = status_error(429).await;
        assert!(matches!(
            classify_error(&err),
            Err(NonRetryableError::RateLimited(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_error_other_client_error() {
        let err = status_error(400).await;
        assert!(matches!(
            classify_error(&err),
            Err(NonRetryableError::ClientError(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_error_server_error_is_retryable() {
        let err = status_error(500).await;
        assert!(classify_error(&err).is_ok());
    }

    #[tokio::test]
    async fn test_check_retryable() {
        let err = check_retryable(status_error(404).await);
        assert!(err.downcast_ref::<NonRetryableError>().is_some());

        let err = check_retryable(status_error(503).await);
        assert!(err.downcast_ref::<NonRetryableError>().is_none());
    }
}
