//! X API v2 post creation.
//!
//! Length is checked locally with the shortened-link rule before any request
//! is sent.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use pipeline::{PostId, PublishError, PublishReceipt, Publisher, Timestamp, PLATFORM_LIMIT};
use reqwest::{header::HeaderMap, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct CreatePost<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct CreatePostResponse {
    data: CreatedPost,
}

#[derive(Deserialize)]
struct CreatedPost {
    id: String,
}

/// [`Publisher`] for the X API v2.
pub struct XPublisher {
    client: Client,
    base_url: String,
    bearer_token: String,
}

impl XPublisher {
    /// # Errors
    ///
    /// Returns [`PublishError::MissingCredentials`] when the token is blank or
    /// the HTTP client cannot be built.
    pub fn new(bearer_token: impl Into<String>) -> Result<Self, PublishError> {
        let bearer_token = bearer_token.into();
        if bearer_token.trim().is_empty() {
            return Err(PublishError::MissingCredentials {
                message: "bearer token is empty".to_string(),
            });
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PublishError::MissingCredentials {
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            bearer_token,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn check_length(&self, text: &str) -> Result<usize, PublishError> {
        let effective_length = self.effective_length(text);
        if effective_length > PLATFORM_LIMIT {
            return Err(PublishError::TooLong {
                effective_length,
                limit: PLATFORM_LIMIT,
            });
        }
        Ok(effective_length)
    }
}

#[async_trait]
impl Publisher for XPublisher {
    async fn publish(&self, text: &str) -> Result<PublishReceipt, PublishError> {
        let effective_length = self.check_length(text)?;

        let response = self
            .client
            .post(format!("{}/2/tweets", self.base_url))
            .bearer_auth(&self.bearer_token)
            .json(&CreatePost { text })
            .send()
            .await
            .map_err(|e| PublishError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let reset = rate_limit_reset(response.headers(), Utc::now().timestamp());
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Platform refused the post");
            return Err(map_status(status, reset, body));
        }

        let created: CreatePostResponse =
            response.json().await.map_err(|e| PublishError::Rejected {
                status: status.as_u16(),
                message: format!("unreadable response: {e}"),
            })?;
        let post_id = PostId::new(created.data.id).ok_or_else(|| PublishError::Rejected {
            status: status.as_u16(),
            message: "response carried an empty post id".to_string(),
        })?;

        info!(%post_id, effective_length, "Post created");
        Ok(PublishReceipt {
            post_id,
            published_at: Timestamp::now(),
            effective_length,
        })
    }
}

/// Time until the `x-rate-limit-reset` epoch second, relative to `now`.
fn rate_limit_reset(headers: &HeaderMap, now: i64) -> Option<Duration> {
    let reset = headers
        .get("x-rate-limit-reset")?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()?;
    u64::try_from(reset - now).ok().map(Duration::from_secs)
}

fn map_status(status: StatusCode, retry_after: Option<Duration>, body: String) -> PublishError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => PublishError::RateLimited { retry_after },
        s if s.is_server_error() => PublishError::Transport {
            message: format!("platform error ({s}): {}", body.trim()),
        },
        s => PublishError::Rejected {
            status: s.as_u16(),
            message: body.trim().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::RetryPolicy;
    use reqwest::header::HeaderValue;

    fn publisher() -> XPublisher {
        // Unroutable so an accidental network call fails fast.
        XPublisher::new("token")
            .unwrap()
            .with_base_url("http://127.0.0.1:9")
    }

    #[test]
    fn test_blank_token_is_missing_credentials() {
        let err = XPublisher::new(" ").err().unwrap();

        assert!(matches!(err, PublishError::MissingCredentials { .. }));
    }

    #[tokio::test]
    async fn test_over_limit_post_is_rejected_before_sending() {
        let text = "a".repeat(PLATFORM_LIMIT + 1);

        let err = publisher().publish(&text).await.unwrap_err();

        assert!(matches!(
            err,
            PublishError::TooLong {
                effective_length,
                limit: PLATFORM_LIMIT
            } if effective_length == PLATFORM_LIMIT + 1
        ));
    }

    #[test]
    fn test_long_url_counts_as_shortened_link() {
        let url = format!("https://www.linkedin.com/pulse/{}", "x".repeat(200));
        let text = format!("{}\n\n{url}\n\n#AI", "b".repeat(200));

        let length = publisher().check_length(&text).unwrap();

        assert_eq!(length, 200 + 2 + 23 + 2 + 3);
    }

    #[test]
    fn test_rate_limit_reset_is_relative_to_now() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-reset", HeaderValue::from_static("1700000900"));

        assert_eq!(
            rate_limit_reset(&headers, 1_700_000_000),
            Some(Duration::from_secs(900))
        );
        assert_eq!(rate_limit_reset(&headers, 1_700_001_000), None);
        assert_eq!(rate_limit_reset(&HeaderMap::new(), 0), None);
    }

    #[test]
    fn test_status_mapping() {
        let limited = map_status(
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(60)),
            String::new(),
        );
        assert_eq!(
            limited.retry_policy(),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(60))
            }
        );

        let forbidden = map_status(StatusCode::FORBIDDEN, None, "duplicate content".into());
        assert!(matches!(
            forbidden,
            PublishError::Rejected { status: 403, ref message } if message == "duplicate content"
        ));
        assert_eq!(forbidden.retry_policy(), RetryPolicy::NonRetryable);

        let unavailable = map_status(StatusCode::SERVICE_UNAVAILABLE, None, String::new());
        assert!(matches!(unavailable, PublishError::Transport { .. }));
    }

    #[test]
    fn test_created_post_response_is_read() {
        let body = r#"{"data":{"id":"1850000000000000000","text":"hello"}}"#;

        let parsed: CreatePostResponse = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.data.id, "1850000000000000000");
    }
}
