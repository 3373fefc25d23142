//! Minimal Anthropic Messages API client shared by the extractor and composer.
//!
//! The client never retries. Rate limits surface as [`LlmError::RateLimited`]
//! with the server's `retry-after` when present.

use std::time::Duration;

use pipeline::LlmError;
use reqwest::{header::HeaderMap, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for the Messages API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnthropicConfig {
    pub model: String,
    pub max_tokens: u32,
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 2048,
            base_url: "https://api.anthropic.com".to_string(),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Minimal single-turn client for Anthropic's Messages API.
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
    api_key: String,
}

impl AnthropicClient {
    /// # Errors
    ///
    /// Returns [`LlmError::Configuration`] when the key is blank or the HTTP
    /// client cannot be built.
    pub fn new(config: AnthropicConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Configuration {
                message: "API key is empty".to_string(),
            });
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Configuration {
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends one user turn under `system` and returns the concatenated text
    /// blocks of the reply.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1/messages",
            self.config.base_url.trim_end_matches('/')
        );
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            warn!(%status, model = %self.config.model, "Messages API call failed");
            return Err(map_status(status, retry_after, text));
        }

        let reply: MessagesResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                message: e.to_string(),
            })?;
        let text = reply
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse {
                message: "reply contained no text".to_string(),
            });
        }
        debug!(chars = text.chars().count(), "Messages API reply received");
        Ok(text)
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn map_status(status: StatusCode, retry_after: Option<Duration>, body: String) -> LlmError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited { retry_after },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Configuration {
            message: format!("API key rejected ({status})"),
        },
        _ => LlmError::Request {
            message: format!("API error ({status}): {}", body.trim()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_blank_key_is_a_configuration_error() {
        let err = AnthropicClient::new(AnthropicConfig::default(), "  ")
            .err()
            .unwrap();

        assert!(matches!(err, LlmError::Configuration { .. }));
    }

    #[test]
    fn test_rate_limit_carries_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("30"));

        let err = map_status(
            StatusCode::TOO_MANY_REQUESTS,
            retry_after(&headers),
            String::new(),
        );

        assert!(matches!(
            err,
            LlmError::RateLimited {
                retry_after: Some(d)
            } if d == Duration::from_secs(30)
        ));
    }

    #[test]
    fn test_auth_failure_is_not_retryable() {
        let err = map_status(StatusCode::UNAUTHORIZED, None, String::new());

        assert_eq!(err.retry_policy(), pipeline::RetryPolicy::NonRetryable);
    }

    #[test]
    fn test_server_error_keeps_body_in_message() {
        let err = map_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
            "overloaded".to_string(),
        );

        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = MessagesRequest {
            model: "m",
            max_tokens: 10,
            system: "s",
            messages: [Message {
                role: "user",
                content: "hi",
            }],
        };

        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["system"], "s");
    }

    #[test]
    fn test_reply_text_blocks_are_read() {
        let reply: MessagesResponse = serde_json::from_str(
            r#"{"id":"msg_1","content":[{"type":"text","text":"hello"}],"stop_reason":"end_turn"}"#,
        )
        .unwrap();

        assert_eq!(reply.content[0].text.as_deref(), Some("hello"));
    }
}
