//! Post body composition over the Messages API.

use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{CompositionRequest, FocusTheme, LlmError, PostComposer};
use tracing::debug;

use crate::AnthropicClient;

const SYSTEM: &str = "You write concise, professional social posts about AI, data strategy and \
business technology. Feature exactly one insight and its strategic value. Never mention an \
article or its title. Use active voice, no contractions, at most one emoji. Reply with the post \
body only: no link, no hashtags, no quotes.";

/// [`PostComposer`] backed by the Messages API.
pub struct AnthropicComposer {
    client: Arc<AnthropicClient>,
}

impl AnthropicComposer {
    pub fn new(client: Arc<AnthropicClient>) -> Self {
        Self { client }
    }
}

fn focus_hint(focus: FocusTheme) -> &'static str {
    match focus {
        FocusTheme::StrategicValue => "why this matters to the business",
        FocusTheme::SystematicApproach => "the method or framework behind it",
        FocusTheme::PracticalApplication => "how to apply it and what it changes",
        FocusTheme::ExpertInsights => "the expert or counter-intuitive angle",
        FocusTheme::General => "the single strongest takeaway",
    }
}

fn prompt(request: &CompositionRequest) -> String {
    format!(
        "Insight to feature:\n{}\n\n\
         Variation {} of the same article; angle: {}.\n\
         Hard limit: {} characters. Open with a strong hook and cut every filler word.",
        request.insight,
        request.variation,
        focus_hint(request.focus),
        request.max_chars,
    )
}

/// Strips whitespace and one pair of wrapping quotes the model sometimes adds.
fn clean_reply(reply: &str) -> String {
    let text = reply.trim();
    let unquoted = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    unquoted.trim().to_string()
}

#[async_trait]
impl PostComposer for AnthropicComposer {
    async fn compose(&self, request: &CompositionRequest) -> Result<String, LlmError> {
        let reply = self.client.complete(SYSTEM, &prompt(request)).await?;
        let body = clean_reply(&reply);
        if body.is_empty() {
            return Err(LlmError::InvalidResponse {
                message: "composer reply was empty".to_string(),
            });
        }
        debug!(
            variation = %request.variation,
            chars = body.chars().count(),
            limit = request.max_chars,
            "Post body composed"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::VariationNumber;

    fn request() -> CompositionRequest {
        CompositionRequest {
            variation: VariationNumber::new(2),
            focus: FocusTheme::SystematicApproach,
            insight: "Data quality compounds over time".to_string(),
            max_chars: 185,
        }
    }

    #[test]
    fn test_prompt_carries_insight_limit_and_angle() {
        let text = prompt(&request());

        assert!(text.contains("Data quality compounds over time"));
        assert!(text.contains("185 characters"));
        assert!(text.contains("Variation 2"));
        assert!(text.contains(focus_hint(FocusTheme::SystematicApproach)));
    }

    #[test]
    fn test_clean_reply_strips_wrapping_quotes() {
        assert_eq!(clean_reply("  \"Quality first 📊\"\n"), "Quality first 📊");
        assert_eq!(clean_reply("Say \"no\" to hype"), "Say \"no\" to hype");
    }
}
