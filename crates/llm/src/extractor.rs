//! Insight extraction over the Messages API.

use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{Article, InsightExtraction, InsightExtractor, LlmError, INSIGHTS_PER_ANALYSIS};
use tracing::{debug, warn};

use crate::AnthropicClient;

/// Characters of article body sent to the model.
const CONTENT_LIMIT: usize = 3000;

const SYSTEM: &str = "You analyse newsletter articles on AI, data strategy and business technology. \
Extract high-level strategic insights, each one a different angle and strong enough to stand alone \
as a short social post. Ignore the article title. Reply with JSON only, shaped as \
{\"key_insights\": [...], \"themes\": [...], \"expert_references\": [...], \"frameworks_mentioned\": [...]}.";

/// [`InsightExtractor`] backed by the Messages API.
pub struct AnthropicInsightExtractor {
    client: Arc<AnthropicClient>,
}

impl AnthropicInsightExtractor {
    pub fn new(client: Arc<AnthropicClient>) -> Self {
        Self { client }
    }
}

fn prompt(article: &Article) -> String {
    let content: String = article.content.chars().take(CONTENT_LIMIT).collect();
    format!(
        "Extract exactly {INSIGHTS_PER_ANALYSIS} distinct key insights from the article below.\n\
         Cover: business strategy, method or framework, expert or counter-intuitive view, \
         practical impact, organisation and culture, risks and pitfalls, future direction.\n\
         No two insights may overlap.\n\n\
         Article content:\n{content}"
    )
}

#[async_trait]
impl InsightExtractor for AnthropicInsightExtractor {
    async fn extract(&self, article: &Article) -> Result<InsightExtraction, LlmError> {
        let reply = self.client.complete(SYSTEM, &prompt(article)).await?;
        let extraction = parse_extraction(&reply);
        if extraction.key_insights.is_empty() {
            warn!(article = %article.number, "Model reply held no recognisable insights");
        }
        debug!(
            article = %article.number,
            insights = extraction.key_insights.len(),
            themes = extraction.themes.len(),
            "Insights extracted"
        );
        Ok(extraction)
    }
}

/// Reads a model reply as JSON, falling back to sectioned bullet lists.
///
/// JSON may be wrapped in prose or a code fence; the outermost `{...}` span is
/// tried first. Anything that does not decode goes through the bullet parser.
pub fn parse_extraction(reply: &str) -> InsightExtraction {
    if let Some(json) = json_span(reply) {
        match serde_json::from_str::<InsightExtraction>(json) {
            Ok(extraction) => return extraction,
            Err(e) => debug!(error = %e, "Reply is not valid extraction JSON; parsing bullets"),
        }
    }
    parse_bullets(reply)
}

fn json_span(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (start < end).then(|| &reply[start..=end])
}

#[derive(Clone, Copy)]
enum Section {
    Insights,
    Themes,
    Experts,
    Frameworks,
}

fn parse_bullets(reply: &str) -> InsightExtraction {
    let mut out = InsightExtraction::default();
    let mut section = None;

    for line in reply.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(item) = bullet_text(line) {
            let target = match section {
                Some(Section::Insights) => &mut out.key_insights,
                Some(Section::Themes) => &mut out.themes,
                Some(Section::Experts) => &mut out.expert_references,
                Some(Section::Frameworks) => &mut out.frameworks,
                None => continue,
            };
            target.push(item.to_string());
            continue;
        }

        let lower = line.to_lowercase();
        section = if lower.contains("insight") {
            Some(Section::Insights)
        } else if lower.contains("theme") {
            Some(Section::Themes)
        } else if lower.contains("expert") || lower.contains("reference") {
            Some(Section::Experts)
        } else if lower.contains("framework") {
            Some(Section::Frameworks)
        } else {
            section
        };
    }

    out
}

/// Text of a `-`, `•`, `*` or `1.` / `1)` bullet line.
fn bullet_text(line: &str) -> Option<&str> {
    let rest = if let Some(rest) = line.strip_prefix(['-', '•', '*']) {
        rest
    } else {
        let digits = line.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        line[digits..].strip_prefix(['.', ')'])?
    };
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}
