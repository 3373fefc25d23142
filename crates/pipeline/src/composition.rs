//! Deterministic rules around post composition.
//!
//! The wording of a post comes from the [`crate::PostComposer`] port. Everything
//! around it is decided here: which insight each variation features, which
//! hashtags are attached, how much room the body gets, how the final post is
//! assembled and how long the platform will consider it.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Article, ComposedVariant, VariationNumber};

/// Maximum effective length of a published post.
pub const PLATFORM_LIMIT: usize = 280;

/// Width the platform charges for any link after shortening.
pub const SHORTENED_URL_LENGTH: usize = 23;

/// Characters used by the two blank-line separators between body, link and hashtags.
const SEPARATOR_LENGTH: usize = 4;

/// Slack left for composer output that slightly overshoots its budget.
const SAFETY_MARGIN: usize = 35;

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("link pattern is a valid regex"));

// ---------------------------------------------------------------------------
// Focus themes
// ---------------------------------------------------------------------------

/// Angle a variation is asked to take on its insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTheme {
    StrategicValue,
    SystematicApproach,
    PracticalApplication,
    ExpertInsights,
    General,
}

impl FocusTheme {
    /// Focus for a 1-based variation number.
    pub fn for_variation(variation: VariationNumber) -> Self {
        match variation.get() {
            1 => Self::StrategicValue,
            2 => Self::SystematicApproach,
            3 => Self::PracticalApplication,
            4 => Self::ExpertInsights,
            _ => Self::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrategicValue => "strategic_value",
            Self::SystematicApproach => "systematic_approach",
            Self::PracticalApplication => "practical_application",
            Self::ExpertInsights => "expert_insights",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for FocusTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Insight selection
// ---------------------------------------------------------------------------

/// Picks the insight a variation features.
///
/// Candidates are the insights of `pool` not yet in `used`; once every insight
/// has been used the candidates reset to the whole pool. The candidate at
/// `(variation - 1) % candidates.len()` is returned. `None` only for an empty
/// pool.
pub fn select_insight<'a>(
    pool: &'a [String],
    used: &[String],
    variation: VariationNumber,
) -> Option<&'a String> {
    if pool.is_empty() {
        return None;
    }
    let mut candidates: Vec<&String> = pool.iter().filter(|i| !used.contains(i)).collect();
    if candidates.is_empty() {
        candidates = pool.iter().collect();
    }
    let index = (variation.get().saturating_sub(1) as usize) % candidates.len();
    Some(candidates[index])
}

// ---------------------------------------------------------------------------
// Hashtags
// ---------------------------------------------------------------------------

/// `#AI` plus one secondary tag chosen from the analysis themes.
pub fn select_hashtags(themes: &BTreeSet<String>) -> Vec<String> {
    let keywords = themes
        .iter()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let has_word = |w: &str| keywords.split(|c: char| !c.is_alphanumeric()).any(|t| t == w);

    let secondary = if keywords.contains("machine learning") || has_word("ml") {
        "#MachineLearning"
    } else if keywords.contains("leadership") || keywords.contains("management") {
        "#Leadership"
    } else if keywords.contains("generative") || keywords.contains("gpt") {
        "#GenerativeAI"
    } else if keywords.contains("data") && keywords.contains("analytics") {
        "#DataAnalytics"
    } else if keywords.contains("transform") {
        "#DigitalTransformation"
    } else {
        "#DataStrategy"
    };

    vec!["#AI".to_string(), secondary.to_string()]
}

// ---------------------------------------------------------------------------
// Length accounting
// ---------------------------------------------------------------------------

/// Length the platform charges for `text`: every link counts as
/// [`SHORTENED_URL_LENGTH`] characters, everything else per Unicode scalar.
pub fn effective_length(text: &str) -> usize {
    let mut length = text.chars().count();
    for link in LINK_PATTERN.find_iter(text) {
        length = length - link.as_str().chars().count() + SHORTENED_URL_LENGTH;
    }
    length
}

/// Characters available to the post body once link, hashtags, separators and
/// the safety margin are accounted for.
pub fn body_budget(hashtags: &[String]) -> usize {
    let hashtag_length = hashtags.join(" ").chars().count();
    PLATFORM_LIMIT.saturating_sub(
        SHORTENED_URL_LENGTH + hashtag_length + SEPARATOR_LENGTH + SAFETY_MARGIN,
    )
}

/// Cuts `body` to at most `budget` characters at a word boundary, ending in `…`.
pub fn truncate_to_budget(body: &str, budget: usize) -> String {
    if body.chars().count() <= budget {
        return body.to_string();
    }
    let head: String = body.chars().take(budget.saturating_sub(1)).collect();
    let cut = match head.rfind(' ') {
        Some(idx) => &head[..idx],
        None => head.as_str(),
    };
    format!("{}…", cut.trim_end())
}

/// Joins body, link and hashtags with blank lines. The link part is left out
/// when the article has no URL.
pub fn assemble_post(body: &str, url: &str, hashtags: &[String]) -> String {
    let tags = hashtags.join(" ");
    if url.trim().is_empty() {
        format!("{body}\n\n{tags}")
    } else {
        format!("{body}\n\n{}\n\n{tags}", url.trim())
    }
}

// ---------------------------------------------------------------------------
// Requests and variants
// ---------------------------------------------------------------------------

/// Constraints handed to the composer for one variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionRequest {
    pub variation: VariationNumber,
    pub focus: FocusTheme,
    /// The single insight this variation must feature.
    pub insight: String,
    /// Hard ceiling on body characters.
    pub max_chars: usize,
}

/// Assembles the final variant from composer output.
///
/// The body is trimmed and cut to the budget before the link and hashtags are
/// appended; `character_count` is the effective length of the full post.
pub fn build_variant(
    article: &Article,
    request: &CompositionRequest,
    body: &str,
    hashtags: Vec<String>,
) -> ComposedVariant {
    let body = truncate_to_budget(body.trim(), request.max_chars);
    let content = assemble_post(&body, &article.url, &hashtags);
    ComposedVariant {
        article_number: article.number,
        variation_number: request.variation,
        focus: request.focus,
        character_count: effective_length(&content),
        content,
        hashtags,
        insights_used: vec![request.insight.clone()],
    }
}
