//! `cadence.toml` loading.
//!
//! The file is optional: every section and key has a default, so an empty or
//! absent file yields a usable configuration. Secrets never live in the file;
//! each section names the environment variable that holds its credential.

use std::path::{Path, PathBuf};

use pipeline::{ArticleNumber, PostingSchedule, ScheduleError, ValidationRules};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid [schedule] section: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("[source] kind = \"file\" requires a path")]
    MissingSourcePath,

    #[error("no document id configured; set [source] document_id or CADENCE_DOCUMENT_ID")]
    MissingDocumentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Drive,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSection {
    pub kind: SourceKind,
    pub document_id: Option<String>,
    /// Text file read when `kind = "file"`.
    pub path: Option<PathBuf>,
    /// Environment variable holding the Drive OAuth access token.
    pub token_env: String,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            kind: SourceKind::Drive,
            document_id: None,
            path: None,
            token_env: "GOOGLE_DRIVE_ACCESS_TOKEN".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateSection {
    pub path: PathBuf,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("rotation_state.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleSection {
    pub day: String,
    pub time: String,
    pub timezone: String,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            day: "thursday".to_string(),
            time: "11:30".to_string(),
            timezone: "America/New_York".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationSection {
    pub expected_count: usize,
    /// Article allowed to lack a URL; `0` disables the exemption.
    pub incomplete_article: u32,
    pub url_path_segment: String,
    pub url_tag: String,
    pub short_content_words: usize,
}

impl Default for ValidationSection {
    fn default() -> Self {
        let rules = ValidationRules::default();
        Self {
            expected_count: rules.expected_count,
            incomplete_article: rules.incomplete_article.map_or(0, ArticleNumber::get),
            url_path_segment: rules.url_path_segment,
            url_tag: rules.url_tag,
            short_content_words: rules.short_content_words,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSection {
    pub model: String,
    pub max_tokens: u32,
    pub base_url: String,
    pub api_key_env: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        let defaults = llm::AnthropicConfig::default();
        Self {
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            base_url: defaults.base_url,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishingSection {
    /// When `false`, `publish` behaves as `generate`.
    pub enabled: bool,
    pub token_env: String,
    pub base_url: Option<String>,
}

impl Default for PublishingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            token_env: "X_BEARER_TOKEN".to_string(),
            base_url: None,
        }
    }
}

/// Parsed `cadence.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CadenceConfig {
    pub source: SourceSection,
    pub state: StateSection,
    pub schedule: ScheduleSection,
    pub validation: ValidationSection,
    pub llm: LlmSection,
    pub publishing: PublishingSection,
}

impl CadenceConfig {
    /// Reads `path`, or returns defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Fails on an unknown weekday, malformed time or unknown timezone.
    pub fn posting_schedule(&self) -> Result<PostingSchedule, ConfigError> {
        let s = &self.schedule;
        Ok(PostingSchedule::parse(&s.day, &s.time, &s.timezone)?)
    }

    pub fn validation_rules(&self) -> ValidationRules {
        let v = &self.validation;
        ValidationRules {
            expected_count: v.expected_count,
            incomplete_article: (v.incomplete_article != 0)
                .then(|| ArticleNumber::new(v.incomplete_article)),
            url_path_segment: v.url_path_segment.clone(),
            url_tag: v.url_tag.clone(),
            short_content_words: v.short_content_words,
            ..ValidationRules::default()
        }
    }

    pub fn llm_config(&self) -> llm::AnthropicConfig {
        llm::AnthropicConfig {
            model: self.llm.model.clone(),
            max_tokens: self.llm.max_tokens,
            base_url: self.llm.base_url.clone(),
        }
    }
}
