//! Command implementations and collaborator wiring.
//!
//! Each command returns a [`CommandOutput`]: a JSON document whose `status`
//! field is `"success"` or `"error"`. Collaborators are built per command so
//! that read-only commands never need API credentials.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use chrono::Utc;
use documents::{DriveDocumentSource, FileDocumentSource};
use llm::{AnthropicClient, AnthropicComposer, AnthropicInsightExtractor};
use nodes::{Collaborators, Orchestrator, PipelineSettings, RunMode, Scheduler};
use pipeline::{
    ArticleSource, ArticleValidator, DocumentId, PublishError, PublishReceipt, Publisher,
    RunFailure,
};
use publisher::XPublisher;
use serde::Serialize;
use serde_json::{json, Value};
use storage::JsonFileStateStore;
use tracing::{info, warn};

use crate::config::{CadenceConfig, ConfigError, SourceKind};

/// JSON result of one command plus whether it succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub success: bool,
    pub body: Value,
}

impl CommandOutput {
    fn success(mut body: Value) -> Self {
        body["status"] = json!("success");
        Self {
            success: true,
            body,
        }
    }

    fn from_failure(failure: &RunFailure) -> Self {
        Self {
            success: false,
            body: json!({
                "status": "error",
                "step": failure.step,
                "reason": failure.error.to_string(),
                "retry": failure.error.retry_policy(),
            }),
        }
    }

    fn from_serialized(value: &impl Serialize) -> Result<Self> {
        let body = serde_json::to_value(value).context("failed to encode command result")?;
        let success = body["status"] == "success";
        Ok(Self { success, body })
    }
}

/// Resolved settings shared by every command.
pub struct Context {
    pub config: CadenceConfig,
    pub state_path: PathBuf,
    pub document_id: Option<String>,
}

impl Context {
    fn store(&self) -> Arc<JsonFileStateStore> {
        Arc::new(JsonFileStateStore::new(&self.state_path))
    }

    fn document(&self) -> Result<DocumentId, ConfigError> {
        let configured = self
            .document_id
            .clone()
            .or_else(|| self.config.source.document_id.clone());
        let fallback = match self.config.source.kind {
            SourceKind::File => self
                .config
                .source
                .path
                .as_ref()
                .map(|p| p.display().to_string()),
            SourceKind::Drive => None,
        };
        configured
            .or(fallback)
            .and_then(DocumentId::new)
            .ok_or(ConfigError::MissingDocumentId)
    }

    fn source(&self) -> Result<Arc<dyn ArticleSource>> {
        let source = &self.config.source;
        Ok(match source.kind {
            SourceKind::File => {
                let path = source.path.clone().ok_or(ConfigError::MissingSourcePath)?;
                Arc::new(FileDocumentSource::new(path))
            }
            SourceKind::Drive => {
                let token = secret(&source.token_env)?;
                Arc::new(
                    DriveDocumentSource::new(token)
                        .context("failed to create Drive HTTP client")?,
                )
            }
        })
    }

    fn settings(&self) -> Result<PipelineSettings> {
        Ok(PipelineSettings {
            document: self.document()?,
            validator: ArticleValidator::new(self.config.validation_rules()),
        })
    }

    fn collaborators(&self, publishing: bool) -> Result<Arc<Collaborators>> {
        let api_key = secret(&self.config.llm.api_key_env)?;
        let client = Arc::new(
            AnthropicClient::new(self.config.llm_config(), api_key)
                .context("failed to create language model client")?,
        );

        let publisher: Arc<dyn Publisher> = if publishing {
            let token = secret(&self.config.publishing.token_env)?;
            let mut x = XPublisher::new(token).context("failed to create publisher")?;
            if let Some(base_url) = &self.config.publishing.base_url {
                x = x.with_base_url(base_url);
            }
            Arc::new(x)
        } else {
            Arc::new(DisabledPublisher)
        };

        Ok(Arc::new(Collaborators {
            source: self.source()?,
            extractor: Arc::new(AnthropicInsightExtractor::new(client.clone())),
            composer: Arc::new(AnthropicComposer::new(client)),
            publisher,
            store: self.store(),
        }))
    }
}

fn secret(var: &str) -> Result<String> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("environment variable {var} is not set"))
}

/// Stands in for the platform when publishing is switched off.
struct DisabledPublisher;

#[async_trait]
impl Publisher for DisabledPublisher {
    async fn publish(&self, _text: &str) -> Result<PublishReceipt, PublishError> {
        Err(PublishError::MissingCredentials {
            message: "publishing is disabled in configuration".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub async fn status(ctx: &Context) -> Result<CommandOutput> {
    let schedule = ctx.config.posting_schedule()?;
    let store = ctx.store();
    Ok(
        match nodes::status(store.as_ref(), schedule, Utc::now()).await {
            Ok(report) => CommandOutput::success(json!({ "report": report })),
            Err(failure) => CommandOutput::from_failure(&failure),
        },
    )
}

/// Runs one orchestrator cycle. `publish` falls back to `generate` when
/// publishing is disabled.
pub async fn run_cycle(ctx: &Context, requested: RunMode) -> Result<CommandOutput> {
    let publishing_disabled = requested == RunMode::Publish && !ctx.config.publishing.enabled;
    let mode = if publishing_disabled {
        warn!("Publishing is disabled; running generate instead");
        RunMode::Generate
    } else {
        requested
    };

    let orchestrator = Orchestrator::new(
        ctx.collaborators(mode == RunMode::Publish)?,
        ctx.settings()?,
    );
    let outcome = orchestrator.execute(mode).await;

    let mut output = CommandOutput::from_serialized(&outcome)?;
    if publishing_disabled {
        output.body["publishing_disabled"] = json!(true);
        output.body["note"] = json!("publishing is disabled; ran generate instead");
    }
    Ok(output)
}

pub async fn pipeline_preview(ctx: &Context, weeks: u32) -> Result<CommandOutput> {
    let schedule = ctx.config.posting_schedule()?;
    let scheduler = Scheduler::new(ctx.collaborators(false)?, ctx.settings()?, schedule);
    Ok(match scheduler.preview(weeks, Utc::now()).await {
        Ok(preview) => CommandOutput::success(json!({ "preview": preview })),
        Err(failure) => CommandOutput::from_failure(&failure),
    })
}

/// Fetches the document fresh and reports every article's standing. Never
/// touches the state record.
pub async fn validate(ctx: &Context) -> Result<CommandOutput> {
    let document = ctx.document()?;
    let validator = ArticleValidator::new(ctx.config.validation_rules());

    let articles = match ctx.source()?.fetch_articles(&document).await {
        Ok(articles) => articles,
        Err(e) => {
            return Ok(CommandOutput {
                success: false,
                body: json!({
                    "status": "error",
                    "step": pipeline::RunStep::LoadArticles,
                    "reason": e.to_string(),
                    "retry": e.retry_policy(),
                }),
            })
        }
    };

    let audit = validator.audit(&articles);
    let lines: Vec<Value> = articles
        .iter()
        .map(|article| {
            let problems: Vec<String> = audit
                .violations
                .iter()
                .filter(|v| v.article() == Some(article.number))
                .map(ToString::to_string)
                .collect();
            json!({
                "number": article.number,
                "title": article.title,
                "url": article.url,
                "word_count": article.word_count,
                "valid": problems.is_empty(),
                "problems": problems,
            })
        })
        .collect();

    let success = audit.violations.is_empty();
    info!(
        articles = articles.len(),
        violations = audit.violations.len(),
        "Document validated"
    );
    Ok(CommandOutput {
        success,
        body: json!({
            "status": if success { "success" } else { "error" },
            "document": document,
            "articles": lines,
            "report": audit.report,
            "violations": audit.violations,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(config: &str) -> Context {
        Context {
            config: CadenceConfig::parse(config).unwrap(),
            state_path: PathBuf::from("state.json"),
            document_id: None,
        }
    }

    #[test]
    fn test_document_id_flag_wins_over_config() {
        let mut ctx = context("[source]\ndocument_id = \"from-file\"");
        ctx.document_id = Some("from-flag".to_string());

        assert_eq!(ctx.document().unwrap().as_str(), "from-flag");
    }

    #[test]
    fn test_file_source_falls_back_to_path_as_document_id() {
        let ctx = context("[source]\nkind = \"file\"\npath = \"newsletter.txt\"");

        assert_eq!(ctx.document().unwrap().as_str(), "newsletter.txt");
    }

    #[test]
    fn test_drive_source_requires_document_id() {
        let ctx = context("");

        assert!(matches!(
            ctx.document().unwrap_err(),
            ConfigError::MissingDocumentId
        ));
    }

    #[tokio::test]
    async fn test_status_on_fresh_state_reports_first_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context("");
        ctx.state_path = dir.path().join("state.json");

        let output = status(&ctx).await.unwrap();

        assert!(output.success);
        assert_eq!(output.body["status"], "success");
        assert_eq!(output.body["report"]["current"]["article"], 1);
        assert_eq!(output.body["report"]["total_published"], 0);
        assert!(!ctx.state_path.exists());
    }

    #[tokio::test]
    async fn test_validate_reports_each_article() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("newsletter.txt");
        let mut text = String::new();
        for n in 1..=5 {
            text.push_str(&format!("Article #{n}\n\nArticle #{n} Title: Article {n}\n\n"));
            if n != 5 {
                text.push_str(&format!(
                    "Article #{n} URL: https://www.linkedin.com/pulse/a{n}-jane-doe-lim-x{n}y/\n\n"
                ));
            }
            text.push_str(&format!("{}\n\n", "word ".repeat(60)));
        }
        std::fs::write(&doc, text).unwrap();
        let mut ctx = context(&format!(
            "[source]\nkind = \"file\"\npath = {:?}",
            doc.display().to_string()
        ));
        ctx.state_path = dir.path().join("state.json");

        let output = validate(&ctx).await.unwrap();

        assert!(output.success, "{}", output.body);
        assert_eq!(output.body["articles"].as_array().unwrap().len(), 5);
        assert_eq!(output.body["report"]["total_articles"], 5);
        assert!(!ctx.state_path.exists());
    }

    #[tokio::test]
    async fn test_validate_flags_malformed_url() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("newsletter.txt");
        std::fs::write(
            &doc,
            "Article #1\nArticle #1 Title: One\nArticle #1 URL: https://www.linkedin.com/in/jane/profile/\n\nBody\n",
        )
        .unwrap();
        let ctx = context(&format!(
            "[source]\nkind = \"file\"\npath = {:?}\n[validation]\nexpected_count = 1",
            doc.display().to_string()
        ));

        let output = validate(&ctx).await.unwrap();

        assert!(!output.success);
        assert_eq!(output.body["status"], "error");
        assert_eq!(output.body["articles"][0]["valid"], false);
    }

    #[test]
    fn test_failure_output_carries_step_and_retry() {
        let failure = RunFailure::new(
            pipeline::RunStep::Publish,
            PublishError::RateLimited { retry_after: None },
        );

        let output = CommandOutput::from_failure(&failure);

        assert!(!output.success);
        assert_eq!(output.body["step"], "publish");
        assert!(output.body["reason"].as_str().unwrap().contains("rate limit"));
    }
}
