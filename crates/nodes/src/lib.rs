//! Cadence orchestration layer.
//!
//! This crate sequences calls between the business rules in the [`pipeline`]
//! crate and the infrastructure ports (document source, language model,
//! publisher, state store). It contains no domain rules of its own.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`resolve`] | Cache-or-compute for articles and analyses, URL integrity check |
//! | [`compose`] | Sequential composition of a variation batch |
//! | [`orchestrator`] | Single-cycle [`Orchestrator`] and its [`RunMode`]s |
//! | [`scheduler`] | Multi-week [`Scheduler`] preview |
//! | [`status`] | Read-only [`StatusReport`] |

use std::sync::Arc;

use pipeline::{ArticleSource, InsightExtractor, PostComposer, Publisher, StateStore};

pub mod compose;
pub mod orchestrator;
pub mod resolve;
pub mod scheduler;
pub mod status;

pub use compose::compose_batch;
pub use orchestrator::{Orchestrator, PipelineSettings, RunMode, RunOutcome, RunRecord};
pub use scheduler::{PipelinePreview, ScheduledItem, Scheduler};
pub use status::{status, CachedArticle, StatusReport};

/// Infrastructure implementations injected by the composition root.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn ArticleSource>,
    pub extractor: Arc<dyn InsightExtractor>,
    pub composer: Arc<dyn PostComposer>,
    pub publisher: Arc<dyn Publisher>,
    pub store: Arc<dyn StateStore>,
}
