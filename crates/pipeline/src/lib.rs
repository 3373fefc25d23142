//! Core rotation domain for Cadence.
//!
//! This crate contains every domain concept, newtype identifier, record type,
//! deterministic rule and port trait used to turn a newsletter into a rotating
//! series of social posts. Infrastructure crates implement the traits defined
//! here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ArticleNumber`, `VariationNumber`, `RunId`, ...) |
//! | [`types`] | Records (`Article`, `Analysis`, `ComposedVariant`, `Timestamp`, ...) |
//! | [`validation`] | Article set validator and violation types |
//! | [`rotation`] | Rotation pointer, `advance`, persisted `RotationState` |
//! | [`composition`] | Insight selection, hashtags, length accounting, post assembly |
//! | [`schedule`] | Weekly posting slots and pointer projection |
//! | [`ports`] | Port traits and their component errors |
//! | [`errors`] | Run-level error, step and retry-policy types |

pub mod composition;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod rotation;
pub mod schedule;
pub mod types;
pub mod validation;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use composition::{
    assemble_post, body_budget, build_variant, effective_length, select_hashtags,
    select_insight, truncate_to_budget, CompositionRequest, FocusTheme, PLATFORM_LIMIT,
    SHORTENED_URL_LENGTH,
};
pub use errors::{PipelineError, RetryPolicy, RunFailure, RunStep};
pub use identifiers::{ArticleNumber, DocumentId, PostId, RunId, VariationNumber};
pub use ports::{
    ArticleSource, InsightExtractor, LlmError, PostComposer, PublishError, Publisher,
    SourceError, StateStore, StateStoreError,
};
pub use rotation::{RotationPointer, RotationState, VARIATIONS_PER_ARTICLE};
pub use schedule::{
    project, PlannedSlot, PostingSchedule, ScheduleError, SlotProjection,
    MAX_PREVIEW_WEEKS,
};
pub use types::{
    Analysis, Article, ComposedVariant, InsightExtraction, PublishReceipt, Timestamp,
    INSIGHTS_PER_ANALYSIS,
};
pub use validation::{
    ArticleOrigin, ArticleValidator, RequiredField, UrlDefect, ValidationAudit, ValidationError,
    ValidationReport, ValidationRules, Violation, ViolationKind,
};
