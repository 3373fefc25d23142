//! Cadence language-model adapter.
//!
//! Implements the two model-backed ports of the [`pipeline`] crate on top of
//! Anthropic's Messages API:
//!
//! | Type | Port | Calls per run |
//! |------|------|---------------|
//! | [`AnthropicInsightExtractor`] | [`pipeline::InsightExtractor`] | one per uncached article |
//! | [`AnthropicComposer`] | [`pipeline::PostComposer`] | one per variation |
//!
//! Both share one [`AnthropicClient`], which owns HTTP transport, headers and
//! the mapping of HTTP failures onto [`pipeline::LlmError`]. No retries happen
//! here: a rate-limit reply surfaces as `LlmError::RateLimited` with the
//! server's `retry-after` hint so the operator can decide.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Prompt wording, request formatting and reply parsing
//! live here. The [`pipeline`] crate sees only the port traits.

mod client;
mod composer;
mod extractor;

pub use client::{AnthropicClient, AnthropicConfig};
pub use composer::AnthropicComposer;
pub use extractor::{parse_extraction, AnthropicInsightExtractor};
