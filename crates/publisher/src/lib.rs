//! Cadence social platform adapter.
//!
//! Implements [`pipeline::Publisher`] with [`XPublisher`], which posts through
//! the X API v2 `POST /2/tweets` endpoint using an OAuth 2.0 user-context
//! bearer token.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, authentication and the mapping of
//! platform responses onto [`pipeline::PublishError`] live here. The length
//! check runs before any network call, so an over-long post never reaches the
//! platform.

mod x;

pub use x::XPublisher;
