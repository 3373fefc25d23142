//! Cadence newsletter document adapter.
//!
//! Implements [`pipeline::ArticleSource`] for the two places a newsletter
//! document can live:
//!
//! - [`DriveDocumentSource`] exports a Google Docs document as plain text over
//!   the Drive v3 API.
//! - [`FileDocumentSource`] reads a local text file. Useful for dry runs and
//!   for documents kept under version control.
//!
//! Both hand the raw text to [`parse_document`], which splits it into
//! numbered [`pipeline::Article`]s. Validation of the resulting set is not
//! done here; the orchestrator runs the domain validator on whatever a source
//! returns.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport, authentication and text layout live here.
//! The [`pipeline`] crate sees only [`pipeline::ArticleSource`].

mod drive;
mod file;
mod parser;

pub use drive::DriveDocumentSource;
pub use file::FileDocumentSource;
pub use parser::parse_document;
