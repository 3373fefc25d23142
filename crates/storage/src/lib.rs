//! Cadence rotation state persistence.
//!
//! Implements [`pipeline::StateStore`] with [`JsonFileStateStore`], which keeps
//! the single [`pipeline::RotationState`] record as a pretty-printed JSON file.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** File layout, atomic replacement and decoding live here.
//! The [`pipeline`] crate sees only [`pipeline::StateStore`].
//!
//! ## Durability
//!
//! A save writes the full record to a sibling temporary file, syncs it, and
//! renames it over the target. A reader therefore sees either the previous
//! record or the new one, never a partial write. Concurrent writers from
//! separate processes are not coordinated.

mod json_file;

pub use json_file::JsonFileStateStore;
