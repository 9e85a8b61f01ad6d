//! Persistence for projects and their idea sets.
//!
//! The storage layer knows nothing about trunks, links or layout. It reads
//! and writes whole documents; the registry decides what goes in them.
//!
//! ```text
//! ┌────────────┐  load   ┌───────────┐  mutate  ┌────────────┐
//! │  Storage   │ ──────▶ │ IdeaStore │ ───────▶ │  Storage   │
//! │ (projects, │         │ (one set) │  save if │ (full set  │
//! │   ideas)   │         └───────────┘  applied │  replaced) │
//! └────────────┘                                └────────────┘
//! ```
//!
//! # Modules
//!
//! - [`backend`] - `Storage` trait with in-memory and JSON file backends

pub mod backend;

pub use backend::{FileStorage, InMemoryStorage, SharedStorage, Storage, StorageError};
