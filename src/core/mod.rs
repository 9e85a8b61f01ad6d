//! Core domain types: ideas, tags, projects, trunk and tree layout.
//!
//! # Architecture
//!
//! ```text
//! Storage (documents) → IdeaStore (one project's set) → render (views, layout)
//! ```
//!
//! # Key Concepts
//!
//! ## Ideas
//!
//! An [`Idea`](idea::Idea) is a short piece of text. Words written as
//! `#word` become its tags. An idea may build on one other idea, which makes
//! the idea set a forest of parent pointers. At most one idea per project is
//! the trunk, the central thought the rest grows from.
//!
//! ## Layout
//!
//! The tree view gives every subtree a width equal to its number of leaves
//! and centers each parent above its children. Links that loop back are cut
//! where they revisit an idea already on the current path.
//!
//! See [`layout`] for geometry and [`graph_query`] for the read-only
//! relations the layout builds on.
//!
//! ## Errors
//!
//! Expected edge cases (blank text, dangling links, cycles) leave state
//! unchanged. Structured errors with a category, code and recovery hint are
//! reserved for storage failures and refused operations. See [`error`].
//!
//! # Modules
//!
//! - [`idea`] - The idea record and its identifier
//! - [`tags`] - Tag extraction and text previews
//! - [`graph_query`] - Parent, children and root queries
//! - [`store`] - Mutations of one project's idea set
//! - [`layout`] - Forest layout engine
//! - [`project`] - Projects and the project catalog
//! - [`view`] - View state and rendering
//! - [`guided`] - Guided capture questions
//! - [`config`] - Display and layout settings
//! - [`registry`] - Storage-backed entry point for the CLI
//! - [`error`] - Structured error types

pub mod config;
pub mod error;
pub mod graph_query;
pub mod guided;
pub mod idea;
pub mod layout;
pub mod project;
pub mod registry;
pub mod store;
pub mod tags;
pub mod view;
