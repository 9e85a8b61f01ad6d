//! Thinktree - capture thoughts, tag them and grow them into trees.
//!
//! This crate provides the core library functionality for thinktree.

pub mod cli;
pub mod core;
pub mod storage;
