//! # MoodLoop Domain
//!
//! Business domain types and models for the MoodLoop client.
//!
//! This crate contains:
//! - Domain data types (users, posts, tracks, mood coordinates)
//! - Comment thread model and view-model traversal
//! - Domain constants (endpoint paths, storage keys, defaults)
//!
//! ## Architecture
//! - No dependencies on other MoodLoop crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod comments;
pub mod constants;
pub mod types;

// Re-export commonly used items
pub use comments::{flatten_thread, Comment, CommentRow};
pub use types::*;
