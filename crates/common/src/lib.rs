//! Reusable async utilities shared across MoodLoop crates.
//!
//! Nothing in this crate knows about HTTP, tokens, or the MoodLoop
//! API: the de-duplication cache and the optimistic update helper are
//! generic over value and error types and carry no business meaning.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod dedup;
pub mod optimistic;

pub use dedup::RequestCache;
pub use optimistic::OptimisticMap;
