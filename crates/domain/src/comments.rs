//! Comment thread model and view-model traversal
//!
//! Comments form a tagged recursive tree. Presentation layers do not
//! walk the tree themselves; [`flatten_thread`] produces a flat,
//! depth-annotated list in display order (each comment immediately
//! followed by its replies, depth-first).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::User;

/// A comment with nested replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: User,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub children: Vec<Comment>,
}

/// One row of a flattened comment thread.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRow {
    pub id: String,
    pub author: User,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Nesting depth; top-level comments are depth 0.
    pub depth: usize,
}

/// Flatten a comment thread into display order.
///
/// Iterative depth-first traversal: children are pushed in reverse so
/// siblings come off the stack in their original order. Recursion is
/// avoided so arbitrarily deep threads cannot overflow the stack.
#[must_use]
pub fn flatten_thread(comments: &[Comment]) -> Vec<CommentRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&Comment, usize)> = comments.iter().rev().map(|c| (c, 0)).collect();

    while let Some((comment, depth)) = stack.pop() {
        rows.push(CommentRow {
            id: comment.id.clone(),
            author: comment.author.clone(),
            content: comment.content.clone(),
            created_at: comment.created_at,
            depth,
        });

        for child in comment.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    rows
}
