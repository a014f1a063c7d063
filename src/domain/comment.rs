//! Threaded review comments.
//!
//! Comments arrive as a forest: every top-level comment owns its replies in a
//! `children` array (older servers call it `childs`). The builder below walks
//! the document with an explicit worklist so that reply depth is bounded by
//! [`MAX_THREAD_DEPTH`] rather than by the call stack.

use super::error::ModelError;
use super::identity::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Deepest reply chain accepted from the server.
///
/// Each reply level costs two JSON nesting levels (the comment object and its
/// `children` array) and a review page wraps the forest in four more, so this
/// stays well inside `serde_json`'s parser limit of 128.
pub const MAX_THREAD_DEPTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: String,
    pub author: Identity,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub line_id: String,
    pub children: Vec<Comment>,
}

#[derive(Deserialize)]
struct CommentFields {
    id: String,
    author: Identity,
    #[serde(default)]
    created: i64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    line_id: String,
}

struct PendingComment {
    fields: CommentFields,
    children: Vec<usize>,
}

fn child_values(value: &Value) -> Result<&[Value], ModelError> {
    let children = value.get("children").or_else(|| value.get("childs"));
    match children {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ModelError::MalformedComment(format!(
            "children must be an array, got {other}"
        ))),
    }
}

impl Comment {
    /// Builds one comment and all of its replies.
    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        // Pre-order arena: every child index is greater than its parent's.
        let mut arena: Vec<PendingComment> = Vec::new();
        let mut worklist: Vec<(&Value, Option<usize>, usize)> = vec![(value, None, 0)];

        while let Some((node, parent, depth)) = worklist.pop() {
            if depth > MAX_THREAD_DEPTH {
                return Err(ModelError::MalformedComment(format!(
                    "reply chain deeper than {MAX_THREAD_DEPTH}"
                )));
            }
            let fields = CommentFields::deserialize(node)
                .map_err(|err| ModelError::MalformedComment(err.to_string()))?;
            let index = arena.len();
            arena.push(PendingComment {
                fields,
                children: Vec::new(),
            });
            if let Some(parent) = parent {
                arena[parent].children.push(index);
            }
            for child in child_values(node)?.iter().rev() {
                worklist.push((child, Some(index), depth + 1));
            }
        }

        let mut built: Vec<Option<Comment>> = Vec::with_capacity(arena.len());
        built.resize_with(arena.len(), || None);
        for (index, pending) in arena.into_iter().enumerate().rev() {
            let children = pending
                .children
                .iter()
                .map(|&child| {
                    built[child].take().ok_or_else(|| {
                        ModelError::MalformedComment("reply referenced twice".to_string())
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let CommentFields {
                id,
                author,
                created,
                text,
                line_id,
            } = pending.fields;
            let created_at = DateTime::from_timestamp(created, 0).ok_or_else(|| {
                ModelError::MalformedComment(format!("timestamp {created} out of range"))
            })?;
            built[index] = Some(Comment {
                id,
                author,
                created_at,
                text,
                line_id,
                children,
            });
        }

        built
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| ModelError::MalformedComment("empty comment document".to_string()))
    }

    /// Number of comments in this thread, the root included.
    pub fn thread_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(comment) = stack.pop() {
            count += 1;
            stack.extend(comment.children.iter());
        }
        count
    }
}

/// All top-level comments of a review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentForest {
    pub roots: Vec<Comment>,
}

impl CommentForest {
    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        let items = match value {
            Value::Null => return Ok(Self::default()),
            Value::Array(items) => items,
            other => {
                return Err(ModelError::MalformedComment(format!(
                    "expected an array of comments, got {other}"
                )));
            }
        };
        let roots = items
            .iter()
            .map(Comment::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { roots })
    }

    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let value: Value =
            serde_json::from_str(text).map_err(|err| ModelError::MalformedComment(err.to_string()))?;
        Self::from_value(&value)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of comments across every thread.
    pub fn total(&self) -> usize {
        self.roots.iter().map(Comment::thread_size).sum()
    }

    /// Top-level threads grouped by the diff line they are attached to.
    pub fn by_line(&self) -> BTreeMap<&str, Vec<&Comment>> {
        let mut map: BTreeMap<&str, Vec<&Comment>> = BTreeMap::new();
        for root in &self.roots {
            map.entry(root.line_id.as_str()).or_default().push(root);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn author(username: &str) -> Value {
        json!({ "username": username, "first_name": "F", "last_name": "L" })
    }

    #[test]
    fn builds_two_nested_levels() {
        let value = json!({
            "id": "root",
            "author": author("bob"),
            "created": 1_500_000_000,
            "text": "top",
            "line_id": "10",
            "childs": [{
                "id": "mid",
                "author": author("alice"),
                "created": 1_500_000_100,
                "text": "reply",
                "line_id": "10",
                "children": [{
                    "id": "leaf",
                    "author": author("carol"),
                    "created": 1_500_000_200,
                    "text": "deepest",
                    "line_id": "10",
                }],
            }],
        });

        let root = Comment::from_value(&value).unwrap();
        let leaf = &root.children[0].children[0];
        assert_eq!(leaf.id, "leaf");
        assert_eq!(leaf.author.username, "carol");
        assert_eq!(leaf.text, "deepest");
        assert_eq!(leaf.line_id, "10");
        assert_eq!(leaf.created_at.timestamp(), 1_500_000_200);
        assert!(leaf.children.is_empty());
        assert_eq!(root.children[0].id, "mid");
        assert_eq!(root.thread_size(), 3);
    }

    #[test]
    fn missing_children_means_empty_list() {
        let value = json!({
            "id": "solo",
            "author": author("bob"),
            "created": 0,
            "text": "alone",
            "line_id": "1",
        });
        let comment = Comment::from_value(&value).unwrap();
        assert!(comment.children.is_empty());
    }

    #[test]
    fn preserves_sibling_order() {
        let value = json!({
            "id": "r",
            "author": author("a"),
            "text": "",
            "line_id": "1",
            "children": [
                { "id": "c1", "author": author("a"), "text": "1", "line_id": "1" },
                { "id": "c2", "author": author("a"), "text": "2", "line_id": "1" },
                { "id": "c3", "author": author("a"), "text": "3", "line_id": "1" },
            ],
        });
        let comment = Comment::from_value(&value).unwrap();
        let ids: Vec<&str> = comment.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn rejects_children_that_are_not_an_array() {
        let value = json!({
            "id": "r",
            "author": author("a"),
            "text": "",
            "line_id": "1",
            "children": "nope",
        });
        assert!(matches!(
            Comment::from_value(&value),
            Err(ModelError::MalformedComment(_))
        ));
    }

    /// A single chain whose innermost reply sits `depth` levels below the root.
    fn reply_chain(depth: usize) -> Value {
        let mut value = json!({ "id": "leaf", "author": author("a"), "text": "", "line_id": "1" });
        for level in 0..depth {
            value = json!({
                "id": format!("n{level}"),
                "author": author("a"),
                "text": "",
                "line_id": "1",
                "childs": [value],
            });
        }
        value
    }

    #[test]
    fn rejects_overly_deep_threads() {
        let err = Comment::from_value(&reply_chain(MAX_THREAD_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, ModelError::MalformedComment(ref msg) if msg.contains("deeper")));
    }

    #[test]
    fn deepest_allowed_thread_parses_from_text() {
        let text = json!([reply_chain(MAX_THREAD_DEPTH)]).to_string();
        let forest = CommentForest::from_json(&text).unwrap();
        assert_eq!(forest.total(), MAX_THREAD_DEPTH + 1);
    }

    #[test]
    fn too_deep_thread_from_text_is_a_depth_error() {
        let text = json!([reply_chain(MAX_THREAD_DEPTH + 1)]).to_string();
        let err = CommentForest::from_json(&text).unwrap_err();
        assert!(matches!(err, ModelError::MalformedComment(ref msg) if msg.contains("deeper")));
    }

    #[test]
    fn forest_groups_threads_by_line() {
        let forest = CommentForest::from_value(&json!([
            { "id": "1", "author": author("a"), "text": "x", "line_id": "7",
              "children": [{ "id": "2", "author": author("b"), "text": "y", "line_id": "7" }] },
            { "id": "3", "author": author("a"), "text": "z", "line_id": "9" },
            { "id": "4", "author": author("c"), "text": "w", "line_id": "7" },
        ]))
        .unwrap();

        assert_eq!(forest.total(), 4);
        let by_line = forest.by_line();
        assert_eq!(by_line["7"].len(), 2);
        assert_eq!(by_line["9"][0].id, "3");
    }

    #[test]
    fn null_forest_is_empty() {
        let forest = CommentForest::from_value(&Value::Null).unwrap();
        assert!(forest.is_empty());
    }
}
