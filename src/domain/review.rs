use super::comment::CommentForest;
use super::diff::DiffFile;
use super::error::ModelError;
use super::identity::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identifier of a review on the server.
pub type ReviewId = String;

fn unix_seconds<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = i64::deserialize(deserializer)?;
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| serde::de::Error::custom(format!("timestamp {seconds} out of range")))
}

/// Review summary as shown in the incoming/outgoing lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub accepted: bool,
    pub owner: Identity,
    #[serde(default)]
    pub reviewers: Vec<Identity>,
    #[serde(default)]
    pub comments_count: u32,
    #[serde(default)]
    pub revisions_count: u32,
    #[serde(deserialize_with = "unix_seconds")]
    pub updated: DateTime<Utc>,
}

impl Review {
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(|err| ModelError::MalformedReview(err.to_string()))
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }
}

/// Everything a review page needs: summary, diff and comment threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReply {
    pub info: Review,
    pub diff: DiffFile,
    pub comments: CommentForest,
}

impl DiffReply {
    pub fn from_value(mut value: Value) -> Result<Self, ModelError> {
        let info = Review::from_value(value.get_mut("info").map(Value::take).unwrap_or_default())?;
        let diff = DiffFile::from_value(value.get_mut("diff").map(Value::take).unwrap_or_default())?;
        let comments = CommentForest::from_value(value.get("comments").unwrap_or(&Value::Null))?;
        Ok(Self {
            info,
            diff,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(name: &str) -> Value {
        json!({ "username": name, "first_name": "F", "last_name": "L" })
    }

    #[test]
    fn parses_review_summary() {
        let review = Review::from_value(json!({
            "id": "r1",
            "name": "Fix parser",
            "closed": false,
            "accepted": false,
            "owner": user("bob"),
            "reviewers": [user("alice")],
            "comments_count": 3,
            "revisions_count": 2,
            "updated": 1_600_000_000,
        }))
        .unwrap();

        assert_eq!(review.owner.username, "bob");
        assert_eq!(review.reviewers.len(), 1);
        assert_eq!(review.updated.timestamp(), 1_600_000_000);
        assert!(review.is_open());
    }

    #[test]
    fn parses_full_diff_reply() {
        let reply = DiffReply::from_value(json!({
            "info": {
                "id": "r1", "name": "n", "owner": user("bob"), "reviewers": [],
                "updated": 0,
            },
            "diff": {
                "filename": "a.txt",
                "groups": [{
                    "old_range": { "from": 0, "to": 0 },
                    "new_range": { "from": 0, "to": 1 },
                    "lines": [{ "type": "insert", "old": null,
                                "new": { "content": "hi", "revision": 1, "id": "L1" } }],
                }],
            },
            "comments": [{ "id": "c1", "author": user("alice"), "created": 5,
                           "text": "why?", "line_id": "L1" }],
        }))
        .unwrap();

        assert_eq!(reply.diff.name, "a.txt");
        assert_eq!(reply.comments.total(), 1);
        assert!(reply.diff.find_line(&reply.comments.roots[0].line_id).is_some());
    }

    #[test]
    fn malformed_diff_is_reported_as_such() {
        let err = DiffReply::from_value(json!({
            "info": { "id": "r1", "name": "n", "owner": user("bob"), "updated": 0 },
            "diff": { "filename": "a", "groups": [{
                "old_range": { "from": 0, "to": 1 },
                "new_range": { "from": 0, "to": 1 },
                "lines": [{ "type": "modified", "old": null, "new": null }],
            }]},
            "comments": [],
        }))
        .unwrap_err();
        assert!(matches!(err, ModelError::MalformedDiff(_)));
    }
}
