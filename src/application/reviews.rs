//! Review listing, diff loading and discussion calls.

use crate::domain::{ApiError, DiffReply, Identity, Review};
use crate::infra::http::HttpClient;
use crate::infra::http::classify;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Which side of the review relationship to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewInbox {
    /// Reviews requested from the current user.
    Incoming,
    /// Reviews the current user opened.
    Outgoing,
}

impl ReviewInbox {
    fn path(self) -> &'static str {
        match self {
            Self::Incoming => "/reviews/incoming",
            Self::Outgoing => "/reviews/outgoing",
        }
    }
}

/// Appends URL-encoded query parameters to `path`.
fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    match reqwest::Url::parse_with_params(&format!("http://api.invalid{path}"), params) {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        Err(err) => {
            log::warn!("Could not encode query for {}: {}", path, err);
            path.to_string()
        }
    }
}

#[derive(Clone)]
pub struct ReviewsService {
    http: Arc<dyn HttpClient>,
}

impl ReviewsService {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    pub async fn load_incoming_reviews(&self) -> Result<Vec<Review>, ApiError> {
        self.load_reviews(ReviewInbox::Incoming).await
    }

    pub async fn load_outgoing_reviews(&self) -> Result<Vec<Review>, ApiError> {
        self.load_reviews(ReviewInbox::Outgoing).await
    }

    pub async fn load_reviews(&self, inbox: ReviewInbox) -> Result<Vec<Review>, ApiError> {
        let data = classify::get_data_value(self.http.as_ref(), inbox.path()).await?;
        let items = match data {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                log::warn!("Expected a review list, got {}", other);
                return Err(ApiError::Server);
            }
        };
        items
            .into_iter()
            .map(|item| Review::from_value(item).map_err(ApiError::from))
            .collect()
    }

    pub async fn create_review(
        &self,
        name: &str,
        reviewers: &str,
        file_name: &str,
        file_content: &str,
    ) -> Result<(), ApiError> {
        classify::post_json(
            self.http.as_ref(),
            "/reviews/new",
            json!({
                "name": name,
                "reviewers": reviewers,
                "file_name": file_name,
                "file_content": file_content,
            }),
        )
        .await?;
        log::info!("Created review {}", name);
        Ok(())
    }

    /// Renames the review, replaces its reviewers and optionally uploads a
    /// new revision of the file.
    pub async fn update_review(
        &self,
        review_id: &str,
        name: &str,
        reviewers: &str,
        new_revision: Option<&str>,
    ) -> Result<(), ApiError> {
        let mut body = Map::new();
        body.insert("name".into(), json!(name));
        body.insert("reviewers".into(), json!(reviewers));
        if let Some(content) = new_revision {
            body.insert("new_revision".into(), json!(content));
        }
        classify::post_json(
            self.http.as_ref(),
            &format!("/reviews/{review_id}/update"),
            Value::Object(body),
        )
        .await?;
        Ok(())
    }

    pub async fn search_reviewers(&self, query: &str) -> Result<Vec<Identity>, ApiError> {
        let path = with_query("/users/search", &[("query", query)]);
        let users: Option<Vec<Identity>> = classify::get_data(self.http.as_ref(), &path).await?;
        Ok(users.unwrap_or_default())
    }

    /// Loads the review page.
    ///
    /// `revisions` are 1-based `(start, end)` revision numbers; the server
    /// counts from zero. Without them the server picks the latest pair.
    pub async fn load_diff(
        &self,
        review_id: &str,
        revisions: Option<(u32, u32)>,
    ) -> Result<DiffReply, ApiError> {
        let base = format!("/reviews/{review_id}");
        let path = match revisions {
            Some((start, end)) if start > 0 && end > 0 => {
                let start = (start - 1).to_string();
                let end = (end - 1).to_string();
                with_query(&base, &[("start_rev", start.as_str()), ("end_rev", end.as_str())])
            }
            _ => base,
        };
        let data = classify::get_data_value(self.http.as_ref(), &path).await?;
        DiffReply::from_value(data).map_err(ApiError::from)
    }

    /// Posts a comment on a line, or a reply when `parent_id` is given.
    pub async fn add_comment(
        &self,
        review_id: &str,
        line_id: &str,
        text: &str,
        parent_id: Option<&str>,
    ) -> Result<(), ApiError> {
        let mut body = Map::new();
        body.insert("review_id".into(), json!(review_id));
        body.insert("line_id".into(), json!(line_id));
        body.insert("text".into(), json!(text));
        if let Some(parent) = parent_id.filter(|parent| !parent.is_empty()) {
            body.insert("parent".into(), json!(parent));
        }
        classify::post_json(self.http.as_ref(), "/comments/add", Value::Object(body)).await?;
        Ok(())
    }

    pub async fn accept_review(&self, review_id: &str) -> Result<(), ApiError> {
        classify::check(
            self.http
                .get(&format!("/reviews/{review_id}/accept"))
                .await,
        )?;
        Ok(())
    }

    pub async fn decline_review(&self, review_id: &str) -> Result<(), ApiError> {
        classify::check(
            self.http
                .get(&format!("/reviews/{review_id}/decline"))
                .await,
        )?;
        Ok(())
    }
}
