//! `reqwest`-backed transport.

use super::traits::{HttpClient, HttpResponse, TransportError};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Default timeout in seconds for requests against the service.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct ReqwestClient {
    base_url: String,
    client: reqwest::Client,
    authorization: RwLock<Option<String>>,
}

impl ReqwestClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            authorization: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<HttpResponse, TransportError> {
        let token = self.authorization.read().clone();
        let request = match token {
            Some(token) => request.header(AUTHORIZATION, token),
            None => request,
        };

        let response = request.send().await.map_err(|err| {
            log::debug!("{} {} failed: {}", method, path, err);
            TransportError::NoResponse(err.to_string())
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|err| TransportError::NoResponse(format!("read body: {err}")))?;

        log::debug!("{} {} -> {}", method, path, status);
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        let request = self.client.get(self.url(path));
        self.send("GET", path, request).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.send("POST", path, request).await
    }

    fn set_authorization(&self, token: Option<&str>) {
        *self.authorization.write() = token.map(str::to_string);
    }

    fn authorization(&self) -> Option<String> {
        self.authorization.read().clone()
    }
}
