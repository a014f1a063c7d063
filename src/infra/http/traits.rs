use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Raw answer from the review service, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercased.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// The request never produced a response (DNS, refused connection, timeout...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("No response from server: {0}")]
    NoResponse(String),
}

/// Transport used by the session and review services.
///
/// Implementations resolve `path` against their own base URL and attach the
/// default `Authorization` credential, when one is installed, to every request.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError>;

    async fn post(&self, path: &str, body: Option<Value>) -> Result<HttpResponse, TransportError>;

    /// Installs or clears the default `Authorization` header.
    fn set_authorization(&self, token: Option<&str>);

    fn authorization(&self) -> Option<String>;
}
