//! Scripted in-memory transport.
//!
//! Replies are registered per method and path. Each call consumes the next
//! scripted reply; the last one keeps answering once the queue is down to it.
//! Unscripted paths answer `404`. Every request is recorded together with the
//! credential that was installed when it was sent.

use super::traits::{HttpClient, HttpResponse, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StubReply {
    result: Result<HttpResponse, TransportError>,
    gate: Option<Arc<Notify>>,
}

impl StubReply {
    pub fn ok(body: Value) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: Value) -> Self {
        Self {
            result: Ok(HttpResponse {
                status,
                headers: HashMap::new(),
                body: body.to_string(),
            }),
            gate: None,
        }
    }

    pub fn no_response() -> Self {
        Self {
            result: Err(TransportError::NoResponse("stubbed network failure".into())),
            gate: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let Ok(response) = &mut self.result {
            response
                .headers
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
        self
    }

    /// Holds the reply back until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[derive(Default)]
pub struct StubHttpClient {
    replies: Mutex<HashMap<(Method, String), VecDeque<StubReply>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    authorization: Mutex<Option<String>>,
}

impl StubHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(&self, path: &str, reply: StubReply) -> &Self {
        self.script(Method::Get, path, reply)
    }

    pub fn on_post(&self, path: &str, reply: StubReply) -> &Self {
        self.script(Method::Post, path, reply)
    }

    fn script(&self, method: Method, path: &str, reply: StubReply) -> &Self {
        self.replies
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    async fn respond(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
            authorization: self.authorization.lock().clone(),
        });

        let reply = {
            let mut replies = self.replies.lock();
            match replies.get_mut(&(method, path.to_string())) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        let Some(reply) = reply else {
            return Ok(HttpResponse {
                status: 404,
                ..Default::default()
            });
        };
        if let Some(gate) = &reply.gate {
            gate.notified().await;
        }
        reply.result
    }
}

#[async_trait]
impl HttpClient for StubHttpClient {
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        self.respond(Method::Get, path, None).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<HttpResponse, TransportError> {
        self.respond(Method::Post, path, body).await
    }

    fn set_authorization(&self, token: Option<&str>) {
        *self.authorization.lock() = token.map(str::to_string);
    }

    fn authorization(&self) -> Option<String> {
        self.authorization.lock().clone()
    }
}
