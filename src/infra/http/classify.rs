//! Turns raw transport results into [`ApiError`]s.
//!
//! Every call against the service shares one error taxonomy: no response at
//! all, a structured `client_message` from the server, or anything else.

use super::traits::{HttpClient, HttpResponse, TransportError};
use crate::domain::ApiError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    client_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Classifies a non-success response.
pub fn error_from_response(response: &HttpResponse) -> ApiError {
    if response.status == 0 {
        return ApiError::Network;
    }
    match response.json::<ErrorBody>() {
        Ok(ErrorBody {
            client_message: Some(message),
        }) if !message.is_empty() => ApiError::Rejected(message),
        _ => ApiError::Server,
    }
}

/// Passes successful responses through and classifies everything else.
pub fn check(result: Result<HttpResponse, TransportError>) -> Result<HttpResponse, ApiError> {
    match result {
        Ok(response) if response.is_success() => Ok(response),
        Ok(response) => {
            let err = error_from_response(&response);
            log::debug!("Request failed with status {}: {}", response.status, err);
            Err(err)
        }
        Err(TransportError::NoResponse(reason)) => {
            log::debug!("Request got no response: {}", reason);
            Err(ApiError::Network)
        }
    }
}

/// Extracts the `data` member of a successful response.
pub fn data<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    response
        .json::<Envelope<T>>()
        .map(|envelope| envelope.data)
        .map_err(|err| {
            log::warn!("Unexpected response body: {}", err);
            ApiError::Server
        })
}

pub async fn get_data<T: DeserializeOwned>(
    client: &dyn HttpClient,
    path: &str,
) -> Result<T, ApiError> {
    let response = check(client.get(path).await)?;
    data(&response)
}

pub async fn get_data_value(client: &dyn HttpClient, path: &str) -> Result<Value, ApiError> {
    get_data::<Value>(client, path).await
}

pub async fn post_json(
    client: &dyn HttpClient,
    path: &str,
    body: Value,
) -> Result<HttpResponse, ApiError> {
    check(client.post(path, Some(body)).await)
}
