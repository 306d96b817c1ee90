//! HTTP client construction and outcome classification.
//!
//! # Responsibility
//! - Build the shared `reqwest` client with the fixed remote timeout.
//! - Convert transport failures and HTTP statuses into `RemoteError`.
//!
//! # Invariants
//! - Status mapping: 2xx parse body (parse failure is `Serialization`),
//!   408 `RequestTimeout`, 429 `TooManyRequests`, 5xx `Server`, anything
//!   else `Unknown`.
//! - Cancellation is not an error: dropping a call future aborts the request
//!   and no `RemoteError` is produced for it.

use crate::error::RemoteError;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::time::{Duration, Instant};

const USER_AGENT: &str = concat!("bookpedia/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by every remote call.
///
/// `timeout` bounds both connection setup and the whole request.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .user_agent(USER_AGENT)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
}

/// Sends `request` and decodes a JSON body of type `T`.
///
/// `endpoint` is a static label used only for log events.
pub async fn safe_call<T: DeserializeOwned>(
    endpoint: &'static str,
    request: RequestBuilder,
) -> Result<T, RemoteError> {
    let started_at = Instant::now();
    let outcome = match request.send().await {
        Ok(response) => response_to_result(response).await,
        Err(err) => Err(classify_transport_error(&err)),
    };

    match &outcome {
        Ok(_) => debug!(
            "event=remote_call module=remote status=ok endpoint={endpoint} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=remote_call module=remote status=error endpoint={endpoint} error_code={} duration_ms={}",
            err.code(),
            started_at.elapsed().as_millis()
        ),
    }
    outcome
}

/// Maps an HTTP response onto the remote taxonomy.
pub async fn response_to_result<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    if status.is_success() {
        let body = response
            .bytes()
            .await
            .map_err(|err| classify_transport_error(&err))?;
        return serde_json::from_slice(&body).map_err(|_| RemoteError::Serialization);
    }
    Err(classify_status(status))
}

pub(crate) fn classify_status(status: StatusCode) -> RemoteError {
    match status.as_u16() {
        408 => RemoteError::RequestTimeout,
        429 => RemoteError::TooManyRequests,
        500..=599 => RemoteError::Server,
        _ => RemoteError::Unknown,
    }
}

pub(crate) fn classify_transport_error(err: &reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::RequestTimeout
    } else if err.is_decode() {
        RemoteError::Serialization
    } else if err.is_connect() && is_address_resolution_failure(err) {
        RemoteError::NoInternet
    } else {
        RemoteError::Unknown
    }
}

// reqwest exposes no dedicated flag for resolver failures; they surface as a
// connect error whose source chain carries the resolver message.
fn is_address_resolution_failure(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(source) = current {
        let message = source.to_string().to_ascii_lowercase();
        if message.contains("dns error")
            || message.contains("failed to lookup address")
            || message.contains("name or service not known")
            || message.contains("no such host")
        {
            return true;
        }
        current = source.source();
    }
    false
}
