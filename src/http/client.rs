//! Endpoint client
//!
//! Posts a JSON payload to one endpoint and returns the raw body. Only an
//! exact `200 OK` status line counts as success; any other status, 2xx
//! included, is an error. The reason phrase is the one the server sent, so
//! `200 Success` is rejected too.

use anyhow::{Context, Result};
use hyper::ext::ReasonPhrase;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::{CompareError, CompareResult};
use crate::models::RawResponse;

/// The only status line accepted as success
const SUCCESS_STATUS_LINE: &str = "200 OK";

/// Render a status as `<code> <reason>`
///
/// `reason` is the phrase received on the wire. hyper only keeps it when it
/// differs from the canonical one, so `None` falls back to the canonical
/// phrase.
fn status_line(status: StatusCode, reason: Option<&[u8]>) -> String {
    let reason = match reason {
        Some(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        None => status.canonical_reason().map(String::from),
    };

    match reason {
        Some(reason) if !reason.is_empty() => format!("{} {}", status.as_str(), reason),
        _ => status.as_str().to_string(),
    }
}

/// HTTP client shared by every case of a run
#[derive(Clone, Debug)]
pub struct EndpointClient {
    client: Client,
}

impl EndpointClient {
    pub fn builder() -> EndpointClientBuilder {
        EndpointClientBuilder::default()
    }

    /// POST `payload` verbatim to `url`
    pub async fn send(&self, payload: &str, url: &str) -> CompareResult<RawResponse> {
        debug!("Sending POST request to {}", url);

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let reason = response
            .extensions()
            .get::<ReasonPhrase>()
            .map(ReasonPhrase::as_bytes);
        let status = status_line(response.status(), reason);
        debug!("Response from {}: {}", url, status);

        if status != SUCCESS_STATUS_LINE {
            return Err(CompareError::UnexpectedStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(url, &e))?;

        Ok(RawResponse::new(url, body.to_vec()))
    }
}

fn transport_error(url: &str, e: &reqwest::Error) -> CompareError {
    let message = if e.is_timeout() {
        "timed out".to_string()
    } else if e.is_connect() {
        format!("connection refused: {e}")
    } else {
        e.to_string()
    };

    CompareError::Transport {
        url: url.to_string(),
        message,
    }
}

/// Builder for [`EndpointClient`]
#[derive(Clone, Debug, Default)]
pub struct EndpointClientBuilder {
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
}

impl EndpointClientBuilder {
    /// Per-request timeout. Unset means wait indefinitely.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> Result<EndpointClient> {
        let mut builder = Client::builder().danger_accept_invalid_certs(self.accept_invalid_certs);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(EndpointClient { client })
    }
}
