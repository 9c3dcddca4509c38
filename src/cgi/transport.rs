//! Network transport for CGI commands.

use std::future::Future;

use reqwest::Client;
use thiserror::Error;

use super::endpoint::{Endpoint, REQUEST_TIMEOUT};
use crate::error::Result;

/// Why a request never produced a body.
///
/// The engine reports all of these as `ResultCode::Unavailable`; the variants
/// only exist so log lines say what actually went wrong.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Request(e)
        }
    }
}

/// Sends a fully built command URL and returns the raw response body.
pub trait Transport: Send + Sync {
    fn send(&self, url: &str) -> impl Future<Output = std::result::Result<Vec<u8>, TransportError>> + Send;
}

/// HTTP(S) transport backed by reqwest.
///
/// Every request is bounded by [`REQUEST_TIMEOUT`]. When the endpoint allows
/// it, certificate and hostname checks are disabled so self-signed camera
/// certificates are accepted.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport for the given endpoint.
    ///
    /// # Errors
    /// Returns `AppError::Http` if the TLS backend cannot be initialised.
    pub fn new(endpoint: &Endpoint) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(endpoint.accept_invalid_certs())
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, url: &str) -> impl Future<Output = std::result::Result<Vec<u8>, TransportError>> + Send {
        let request = self.client.get(url);
        async move {
            let response = request.send().await?.error_for_status()?;
            let body = response.bytes().await?;
            Ok(body.to_vec())
        }
    }
}
