//! Transport for Azure REST availability checks.
//!
//! The availability check only needs two verbs, so the seam is the small
//! [`RestTransport`] trait. [`AzureRestClient`] implements it with a blocking
//! `reqwest` client authenticated by a bearer token read from
//! `AZURE_ACCESS_TOKEN`. URIs that start with `/` are taken relative to the
//! Azure Resource Manager endpoint.

use crate::constants::{AZURE_ACCESS_TOKEN_ENV, AZURE_MANAGEMENT_URL, HTTP_TIMEOUT};
use crate::core::NamingError;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

impl RestResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Turn a non-2xx response into [`NamingError::Http`].
    ///
    /// # Errors
    ///
    /// When the status is outside 200-299.
    pub fn error_for_status(self, url: &str) -> Result<Self, NamingError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(NamingError::Http {
                url: url.to_string(),
                reason: format!("status {}: {}", self.status, self.body),
            })
        }
    }

    /// Parse the body as JSON; an empty body is `None`.
    ///
    /// # Errors
    ///
    /// When the body is not valid JSON.
    pub fn json(&self) -> Result<Option<Value>, NamingError> {
        if self.body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&self.body).map(Some).map_err(|e| NamingError::Json {
            origin: "REST response".to_string(),
            reason: e.to_string(),
        })
    }
}

/// The two requests the availability check makes.
///
/// Implementations return every completed response, whatever its status; only
/// failures to complete a request are errors.
pub trait RestTransport: Send + Sync {
    /// # Errors
    ///
    /// The request could not be sent or its body could not be read.
    fn get(&self, uri: &str) -> Result<RestResponse, NamingError>;

    /// # Errors
    ///
    /// The request could not be sent or its body could not be read.
    fn post(&self, uri: &str, body: &Value) -> Result<RestResponse, NamingError>;
}

/// [`RestTransport`] over HTTPS to Azure Resource Manager.
pub struct AzureRestClient {
    client: OnceLock<reqwest::blocking::Client>,
    token: Option<String>,
}

impl AzureRestClient {
    /// Client authenticated with the token in `AZURE_ACCESS_TOKEN`, if set.
    pub fn from_env() -> Self {
        Self::with_token(std::env::var(AZURE_ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty()))
    }

    pub const fn with_token(token: Option<String>) -> Self {
        Self {
            client: OnceLock::new(),
            token,
        }
    }

    fn client(&self) -> &reqwest::blocking::Client {
        self.client.get_or_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_default()
        })
    }

    fn send(&self, uri: &str, request: reqwest::blocking::RequestBuilder) -> Result<RestResponse, NamingError> {
        let http_error = |reason: String| NamingError::Http {
            url: uri.to_string(),
            reason,
        };
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().map_err(|e| http_error(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| http_error(e.to_string()))?;
        debug!(uri, status, "REST response");
        Ok(RestResponse { status, body })
    }
}

/// Absolute form of `uri`.
pub fn management_url(uri: &str) -> String {
    if uri.starts_with('/') {
        format!("{AZURE_MANAGEMENT_URL}{uri}")
    } else {
        uri.to_string()
    }
}

impl RestTransport for AzureRestClient {
    fn get(&self, uri: &str) -> Result<RestResponse, NamingError> {
        let url = management_url(uri);
        debug!(url = %url, "GET");
        self.send(&url, self.client().get(&url))
    }

    fn post(&self, uri: &str, body: &Value) -> Result<RestResponse, NamingError> {
        let url = management_url(uri);
        debug!(url = %url, "POST");
        self.send(&url, self.client().post(&url).json(body))
    }
}
