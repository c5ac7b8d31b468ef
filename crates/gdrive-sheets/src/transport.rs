//! HTTP transport abstraction.
//!
//! The [`Session`](crate::Session) never talks to the network directly: it
//! builds an [`HttpRequest`] and hands it to a [`Transport`]. The default
//! transport is [`ReqwestTransport`] (feature `reqwest`), which attaches an
//! OAuth bearer token obtained from an [`AccessTokenProvider`].

use std::fmt;

use thiserror::Error;
use url::Url;

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of an outgoing request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Bytes { content_type: String, data: Vec<u8> },
}

impl RequestBody {
    /// Parsed JSON payload, if this is a JSON body
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// A fully-built request, ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub body: RequestBody,
}

/// Raw response of a round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure to complete a round trip (connection, TLS, timeout, token)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(String);

impl TransportError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        TransportError(msg.into())
    }
}

/// Sends requests and returns whatever the server answered.
///
/// Implementations report non-2xx statuses as ordinary responses; only
/// failures to obtain a response at all are errors.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Supplies the bearer token attached to each request
pub trait AccessTokenProvider {
    fn access_token(&self) -> Result<String, TransportError>;
}

/// A fixed access token
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        StaticToken(token.into())
    }
}

impl AccessTokenProvider for StaticToken {
    fn access_token(&self) -> Result<String, TransportError> {
        Ok(self.0.clone())
    }
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use reqwest::blocking::Client;
    use reqwest::header::CONTENT_TYPE;

    use super::{
        AccessTokenProvider, HttpRequest, HttpResponse, Method, RequestBody, Transport,
        TransportError,
    };
    use crate::config::SessionConfig;

    /// [`Transport`] over a blocking `reqwest` client
    pub struct ReqwestTransport {
        client: Client,
        token: Box<dyn AccessTokenProvider>,
    }

    impl ReqwestTransport {
        /// Build a client honoring the timeout and user agent of `config`.
        pub fn new(
            token: impl AccessTokenProvider + 'static,
            config: &SessionConfig,
        ) -> Result<Self, TransportError> {
            let client = Client::builder()
                .timeout(config.timeout)
                .user_agent(config.user_agent.clone())
                .build()
                .map_err(|e| TransportError::new(format!("failed to build HTTP client: {e}")))?;

            Ok(Self {
                client,
                token: Box::new(token),
            })
        }
    }

    impl Transport for ReqwestTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let token = self.token.access_token()?;
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
                Method::Patch => reqwest::Method::PATCH,
                Method::Delete => reqwest::Method::DELETE,
            };

            let builder = self
                .client
                .request(method, request.url.clone())
                .bearer_auth(token);
            let builder = match &request.body {
                RequestBody::Empty => builder,
                RequestBody::Json(value) => builder.json(value),
                RequestBody::Bytes { content_type, data } => builder
                    .header(CONTENT_TYPE, content_type.as_str())
                    .body(data.clone()),
            };

            let response = builder.send().map_err(|e| {
                TransportError::new(format!("{} {} failed: {e}", request.method, request.url))
            })?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .map_err(|e| TransportError::new(format!("failed to read response body: {e}")))?;

            Ok(HttpResponse {
                status,
                body: body.to_vec(),
            })
        }
    }
}
