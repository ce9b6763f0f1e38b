//! Connection factory, request builder and response envelope.
//!
//! A [`ConnectionFactory`] hands out one [`DockerConnection`] per operation.
//! Opening is lazy and never fails; an unreachable daemon only surfaces when
//! [`RequestBuilder::request`] sends the request. The returned
//! [`DockerResponse`] owns the connection until its body is closed or dropped.

mod error_classification;
mod hyper_connection;
mod response;
mod tls;

#[cfg(test)]
pub(crate) mod testing;


use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use hyper::Method;
use url::form_urlencoded;

use super::endpoint::Endpoint;
use crate::error::EngineError;

pub use hyper_connection::HyperConnectionFactory;
pub use response::{BodyStream, ChunkStream, ConnectionLease, DockerResponse};
pub use tls::TlsSettings;

/// Boxed future type returned by [`DockerConnection::send`].
pub type SendFuture = Pin<Box<dyn Future<Output = Result<DockerResponse, EngineError>> + Send>>;

/// Produces connections to a daemon endpoint.
///
/// This abstraction keeps the dispatcher testable without a live daemon.
pub trait ConnectionFactory: Send + Sync {
    /// Prepare a connection to `endpoint`. Performs no I/O.
    fn open_connection(&self, endpoint: &Endpoint) -> Box<dyn DockerConnection>;
}

/// A single-use connection able to carry one request.
pub trait DockerConnection: Send {
    /// Send the request and resolve once response headers have arrived.
    fn send(self: Box<Self>, request: DockerRequest) -> SendFuture;
}

/// A fully built request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
}

impl DockerRequest {
    fn new() -> Self {
        Self {
            method: Method::GET,
            path: String::from("/"),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// The HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value of the query parameter `name`.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Headers in insertion order. Duplicates are kept.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of the header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The request body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Path plus URL-encoded query string, as sent on the request line.
    #[must_use]
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish();
        format!("{}?{query}", self.path)
    }
}

/// Conversion of a scalar into its query-string form.
///
/// Booleans encode as `1` and `0`, matching the daemon's convention.
pub trait QueryValue {
    /// The encoded value, before URL escaping.
    fn to_query_value(&self) -> String;
}

impl QueryValue for bool {
    fn to_query_value(&self) -> String {
        String::from(if *self { "1" } else { "0" })
    }
}

impl QueryValue for str {
    fn to_query_value(&self) -> String {
        self.to_owned()
    }
}

impl QueryValue for String {
    fn to_query_value(&self) -> String {
        self.clone()
    }
}

impl<T: QueryValue + ?Sized> QueryValue for &T {
    fn to_query_value(&self) -> String {
        (**self).to_query_value()
    }
}

macro_rules! display_query_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl QueryValue for $ty {
                fn to_query_value(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_query_value!(i32, i64, u16, u32, u64);

/// Fluent builder for one request over one connection.
///
/// Consumes itself on every call so a request cannot change after it has
/// been handed to [`RequestBuilder::request`].
#[must_use = "a request builder does nothing until `request` is awaited"]
pub struct RequestBuilder {
    connection: Box<dyn DockerConnection>,
    request: DockerRequest,
}

impl RequestBuilder {
    /// Start a `GET /` request over `connection`.
    pub fn new(connection: Box<dyn DockerConnection>) -> Self {
        Self {
            connection,
            request: DockerRequest::new(),
        }
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.request.method = method;
        self
    }

    /// Set the request path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.request.path = path.into();
        self
    }

    /// Append a query parameter. Parameters with an empty name are ignored.
    pub fn query(mut self, name: &str, value: impl QueryValue) -> Self {
        if !name.is_empty() {
            self.request
                .query
                .push((name.to_owned(), value.to_query_value()));
        }
        self
    }

    /// Append a query parameter only when `value` is present.
    ///
    /// An absent value leaves the key out of the query string entirely.
    pub fn query_if_set<V: QueryValue>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(present) => self.query(name, present),
            None => self,
        }
    }

    /// Append one header.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.request.headers.push((name.to_owned(), value.into()));
        self
    }

    /// Append several headers in order.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.request.headers.extend(
            headers
                .into_iter()
                .map(|(name, value)| (name.into(), value.into())),
        );
        self
    }

    /// Set the request body.
    pub fn entity(mut self, body: impl Into<Bytes>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    /// Send the request and wait for the response headers.
    ///
    /// # Errors
    ///
    /// Returns a transport-class `EngineError` when the daemon cannot be
    /// reached or the exchange fails before headers arrive.
    pub async fn request(self) -> Result<DockerResponse, EngineError> {
        tracing::debug!(
            method = %self.request.method,
            path = %self.request.path,
            "sending engine request"
        );
        self.connection.send(self.request).await
    }
}
