//! Resource-server request and response values plus the [`DownstreamClient`] seam.

// crates.io
use oauth2::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`DownstreamClient::send`].
pub type DownstreamFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ResourceResponse, TransportError>> + 'a + Send>>;

/// Issues HTTP calls against resource servers.
///
/// Implementations return every response that carries a status, including error statuses;
/// only failures that produced no response surface as [`TransportError`].
pub trait DownstreamClient
where
	Self: Send + Sync,
{
	/// Sends the request once.
	fn send(&self, request: ResourceRequest) -> DownstreamFuture<'_>;
}

/// Outgoing resource request. Cloned for the retry after a 401.
#[derive(Clone, Debug)]
pub struct ResourceRequest {
	/// HTTP method.
	pub method: Method,
	/// Target URL.
	pub url: Url,
	/// Request headers. `Authorization` is managed by the executor.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl ResourceRequest {
	/// Creates a request with the given method and no headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Adds a header, replacing any previous value for the same name.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets the request body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}
}

/// Response received from the resource server.
#[derive(Clone, Debug)]
pub struct ResourceResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ResourceResponse {
	/// Creates a response with no headers.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}
