//! Transport primitives for token exchanges and resource calls.
//!
//! [`TokenHttpClient`] is the acquirer's transport and [`DownstreamClient`] the executor's.
//! [`ReqwestHttpClient`] implements both over one connection pool.

pub mod resource;

pub use resource::*;

// std
#[cfg(feature = "reqwest")] use std::time::Duration as StdDuration;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError};
#[cfg(feature = "reqwest")] use oauth2::{HttpRequest, HttpResponse};
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransportError};

/// Transport used by the token acquirer.
///
/// `oauth2` only reports *that* an error body failed to parse, not the status it came with, so
/// every token request runs through a handle bound to a fresh [`StatusSlot`] that the handle
/// fills once response headers arrive.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Handle passed to `oauth2`'s `request_async`.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle that records the response status into `slot`.
	fn observed(&self, slot: StatusSlot) -> Self::Handle;
}

/// Shared cell holding the HTTP status of the last token endpoint response.
#[derive(Clone, Debug, Default)]
pub struct StatusSlot(Arc<Mutex<Option<u16>>>);
impl StatusSlot {
	/// Records `status`, replacing any earlier value.
	pub fn record(&self, status: u16) {
		*self.0.lock() = Some(status);
	}

	/// Removes and returns the recorded status.
	pub fn take(&self) -> Option<u16> {
		self.0.lock().take()
	}
}

/// [`ReqwestClient`] wrapper serving both token and resource calls.
///
/// Token endpoints answer directly, so clients passed to [`with_client`](Self::with_client)
/// should not follow redirects.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps a preconfigured client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with redirects disabled and the given per-request timeout.
	pub fn from_settings(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.timeout(timeout)
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = ObservedReqwest;
	type TransportError = ReqwestError;

	fn observed(&self, slot: StatusSlot) -> Self::Handle {
		ObservedReqwest { client: self.0.clone(), slot }
	}
}
#[cfg(feature = "reqwest")]
impl DownstreamClient for ReqwestHttpClient {
	fn send(&self, request: ResourceRequest) -> DownstreamFuture<'_> {
		Box::pin(async move {
			let ResourceRequest { method, url, headers, body } = request;
			let mut builder = self.0.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(ResourceResponse { status, headers, body })
		})
	}
}

/// Token request handle produced by [`ReqwestHttpClient::observed`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ObservedReqwest {
	client: ReqwestClient,
	slot: StatusSlot,
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ObservedReqwest {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			let request = request.try_into().map_err(Box::new)?;
			let response = self.client.execute(request).await.map_err(Box::new)?;
			let status = response.status();

			self.slot.record(status.as_u16());

			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(Box::new)?;
			let mut converted = HttpResponse::new(body.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}
