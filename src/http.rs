//! Transport primitives for Graph API calls.
//!
//! The module exposes [`HttpTransport`] as the SDK's only dependency on an HTTP stack: the
//! dispatcher hands it a fully built [`TransportRequest`] and receives the raw status + body
//! back, or a [`TransportError`] on network/protocol failure. Timeouts and TLS verification are
//! the transport's concern, configured once from [`HttpConfig`](crate::config::HttpConfig).

#[cfg(feature = "reqwest")] use crate::config::HttpConfig;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
// self
use crate::{_prelude::*, error::TransportError};

/// HTTP methods the Graph API surface uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// Idempotent read; the only method eligible for response caching.
	Get,
	/// Form-encoded write.
	Post,
	/// Form-encoded delete.
	Delete,
}
impl Method {
	/// Returns the wire label for the method.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// A fully built outbound request: method, URL with query attached, optional form body.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Request URL including any query parameters.
	pub url: Url,
	/// Form-encoded body fields; empty means no body.
	pub form: BTreeMap<String, String>,
}

/// Raw response as seen on the wire.
#[derive(Clone, Debug)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing Graph API requests.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared behind `Arc` across
/// dispatcher clones, and must respect their configured connect/read timeouts so no call blocks
/// indefinitely. They never interpret bodies or statuses; classification is the dispatcher's job.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes the request, returning the raw status + body or a transport-level failure.
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a client honoring the configured timeouts and TLS verification flag.
	pub fn from_config(http: &HttpConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder()
			.timeout(std::time::Duration::from_secs(http.timeout_secs))
			.connect_timeout(std::time::Duration::from_secs(http.connect_timeout_secs));

		if !http.verify_tls {
			builder = builder.danger_accept_invalid_certs(true);
		}

		Ok(Self(builder.build()?))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = client.request(method, request.url);

			if !request.form.is_empty() {
				builder = builder.form(&request.form);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(TransportResponse { status, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn method_labels_match_the_wire() {
		assert_eq!(Method::Get.as_str(), "GET");
		assert_eq!(Method::Post.as_str(), "POST");
		assert_eq!(Method::Delete.to_string(), "DELETE");
	}
}
