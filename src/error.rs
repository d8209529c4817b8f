//! SDK-level error types shared across dispatch, token, and signed-request paths.

// self
use crate::_prelude::*;

/// SDK-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical SDK error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Remote Graph API failure (transport faults, error bodies, undecodable bodies).
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Cache-layer failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Signed-request validation failure.
	#[error(transparent)]
	SignedRequest(#[from] crate::signed::SignedRequestError),
}

/// Remote API failure carrying the platform's numeric error code.
///
/// Both decoded `{"error": ...}` bodies and transport-level faults surface through this type so
/// callers deal with a single failure shape. Classification via [`ApiError::kind`] is advisory
/// metadata; the dispatcher never branches on it internally and never retries.
#[derive(Debug, ThisError)]
#[error("Graph API error {code}: {message}")]
pub struct ApiError {
	/// Human-readable failure summary from the platform or the SDK boundary.
	pub message: String,
	/// Platform error code; `0` when the failure carries no code.
	pub code: i64,
	/// Additional structured context (failing endpoint, HTTP status, body preview, ...).
	pub context: Map<String, Value>,
	/// Underlying cause, when the failure wraps a lower-level error.
	#[source]
	pub source: Option<BoxError>,
}
impl ApiError {
	const DEFAULT_MESSAGE: &'static str = "Graph API call failed.";

	/// Creates an error from a message and platform code.
	pub fn new(message: impl Into<String>, code: i64) -> Self {
		Self { message: message.into(), code, context: Map::new(), source: None }
	}

	/// Attaches a context entry.
	pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
		self.context.insert(key.into(), value);

		self
	}

	/// Attaches the underlying cause.
	pub fn with_source(mut self, source: impl 'static + Send + Sync + std::error::Error) -> Self {
		self.source = Some(Box::new(source));

		self
	}

	/// Classifies the error by its platform code.
	pub fn kind(&self) -> ApiErrorKind {
		ApiErrorKind::classify(self.code)
	}

	/// Returns `true` when the code denotes an invalid or expired access token.
	pub fn is_invalid_token(&self) -> bool {
		self.kind() == ApiErrorKind::InvalidToken
	}

	/// Returns `true` when the code denotes missing permissions.
	pub fn is_insufficient_permission(&self) -> bool {
		self.kind() == ApiErrorKind::InsufficientPermission
	}

	/// Returns `true` when the code denotes platform rate limiting.
	pub fn is_rate_limited(&self) -> bool {
		self.kind() == ApiErrorKind::RateLimited
	}

	/// Builds an error from a decoded top-level `error` object.
	pub fn from_error_object(error: &Value) -> Self {
		let message = error
			.get("message")
			.and_then(Value::as_str)
			.unwrap_or(Self::DEFAULT_MESSAGE)
			.to_owned();
		let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
		let context = error.as_object().cloned().unwrap_or_default();

		Self { message, code, context, source: None }
	}
}

/// Advisory classification of a platform error code.
///
/// The taxonomy exists for callers deciding retry/backoff policy; the SDK itself surfaces every
/// failure immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
	/// Access token is invalid, expired, or revoked.
	InvalidToken,
	/// Granted permissions do not cover the attempted operation.
	InsufficientPermission,
	/// The platform throttled the caller.
	RateLimited,
	/// Code does not map to a known category.
	Unclassified,
}
impl ApiErrorKind {
	/// Pure lookup from platform code to category.
	pub const fn classify(code: i64) -> Self {
		match code {
			190 | 104 => Self::InvalidToken,
			200..=204 => Self::InsufficientPermission,
			4 | 17 | 32 | 613 => Self::RateLimited,
			_ => Self::Unclassified,
		}
	}

	/// Returns a stable label suitable for log or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InvalidToken => "invalid_token",
			Self::InsufficientPermission => "insufficient_permission",
			Self::RateLimited => "rate_limited",
			Self::Unclassified => "unclassified",
		}
	}
}
impl Display for ApiErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised by the SDK.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// App identifier was empty.
	#[error("App ID must not be empty.")]
	MissingAppId,
	/// App secret was empty.
	#[error("App secret must not be empty.")]
	MissingAppSecret,
	/// Graph version was empty.
	#[error("Graph version must not be empty.")]
	MissingGraphVersion,
	/// A configured base URL cannot be parsed.
	#[error("The {which} base URL is invalid.")]
	InvalidBaseUrl {
		/// Which base URL failed validation.
		which: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A request endpoint did not form a valid URL against the configured base.
	#[error("Endpoint `{endpoint}` does not form a valid request URL.")]
	InvalidEndpoint {
		/// Offending endpoint string.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO) raised by [`HttpTransport`](crate::http::HttpTransport)
/// implementations. The dispatcher wraps these into [`ApiError`] with request context attached.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the Graph API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the Graph API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn classification_is_total_over_documented_codes() {
		for code in [190, 104] {
			assert_eq!(ApiErrorKind::classify(code), ApiErrorKind::InvalidToken);
		}
		for code in 200..=204 {
			assert_eq!(ApiErrorKind::classify(code), ApiErrorKind::InsufficientPermission);
		}
		for code in [4, 17, 32, 613] {
			assert_eq!(ApiErrorKind::classify(code), ApiErrorKind::RateLimited);
		}
		for code in [0, 1, 100, 205, 614, -7, i64::MAX] {
			assert_eq!(ApiErrorKind::classify(code), ApiErrorKind::Unclassified);
		}
	}

	#[test]
	fn api_error_helpers_follow_the_code() {
		let invalid = ApiError::new("Invalid OAuth access token.", 190);

		assert!(invalid.is_invalid_token());
		assert!(!invalid.is_insufficient_permission());
		assert!(!invalid.is_rate_limited());

		let throttled = ApiError::new("Application request limit reached.", 4);

		assert!(throttled.is_rate_limited());
		assert_eq!(ApiError::new("?", 0).kind(), ApiErrorKind::Unclassified);
	}

	#[test]
	fn from_error_object_reads_platform_fields() {
		let body: Value = serde_json::from_str(
			"{\"message\":\"Invalid OAuth access token.\",\"code\":190,\"fbtrace_id\":\"AbC\"}",
		)
		.expect("Error object fixture should parse.");
		let error = ApiError::from_error_object(&body);

		assert_eq!(error.code, 190);
		assert_eq!(error.message, "Invalid OAuth access token.");
		assert_eq!(error.context.get("fbtrace_id").and_then(Value::as_str), Some("AbC"));
	}

	#[test]
	fn from_error_object_applies_defaults() {
		let error = ApiError::from_error_object(&Value::Object(Map::new()));

		assert_eq!(error.code, 0);
		assert_eq!(error.message, "Graph API call failed.");
		assert_eq!(error.kind(), ApiErrorKind::Unclassified);
	}
}
