// self
use crate::{_prelude::*, http::Method, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by SDK calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("graph_sdk.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits the pre-request record when logging is enabled.
///
/// The query string is withheld because it carries access tokens.
pub fn log_request(enabled: bool, method: Method, url: &Url) {
	#[cfg(feature = "tracing")]
	{
		if enabled {
			tracing::info!(
				method = method.as_str(),
				host = url.host_str().unwrap_or_default(),
				path = url.path(),
				"Graph API request.",
			);
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (enabled, method, url);
	}
}

/// Emits the post-response record when logging is enabled.
pub fn log_response(enabled: bool, status: u16) {
	#[cfg(feature = "tracing")]
	{
		if enabled {
			tracing::info!(status, "Graph API response.");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (enabled, status);
	}
}

/// Emits the failure record when logging is enabled.
pub fn log_error(enabled: bool, message: &str, code: i64) {
	#[cfg(feature = "tracing")]
	{
		if enabled {
			tracing::error!(error = message, code, "Graph API error.");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (enabled, message, code);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::obs::CallKind;

	#[test]
	fn call_span_noop_without_tracing() {
		// Compile-time smoke test ensures the span exists even when tracing is disabled.
		let _span = CallSpan::new(CallKind::AppToken, "test");
	}

	#[test]
	fn log_helpers_noop_when_disabled() {
		let url = Url::parse("https://graph.facebook.com/v18.0/me?access_token=secret")
			.expect("URL fixture should parse.");

		log_request(false, Method::Get, &url);
		log_response(false, 200);
		log_error(false, "nothing happened", 0);
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(CallKind::Dispatch, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
