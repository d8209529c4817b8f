//! Graph API request pipeline: URL construction, credential injection, response caching, and
//! failure classification.
//!
//! [`Dispatcher`] is the single chokepoint every Graph call funnels through. It owns no state
//! beyond shared handles, so clones are cheap and callers may invoke it concurrently; the only
//! coordination lives in the injected [`CacheStore`] and the app-token singleflight guard. No
//! request is ever retried internally; a single failure surfaces immediately as one typed error.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	cache::CacheStore,
	config::Config,
	error::{ApiError, ConfigError, TransportError},
	http::{HttpTransport, Method, TransportRequest},
	obs::{self, CallKind, CallOutcome, CallSpan},
	token::AppTokenCache,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

const ACCESS_TOKEN_PARAM: &str = "access_token";
const REQUEST_KEY_PREFIX: &str = "graph_request_";
const BODY_PREVIEW_CHARS: usize = 256;

/// Dispatches versioned Graph API requests over an injected transport + cache pair.
pub struct Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	config: Arc<Config>,
	transport: Arc<T>,
	cache: Arc<dyn CacheStore>,
	app_tokens: Arc<AppTokenCache<T>>,
}
impl<T> Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a dispatcher sharing the provided configuration, transport, and cache.
	pub fn new(config: Arc<Config>, transport: Arc<T>, cache: Arc<dyn CacheStore>) -> Self {
		let app_tokens =
			Arc::new(AppTokenCache::new(config.clone(), transport.clone(), cache.clone()));

		Self { config, transport, cache, app_tokens }
	}

	/// Returns the immutable configuration this dispatcher was built with.
	pub fn config(&self) -> &Arc<Config> {
		&self.config
	}

	/// Returns the shared app-token cache backing credential injection.
	pub fn app_tokens(&self) -> &Arc<AppTokenCache<T>> {
		&self.app_tokens
	}

	/// Issues a GET request against the versioned graph.
	pub async fn get(&self, endpoint: &str, params: BTreeMap<String, String>) -> Result<Value> {
		self.dispatch(Method::Get, endpoint, params, BTreeMap::new()).await
	}

	/// Issues a form-encoded POST request against the versioned graph.
	pub async fn post(&self, endpoint: &str, form: BTreeMap<String, String>) -> Result<Value> {
		self.dispatch(Method::Post, endpoint, BTreeMap::new(), form).await
	}

	/// Issues a DELETE request against the versioned graph.
	pub async fn delete(&self, endpoint: &str, params: BTreeMap<String, String>) -> Result<Value> {
		self.dispatch(Method::Delete, endpoint, params, BTreeMap::new()).await
	}

	/// Dispatches a request and returns the decoded JSON body.
	///
	/// The pipeline: normalize the endpoint, inject the app access token when the caller
	/// supplied none, consult the cache for idempotent GETs, execute the transport call,
	/// decode the body, surface any remote `error` object, and store cacheable successes.
	pub async fn dispatch(
		&self,
		method: Method,
		endpoint: &str,
		params: BTreeMap<String, String>,
		form: BTreeMap<String, String>,
	) -> Result<Value> {
		const KIND: CallKind = CallKind::Dispatch;

		let span = CallSpan::new(KIND, "dispatch");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.request(method, endpoint, params, form)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn request(
		&self,
		method: Method,
		endpoint: &str,
		mut params: BTreeMap<String, String>,
		form: BTreeMap<String, String>,
	) -> Result<Value> {
		let endpoint = endpoint.trim_start_matches('/');

		if !params.contains_key(ACCESS_TOKEN_PARAM) {
			params.insert(ACCESS_TOKEN_PARAM.into(), self.app_tokens.token().await?);
		}

		let cache_key = request_cache_key(method, endpoint, &params, &form);
		let caching = self.config.cache.enabled && method == Method::Get;

		if caching && let Some(hit) = self.cache.get(&cache_key).await? {
			return Ok(hit);
		}

		let url = build_request_url(
			&self.config.graph_base_url,
			&self.config.graph_version,
			endpoint,
			&params,
		)?;
		let logging = self.config.logging.enabled;

		obs::log_request(logging, method, &url);

		let response = match self.transport.execute(TransportRequest { method, url, form }).await {
			Ok(response) => response,
			Err(e) => {
				let error = transport_failure(method, endpoint, e);

				obs::log_error(logging, &error.message, error.code);

				return Err(error.into());
			},
		};

		obs::log_response(logging, response.status);

		let value = decode_body(response.status, &response.body)?;

		// A decoded `error` object signals failure regardless of the transport status code.
		if let Some(error) = value.get("error") {
			let error = ApiError::from_error_object(error)
				.with_context("endpoint", Value::String(endpoint.to_owned()))
				.with_context("status", Value::from(response.status));

			obs::log_error(logging, &error.message, error.code);

			return Err(error.into());
		}
		if !(200..300).contains(&response.status) {
			let error = ApiError::new(
				format!("Graph API request returned status {}.", response.status),
				0,
			)
			.with_context("endpoint", Value::String(endpoint.to_owned()))
			.with_context("status", Value::from(response.status))
			.with_context("body_preview", Value::String(body_preview(&response.body)));

			obs::log_error(logging, &error.message, error.code);

			return Err(error.into());
		}

		if caching {
			self.cache.put(&cache_key, value.clone(), self.config.cache.ttl()).await?;
		}

		Ok(value)
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestTransport> {
	/// Creates a dispatcher that provisions its own reqwest-backed transport from the
	/// configuration's HTTP settings.
	pub fn from_config(config: Arc<Config>, cache: Arc<dyn CacheStore>) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::from_config(&config.http)?;

		Ok(Self::new(config, Arc::new(transport), cache))
	}
}
impl<T> Clone for Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			cache: self.cache.clone(),
			app_tokens: self.app_tokens.clone(),
		}
	}
}
impl<T> Debug for Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("graph_base_url", &self.config.graph_base_url.as_str())
			.field("graph_version", &self.config.graph_version)
			.field("cache_enabled", &self.config.cache.enabled)
			.finish()
	}
}

/// Builds `{base}/{version}/{endpoint}` with the query attached; leading slashes on the
/// endpoint are already stripped by the caller.
pub(crate) fn build_request_url(
	base: &Url,
	version: &str,
	endpoint: &str,
	params: &BTreeMap<String, String>,
) -> Result<Url, ConfigError> {
	let base = base.as_str().trim_end_matches('/');
	let mut url = Url::parse(&format!("{base}/{version}/{endpoint}"))
		.map_err(|e| ConfigError::InvalidEndpoint { endpoint: endpoint.to_owned(), source: e })?;

	if !params.is_empty() {
		url.query_pairs_mut().extend_pairs(params);
	}

	Ok(url)
}

/// Computes a stable cache key over the full request shape.
///
/// Maps arrive as `BTreeMap`s, so iteration is already sorted and the key is independent of the
/// order in which callers inserted parameters. Each component is length-framed before hashing so
/// distinct shapes can never collide by concatenation.
pub(crate) fn request_cache_key(
	method: Method,
	endpoint: &str,
	params: &BTreeMap<String, String>,
	form: &BTreeMap<String, String>,
) -> String {
	let mut hasher = Sha256::new();

	update_framed(&mut hasher, method.as_str());
	update_framed(&mut hasher, endpoint);

	for map in [params, form] {
		hasher.update((map.len() as u64).to_be_bytes());

		for (key, value) in map {
			update_framed(&mut hasher, key);
			update_framed(&mut hasher, value);
		}
	}

	let digest = hasher.finalize();
	let mut key = String::with_capacity(REQUEST_KEY_PREFIX.len() + digest.len() * 2);

	key.push_str(REQUEST_KEY_PREFIX);

	for byte in digest {
		key.push(char::from_digit((byte >> 4) as u32, 16).unwrap_or('0'));
		key.push(char::from_digit((byte & 0xf) as u32, 16).unwrap_or('0'));
	}

	key
}

fn update_framed(hasher: &mut Sha256, part: &str) {
	hasher.update((part.len() as u64).to_be_bytes());
	hasher.update(part.as_bytes());
}

/// Decodes a response body as JSON, surfacing undecodable bodies as remote API errors rather
/// than empty successes.
pub(crate) fn decode_body(status: u16, body: &[u8]) -> Result<Value> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
		ApiError::new("Graph API returned a body that is not valid JSON.", 0)
			.with_context("status", Value::from(status))
			.with_context("body_preview", Value::String(body_preview(body)))
			.with_source(e)
			.into()
	})
}

pub(crate) fn transport_failure(method: Method, endpoint: &str, source: TransportError) -> ApiError {
	ApiError::new(format!("Graph API request failed: {source}"), 0)
		.with_context("method", Value::String(method.as_str().to_owned()))
		.with_context("endpoint", Value::String(endpoint.to_owned()))
		.with_source(source)
}

fn body_preview(body: &[u8]) -> String {
	String::from_utf8_lossy(body).chars().take(BODY_PREVIEW_CHARS).collect()
}
