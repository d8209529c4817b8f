//! App-token caching and the OAuth token broker surface.
//!
//! [`AppTokenCache`] owns the client-credentials exchange: the app access token is cached for a
//! fixed hour under a key derived from the app ID, and a singleflight guard keeps concurrent
//! cold-start callers from stampeding the OAuth endpoint. [`TokenBroker`] layers the remaining
//! token operations (code exchange, extension, debugging, user + permission lookups, login URL
//! construction, signed-request parsing) on top of the dispatcher.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	cache::CacheStore,
	config::Config,
	dispatch::{self, Dispatcher},
	error::{ApiError, ConfigError},
	http::{HttpTransport, Method, TransportRequest},
	obs::{self, CallKind, CallOutcome, CallSpan},
	signed,
};

const OAUTH_TOKEN_ENDPOINT: &str = "oauth/access_token";
const STATE_LEN: usize = 32;

/// Cache-backed provider of app access tokens.
///
/// The token represents the application itself, not a user; it is obtained via the
/// client-credentials grant against the **unversioned** OAuth endpoint and injected by the
/// dispatcher wherever a caller supplies no token of their own.
pub struct AppTokenCache<T>
where
	T: ?Sized + HttpTransport,
{
	config: Arc<Config>,
	transport: Arc<T>,
	cache: Arc<dyn CacheStore>,
	flight: AsyncMutex<()>,
}
impl<T> AppTokenCache<T>
where
	T: ?Sized + HttpTransport,
{
	/// Fixed TTL for cached app tokens.
	pub const TTL: Duration = Duration::seconds(3_600);

	/// Creates a cache sharing the provided configuration, transport, and store.
	pub fn new(config: Arc<Config>, transport: Arc<T>, cache: Arc<dyn CacheStore>) -> Self {
		Self { config, transport, cache, flight: AsyncMutex::new(()) }
	}

	/// Returns the app access token, fetching and caching it on a miss.
	///
	/// A response without an `access_token` field yields the empty string rather than a local
	/// error; the downstream graph call surfaces the real failure with the platform's own code.
	pub async fn token(&self) -> Result<String> {
		const KIND: CallKind = CallKind::AppToken;

		let span = CallSpan::new(KIND, "app_access_token");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.cached_or_fetch()).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Cache key the token is stored under; deterministic per app ID so distinct apps sharing a
	/// cache backend never collide.
	pub fn cache_key(&self) -> String {
		format!("graph_app_token_{}", self.config.app_id)
	}

	async fn cached_or_fetch(&self) -> Result<String> {
		let key = self.cache_key();
		let store: &dyn CacheStore = self.cache.as_ref();

		if let Some(hit) = store.get(&key).await? {
			return Ok(token_string(&hit));
		}

		// Singleflight: concurrent cold-start callers piggy-back on one exchange.
		let _flight = self.flight.lock().await;
		let value = store.remember(&key, Self::TTL, || self.fetch()).await?;

		Ok(token_string(&value))
	}

	async fn fetch(&self) -> Result<Value> {
		let base = self.config.graph_base_url.as_str().trim_end_matches('/');
		let mut url =
			Url::parse(&format!("{base}/{OAUTH_TOKEN_ENDPOINT}")).map_err(|e| {
				ConfigError::InvalidEndpoint { endpoint: OAUTH_TOKEN_ENDPOINT.into(), source: e }
			})?;

		url.query_pairs_mut().extend_pairs([
			("client_id", self.config.app_id.as_str()),
			("client_secret", self.config.app_secret.as_str()),
			("grant_type", "client_credentials"),
		]);

		let request = TransportRequest { method: Method::Get, url, form: BTreeMap::new() };
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(|e| dispatch::transport_failure(Method::Get, OAUTH_TOKEN_ENDPOINT, e))?;
		let value = dispatch::decode_body(response.status, &response.body)?;
		let token = value.get("access_token").and_then(Value::as_str).unwrap_or_default();

		Ok(Value::String(token.to_owned()))
	}
}
impl<T> Debug for AppTokenCache<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppTokenCache").field("app_id", &self.config.app_id).finish()
	}
}

fn token_string(value: &Value) -> String {
	value.as_str().unwrap_or_default().to_owned()
}

/// Decoded token endpoint response.
///
/// Unknown fields are ignored and a missing `access_token` decodes as empty, mirroring the
/// platform's loosely specified token bodies; error bodies never reach this type because the
/// dispatcher surfaces them first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Issued access token.
	#[serde(default)]
	pub access_token: String,
	/// Token type label, usually `bearer`.
	#[serde(default)]
	pub token_type: Option<String>,
	/// Lifetime in seconds, when the platform reports one.
	#[serde(default)]
	pub expires_in: Option<i64>,
}

/// High-level OAuth operations against the graph platform.
pub struct TokenBroker<T>
where
	T: ?Sized + HttpTransport,
{
	dispatcher: Dispatcher<T>,
}
impl<T> TokenBroker<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a broker on top of an existing dispatcher.
	pub fn new(dispatcher: Dispatcher<T>) -> Self {
		Self { dispatcher }
	}

	/// Returns the dispatcher the broker rides on.
	pub fn dispatcher(&self) -> &Dispatcher<T> {
		&self.dispatcher
	}

	/// Returns the cached app access token, fetching it on a miss.
	pub async fn app_access_token(&self) -> Result<String> {
		self.dispatcher.app_tokens().token().await
	}

	/// Exchanges an authorization code for an access token.
	pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
		let config = self.dispatcher.config();
		let params = BTreeMap::from([
			("client_id".to_owned(), config.app_id.clone()),
			("client_secret".to_owned(), config.app_secret.clone()),
			("redirect_uri".to_owned(), config.redirect_uri.clone()),
			("code".to_owned(), code.to_owned()),
		]);

		token_response(self.dispatcher.get(OAUTH_TOKEN_ENDPOINT, params).await?)
	}

	/// Extends a short-lived user token into a long-lived one.
	pub async fn extend_token(&self, token: &str) -> Result<TokenResponse> {
		let config = self.dispatcher.config();
		let params = BTreeMap::from([
			("grant_type".to_owned(), "fb_exchange_token".to_owned()),
			("client_id".to_owned(), config.app_id.clone()),
			("client_secret".to_owned(), config.app_secret.clone()),
			("fb_exchange_token".to_owned(), token.to_owned()),
		]);

		token_response(self.dispatcher.get(OAUTH_TOKEN_ENDPOINT, params).await?)
	}

	/// Inspects a token via the platform's debug endpoint, authenticated with the app token.
	pub async fn debug_token(&self, token: &str) -> Result<Map<String, Value>> {
		let app_token = self.app_access_token().await?;
		let params = BTreeMap::from([
			("input_token".to_owned(), token.to_owned()),
			("access_token".to_owned(), app_token),
		]);
		let value = self.dispatcher.get("debug_token", params).await?;

		Ok(value.get("data").and_then(Value::as_object).cloned().unwrap_or_default())
	}

	/// Fetches the authenticated user's profile, optionally narrowed to `fields`.
	pub async fn fetch_user(&self, token: &str, fields: &[&str]) -> Result<Value> {
		let mut params = BTreeMap::from([("access_token".to_owned(), token.to_owned())]);

		if !fields.is_empty() {
			params.insert("fields".to_owned(), fields.join(","));
		}

		self.dispatcher.get("me", params).await
	}

	/// Lists the permissions granted to the token's user.
	pub async fn user_permissions(&self, token: &str) -> Result<Vec<Value>> {
		let params = BTreeMap::from([("access_token".to_owned(), token.to_owned())]);
		let value = self.dispatcher.get("me/permissions", params).await?;

		Ok(value.get("data").and_then(Value::as_array).cloned().unwrap_or_default())
	}

	/// Revokes permissions for the token's user; all of them unless `permissions` narrows the
	/// set.
	pub async fn revoke_permissions(&self, token: &str, permissions: &[&str]) -> Result<Value> {
		let mut params = BTreeMap::from([("access_token".to_owned(), token.to_owned())]);

		if !permissions.is_empty() {
			params.insert("permission".to_owned(), permissions.join(","));
		}

		self.dispatcher.delete("me/permissions", params).await
	}

	/// Builds the user-facing OAuth authorize URL; never performs a network call.
	///
	/// Scope falls back to the configured default permissions when `permissions` is empty.
	pub fn login_url(&self, permissions: &[&str], state: Option<&str>) -> Url {
		let config = self.dispatcher.config();
		let scope = if permissions.is_empty() {
			config.default_permissions.join(",")
		} else {
			permissions.join(",")
		};
		let mut url = config.oauth_base_url.clone();

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair("client_id", &config.app_id);
			pairs.append_pair("redirect_uri", &config.redirect_uri);
			pairs.append_pair("scope", &scope);
			pairs.append_pair("response_type", "code");

			if let Some(state) = state {
				pairs.append_pair("state", state);
			}
		}

		url
	}

	/// Validates a platform-signed request against the configured app secret and returns its
	/// payload.
	pub fn parse_signed_request(&self, signed_request: &str) -> Result<Map<String, Value>> {
		signed::verify(signed_request, &self.dispatcher.config().app_secret).map_err(Error::from)
	}
}

impl<T> Clone for TokenBroker<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { dispatcher: self.dispatcher.clone() }
	}
}
impl<T> Debug for TokenBroker<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenBroker").field("dispatcher", &self.dispatcher).finish()
	}
}

/// Generates a random alphanumeric `state` value for the authorize URL.
pub fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}

fn token_response(value: Value) -> Result<TokenResponse> {
	serde_json::from_value(value).map_err(|e| {
		ApiError::new("Token endpoint returned an unexpected shape.", 0).with_source(e).into()
	})
}
