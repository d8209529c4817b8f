//! Immutable SDK configuration and its validating builder.
//!
//! The configuration is constructed once at startup and passed explicitly into
//! [`Dispatcher`](crate::dispatch::Dispatcher) and [`TokenBroker`](crate::token::TokenBroker);
//! there is no ambient lookup. [`ConfigBuilder`] deserializes from config files, so file-driven
//! setups funnel through the same validation as programmatic ones.

// self
use crate::{_prelude::*, error::ConfigError};

/// Validated, immutable SDK configuration.
#[derive(Clone)]
pub struct Config {
	/// OAuth application identifier.
	pub app_id: String,
	/// OAuth application secret; also keys signed-request verification.
	pub app_secret: String,
	/// Versioned namespace segment selecting Graph API behavior (e.g. `v18.0`).
	pub graph_version: String,
	/// Base URL for Graph API calls.
	pub graph_base_url: Url,
	/// Base URL for the user-facing OAuth authorize dialog.
	pub oauth_base_url: Url,
	/// Permissions requested when the caller supplies none.
	pub default_permissions: Vec<String>,
	/// Redirect URI registered with the platform; may be empty for app-only setups.
	pub redirect_uri: String,
	/// HTTP transport settings.
	pub http: HttpConfig,
	/// Request/response logging settings.
	pub logging: LoggingConfig,
	/// GET-response caching settings.
	pub cache: CacheConfig,
}
impl Config {
	/// Returns a builder seeded with the provided app credentials.
	pub fn builder(app_id: impl Into<String>, app_secret: impl Into<String>) -> ConfigBuilder {
		ConfigBuilder { app_id: app_id.into(), app_secret: app_secret.into(), ..Default::default() }
	}
}
impl Debug for Config {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Config")
			.field("app_id", &self.app_id)
			.field("app_secret", &"<redacted>")
			.field("graph_version", &self.graph_version)
			.field("graph_base_url", &self.graph_base_url.as_str())
			.field("oauth_base_url", &self.oauth_base_url.as_str())
			.field("default_permissions", &self.default_permissions)
			.field("redirect_uri", &self.redirect_uri)
			.field("http", &self.http)
			.field("logging", &self.logging)
			.field("cache", &self.cache)
			.finish()
	}
}

/// HTTP transport settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
	/// Overall request timeout in seconds.
	pub timeout_secs: u64,
	/// Connection establishment timeout in seconds.
	pub connect_timeout_secs: u64,
	/// Whether TLS certificates are verified. Disable for local mock servers only.
	pub verify_tls: bool,
}
impl Default for HttpConfig {
	fn default() -> Self {
		Self { timeout_secs: 30, connect_timeout_secs: 10, verify_tls: true }
	}
}

/// Request/response logging settings.
///
/// Emission additionally requires the `tracing` crate feature; routing to a sink is the
/// subscriber's concern.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// Emits structured request/response/error records when enabled.
	pub enabled: bool,
}

/// GET-response caching settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
	/// Serves idempotent GET responses from the cache when enabled.
	pub enabled: bool,
	/// Time-to-live for cached GET responses, in seconds.
	pub ttl_secs: u64,
}
impl CacheConfig {
	/// Returns the TTL as a duration.
	pub fn ttl(&self) -> Duration {
		Duration::seconds(self.ttl_secs.min(i64::MAX as u64) as i64)
	}
}
impl Default for CacheConfig {
	fn default() -> Self {
		Self { enabled: true, ttl_secs: 3_600 }
	}
}

/// Builder for [`Config`] values.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ConfigBuilder {
	/// OAuth application identifier.
	pub app_id: String,
	/// OAuth application secret.
	pub app_secret: String,
	/// Graph version segment; defaults to `v18.0`.
	pub graph_version: String,
	/// Graph base URL; defaults to `https://graph.facebook.com`.
	pub graph_base_url: String,
	/// OAuth dialog base URL; defaults to `https://www.facebook.com/dialog/oauth`.
	pub oauth_base_url: String,
	/// Default permission set; defaults to `public_profile` + `email`.
	pub default_permissions: Vec<String>,
	/// Redirect URI; empty by default.
	pub redirect_uri: String,
	/// HTTP transport settings.
	pub http: HttpConfig,
	/// Logging settings.
	pub logging: LoggingConfig,
	/// Caching settings.
	pub cache: CacheConfig,
}
impl ConfigBuilder {
	/// Overrides the graph version segment.
	pub fn graph_version(mut self, version: impl Into<String>) -> Self {
		self.graph_version = version.into();

		self
	}

	/// Overrides the graph base URL.
	pub fn graph_base_url(mut self, url: impl Into<String>) -> Self {
		self.graph_base_url = url.into();

		self
	}

	/// Overrides the OAuth dialog base URL.
	pub fn oauth_base_url(mut self, url: impl Into<String>) -> Self {
		self.oauth_base_url = url.into();

		self
	}

	/// Overrides the default permission set.
	pub fn default_permissions<I>(mut self, permissions: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		self.default_permissions = permissions.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
		self.redirect_uri = uri.into();

		self
	}

	/// Overrides the HTTP transport settings.
	pub fn http(mut self, http: HttpConfig) -> Self {
		self.http = http;

		self
	}

	/// Overrides the logging settings.
	pub fn logging(mut self, logging: LoggingConfig) -> Self {
		self.logging = logging;

		self
	}

	/// Overrides the caching settings.
	pub fn cache(mut self, cache: CacheConfig) -> Self {
		self.cache = cache;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<Config, ConfigError> {
		if self.app_id.is_empty() {
			return Err(ConfigError::MissingAppId);
		}
		if self.app_secret.is_empty() {
			return Err(ConfigError::MissingAppSecret);
		}
		if self.graph_version.is_empty() {
			return Err(ConfigError::MissingGraphVersion);
		}

		let graph_base_url = Url::parse(&self.graph_base_url)
			.map_err(|e| ConfigError::InvalidBaseUrl { which: "graph", source: e })?;
		let oauth_base_url = Url::parse(&self.oauth_base_url)
			.map_err(|e| ConfigError::InvalidBaseUrl { which: "oauth", source: e })?;

		if !self.redirect_uri.is_empty() {
			Url::parse(&self.redirect_uri)
				.map_err(|e| ConfigError::InvalidRedirect { source: e })?;
		}

		Ok(Config {
			app_id: self.app_id,
			app_secret: self.app_secret,
			graph_version: self.graph_version,
			graph_base_url,
			oauth_base_url,
			default_permissions: self.default_permissions,
			redirect_uri: self.redirect_uri,
			http: self.http,
			logging: self.logging,
			cache: self.cache,
		})
	}
}
impl Default for ConfigBuilder {
	fn default() -> Self {
		Self {
			app_id: String::new(),
			app_secret: String::new(),
			graph_version: "v18.0".into(),
			graph_base_url: "https://graph.facebook.com".into(),
			oauth_base_url: "https://www.facebook.com/dialog/oauth".into(),
			default_permissions: vec!["public_profile".into(), "email".into()],
			redirect_uri: String::new(),
			http: HttpConfig::default(),
			logging: LoggingConfig::default(),
			cache: CacheConfig::default(),
		}
	}
}
