//! Rust's batteries-included social graph SDK - HMAC-trusted signed requests, cache-smart token
//! brokering, and transport-aware request dispatch in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod obs;
pub mod signed;
pub mod token;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		cache::{CacheStore, MemoryCache},
		config::Config,
		dispatch::Dispatcher,
		http::ReqwestTransport,
		token::TokenBroker,
	};

	/// Dispatcher type alias used by reqwest-backed integration tests.
	pub type ReqwestTestDispatcher = Dispatcher<ReqwestTransport>;
	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = TokenBroker<ReqwestTransport>;

	/// App identifier shared by test fixtures.
	pub const TEST_APP_ID: &str = "138071234567890";
	/// App secret shared by test fixtures.
	pub const TEST_APP_SECRET: &str = "test-app-secret";

	/// Builds a configuration whose graph and OAuth base URLs both point at the mock server.
	pub fn test_config(base_url: &str) -> Config {
		Config::builder(TEST_APP_ID, TEST_APP_SECRET)
			.graph_base_url(base_url)
			.oauth_base_url(base_url)
			.redirect_uri("https://example.com/callback")
			.build()
			.expect("Test configuration should build successfully.")
	}

	/// Constructs a [`Dispatcher`] backed by an in-memory cache and the reqwest transport used
	/// across integration tests.
	pub fn build_test_dispatcher(config: Config) -> (ReqwestTestDispatcher, Arc<MemoryCache>) {
		let cache_backend = Arc::new(MemoryCache::default());
		let cache: Arc<dyn CacheStore> = cache_backend.clone();
		let dispatcher = Dispatcher::from_config(Arc::new(config), cache)
			.expect("Test dispatcher should build successfully.");

		(dispatcher, cache_backend)
	}

	/// Constructs a [`TokenBroker`] on top of [`build_test_dispatcher`].
	pub fn build_test_broker(config: Config) -> (ReqwestTestBroker, Arc<MemoryCache>) {
		let (dispatcher, cache_backend) = build_test_dispatcher(config);

		(TokenBroker::new(dispatcher), cache_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
#[cfg(test)] use graph_sdk as _;
