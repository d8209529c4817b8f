//! Cache capability contract and built-in backend for tokens and GET responses.

pub mod memory;

pub use memory::MemoryCache;

// self
use crate::_prelude::*;

/// Boxed future returned by [`CacheStore`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Key-value store with per-entry TTLs.
///
/// The SDK depends only on this interface, never a concrete global. Entries hold JSON values
/// (idempotent GET responses and app tokens); concurrent `get`/`put` on the same key must be
/// atomic, with last-write-wins acceptable on races.
pub trait CacheStore
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, treating expired entries as absent.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<Value>>;

	/// Stores `value` under `key` for `ttl`, replacing any previous entry.
	fn put<'a>(&'a self, key: &'a str, value: Value, ttl: Duration) -> CacheFuture<'a, ()>;
}
impl dyn CacheStore {
	/// Returns the cached value under `key`, or computes, stores, and returns a fresh one.
	pub async fn remember<F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> Result<Value>
	where
		F: Send + FnOnce() -> Fut,
		Fut: Send + Future<Output = Result<Value>>,
	{
		if let Some(hit) = self.get(key).await? {
			return Ok(hit);
		}

		let value = compute().await?;

		self.put(key, value.clone(), ttl).await?;

		Ok(value)
	}
}

/// Error type produced by [`CacheStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// A stored value together with its freshness window.
#[derive(Clone, Debug)]
pub struct CacheEntry {
	/// Cached JSON value.
	pub value: Value,
	/// Instant the entry was written.
	pub inserted_at: OffsetDateTime,
	/// Time-to-live measured from `inserted_at`.
	pub ttl: Duration,
}
impl CacheEntry {
	/// Returns `true` while `now - inserted_at <= ttl`.
	pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
		now - self.inserted_at <= self.ttl
	}
}
