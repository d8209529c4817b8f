//! Thread-safe in-memory [`CacheStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	cache::{CacheEntry, CacheFuture, CacheStore},
};

type EntryMap = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// Thread-safe cache backend that keeps entries in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(EntryMap);
impl MemoryCache {
	fn get_now(map: EntryMap, key: String, now: OffsetDateTime) -> Option<Value> {
		map.read().get(&key).filter(|entry| entry.is_fresh_at(now)).map(|entry| entry.value.clone())
	}

	fn put_now(map: EntryMap, key: String, value: Value, ttl: Duration, now: OffsetDateTime) {
		let mut guard = map.write();

		// Stale entries are dropped opportunistically on writes; reads already treat them as
		// absent.
		guard.retain(|_, entry| entry.is_fresh_at(now));
		guard.insert(key, CacheEntry { value, inserted_at: now, ttl });
	}

	/// Returns the number of live (unexpired) entries.
	pub fn len(&self) -> usize {
		let now = OffsetDateTime::now_utc();

		self.0.read().values().filter(|entry| entry.is_fresh_at(now)).count()
	}

	/// Returns `true` when no live entries remain.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl CacheStore for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<Value>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::get_now(map, key, OffsetDateTime::now_utc())) })
	}

	fn put<'a>(&'a self, key: &'a str, value: Value, ttl: Duration) -> CacheFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move {
			Self::put_now(map, key, value, ttl, OffsetDateTime::now_utc());

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn put_then_get_round_trips_within_ttl() {
		let cache = MemoryCache::default();

		cache
			.put("key", Value::String("value".into()), Duration::HOUR)
			.await
			.expect("Put should succeed.");

		assert_eq!(
			cache.get("key").await.expect("Get should succeed."),
			Some(Value::String("value".into())),
		);
		assert_eq!(cache.get("other").await.expect("Get should succeed."), None);
	}

	#[tokio::test]
	async fn expired_entries_read_as_absent() {
		let cache = MemoryCache::default();

		cache
			.put("stale", Value::Bool(true), Duration::seconds(-1))
			.await
			.expect("Put should succeed.");

		assert_eq!(cache.get("stale").await.expect("Get should succeed."), None);
		assert!(cache.is_empty());
	}

	#[tokio::test]
	async fn writes_replace_previous_entries() {
		let cache = MemoryCache::default();

		cache
			.put("key", Value::from(1), Duration::HOUR)
			.await
			.expect("First put should succeed.");
		cache
			.put("key", Value::from(2), Duration::HOUR)
			.await
			.expect("Second put should succeed.");

		assert_eq!(cache.get("key").await.expect("Get should succeed."), Some(Value::from(2)));
		assert_eq!(cache.len(), 1);
	}
}
