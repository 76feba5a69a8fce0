//! Route-table caching.
//!
//! After the first successful match the router serializes its
//! fully-compiled table and persists it under a fixed key with a long TTL,
//! so subsequent processes skip tokenization entirely. The store is an
//! external collaborator behind [`RouteCache`]; routing correctness never
//! depends on it; a miss, a decode failure, or a failed write all degrade
//! to "proceed with in-memory routes" with a `tracing` warning.

use crate::route::{Route, RouteSnapshot};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// Fixed key the serialized table is stored under.
pub const ROUTE_TABLE_KEY: &str = "routes";

/// Effectively "until explicitly invalidated".
pub const ROUTE_TABLE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Synchronous key-value store for the serialized route table.
///
/// Implementations must not panic on backend failure: `get` reports any
/// failure as a miss, `set` reports it as `false`.
pub trait RouteCache: Send + Sync {
	/// Fetch previously stored bytes, `None` on miss or error.
	fn get(&self, key: &str) -> Option<Vec<u8>>;
	/// Store bytes under a key; `false` when the write did not happen.
	fn set(&self, key: &str, value: &[u8], ttl: Duration) -> bool;
}

/// Process-local [`RouteCache`] backend. TTLs are accepted and ignored;
/// entries live as long as the cache value does.
#[derive(Default)]
pub struct InMemoryRouteCache {
	entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryRouteCache {
	/// Create an empty cache.
	pub fn new() -> Self {
		Self::default()
	}
}

impl RouteCache for InMemoryRouteCache {
	fn get(&self, key: &str) -> Option<Vec<u8>> {
		self.entries.read().get(key).cloned()
	}

	fn set(&self, key: &str, value: &[u8], _ttl: Duration) -> bool {
		self.entries.write().insert(key.to_string(), value.to_vec());
		true
	}
}

/// Serialize a route table to MessagePack, forcing compilation of every
/// route first. Returns `None` (with a warning) when any route fails to
/// compile or encode; persistence is best-effort.
pub(crate) fn encode_table(routes: &IndexMap<String, Route>) -> Option<Vec<u8>> {
	let mut snapshots: Vec<(String, RouteSnapshot)> = Vec::with_capacity(routes.len());
	for (name, route) in routes {
		match route.snapshot() {
			Ok(snapshot) => snapshots.push((name.clone(), snapshot)),
			Err(err) => {
				warn!(route = %name, error = %err, "skipping route-table persist");
				return None;
			}
		}
	}
	match rmp_serde::to_vec(&snapshots) {
		Ok(bytes) => Some(bytes),
		Err(err) => {
			warn!(error = %err, "route-table encode failed");
			None
		}
	}
}

/// Decode a serialized table back into routes, preserving order.
/// Returns `None` (with a warning) on decode failure.
pub(crate) fn decode_table(bytes: &[u8]) -> Option<IndexMap<String, Route>> {
	let snapshots: Vec<(String, RouteSnapshot)> = match rmp_serde::from_slice(bytes) {
		Ok(snapshots) => snapshots,
		Err(err) => {
			warn!(error = %err, "route-table decode failed, falling back to in-memory routes");
			return None;
		}
	};
	Some(
		snapshots
			.into_iter()
			.map(|(name, snapshot)| (name, Route::from_snapshot(snapshot)))
			.collect(),
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_in_memory_round_trip() {
		let cache = InMemoryRouteCache::new();
		assert!(cache.get(ROUTE_TABLE_KEY).is_none());
		assert!(cache.set(ROUTE_TABLE_KEY, b"bytes", ROUTE_TABLE_TTL));
		assert_eq!(cache.get(ROUTE_TABLE_KEY).as_deref(), Some(&b"bytes"[..]));
	}

	#[rstest]
	fn test_table_encode_decode_preserves_order_and_content() {
		let mut routes = IndexMap::new();
		for (name, path) in [("a", "/alpha/[id]"), ("b", "/beta"), ("c", "/gamma/{x}")] {
			let mut route = Route::new(path, "app::T@run").unwrap();
			route.name = Some(name.to_string());
			routes.insert(name.to_string(), route);
		}

		let bytes = encode_table(&routes).unwrap();
		let decoded = decode_table(&bytes).unwrap();

		let names: Vec<&String> = decoded.keys().collect();
		assert_eq!(names, vec!["a", "b", "c"]);
		for (name, route) in &routes {
			let restored = &decoded[name];
			assert_eq!(restored.path(), route.path());
			assert_eq!(restored.compile().unwrap(), route.compile().unwrap());
		}
	}

	#[rstest]
	fn test_decode_garbage_degrades_to_none() {
		assert!(decode_table(b"not msgpack").is_none());
	}

	#[rstest]
	fn test_encode_skips_on_compile_failure() {
		let mut routes = IndexMap::new();
		routes.insert(
			"broken".to_string(),
			Route::new("/x/<missing>", "app::X@run").unwrap(),
		);
		assert!(encode_table(&routes).is_none());
	}
}
