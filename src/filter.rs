//! Named route filters.
//!
//! A filter is a side-effecting hook executed after a successful match,
//! before dispatch, in the order the matched route lists its filter keys.
//! Filters are not sandboxed: an error returned by one propagates straight
//! out of the match call.

use crate::error::{Error, Result};
use crate::route::MatchResult;
use std::collections::HashMap;
use std::sync::Arc;

/// A route-attachable hook, keyed by name in the router's registry.
pub trait Filter: Send + Sync {
	/// Run the hook for a matched route.
	fn run(&self, result: &MatchResult) -> Result<()>;
}

impl std::fmt::Debug for dyn Filter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("dyn Filter")
	}
}

struct FnFilter<F>(F);

impl<F> Filter for FnFilter<F>
where
	F: Fn(&MatchResult) -> Result<()> + Send + Sync,
{
	fn run(&self, result: &MatchResult) -> Result<()> {
		(self.0)(result)
	}
}

/// Wrap a closure as a [`Filter`].
pub fn filter_fn<F>(f: F) -> Arc<dyn Filter>
where
	F: Fn(&MatchResult) -> Result<()> + Send + Sync + 'static,
{
	Arc::new(FnFilter(f))
}

/// Registry of named filters.
#[derive(Default)]
pub struct FilterRegistry {
	filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
	/// Create an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a filter under a key, replacing any previous entry.
	pub fn insert(&mut self, key: impl Into<String>, filter: Arc<dyn Filter>) {
		self.filters.insert(key.into(), filter);
	}

	/// Look up a filter; unknown keys fail with [`Error::MissingFilter`].
	pub fn get(&self, key: &str) -> Result<&Arc<dyn Filter>> {
		self.filters
			.get(key)
			.ok_or_else(|| Error::MissingFilter(key.to_string()))
	}
}
