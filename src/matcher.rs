//! Route selection strategies.
//!
//! The router delegates table traversal to a [`Matcher`] so alternative
//! strategies (a trie or radix matcher, say) can replace the default
//! without touching [`crate::Router`] or [`crate::Route`].

use crate::error::Result;
use crate::route::{MatchResult, Route};
use crate::request::RequestContext;
use indexmap::IndexMap;

/// Pluggable strategy selecting one route from the table for a path.
pub trait Matcher: Send + Sync {
	/// Return the first satisfying route's match, or `None`.
	///
	/// Compilation errors from lazily-compiled routes propagate.
	fn match_route(
		&self,
		path: &str,
		ctx: &RequestContext,
		routes: &IndexMap<String, Route>,
	) -> Result<Option<MatchResult>>;
}

/// Default strategy: iterate the table in insertion order, first match
/// wins. Insertion order is the tie-break rule, so more specific routes
/// must be registered before more general ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopMatcher;

impl Matcher for LoopMatcher {
	fn match_route(
		&self,
		path: &str,
		ctx: &RequestContext,
		routes: &IndexMap<String, Route>,
	) -> Result<Option<MatchResult>> {
		for route in routes.values() {
			if let Some(result) = route.matches(path, ctx)? {
				return Ok(Some(result));
			}
		}
		Ok(None)
	}
}
