//! Scoped configuration overlays for batches of routes.
//!
//! A [`RouteGroup`] holds shared settings applied to every route mapped
//! while the group is open (see [`crate::Router::group`]). Grouping uses
//! structured nesting: the configuration is passed into the closure rather
//! than threaded through externally mutable state, and nested groups apply
//! cumulatively outer-to-inner.
//!
//! Merge rules when a group is applied to a route: `secure` and `methods`
//! overwrite, prefix/suffix rewrite the path, while patterns, filters, and
//! conditions accumulate (union, de-duplicated) on top of whatever the
//! route already declared.

use crate::route::Condition;
use indexmap::IndexMap;
use std::sync::Arc;

/// Shared configuration for a batch of routes.
///
/// # Examples
///
/// ```
/// use djangology::RouteGroup;
///
/// let group = RouteGroup::new()
///     .with_prefix("/api/v1")
///     .with_filter("auth")
///     .with_secure(true);
///
/// assert_eq!(group.prefix(), "/api/v1");
/// ```
#[derive(Clone, Default)]
pub struct RouteGroup {
	pub(crate) prefix: String,
	pub(crate) suffix: String,
	pub(crate) patterns: IndexMap<String, String>,
	pub(crate) filters: Vec<String>,
	pub(crate) methods: Vec<String>,
	pub(crate) secure: Option<bool>,
	pub(crate) conditions: Vec<Condition>,
}

impl RouteGroup {
	/// Create an empty group.
	pub fn new() -> Self {
		Self::default()
	}

	/// Path fragment prepended to every route in the group.
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	/// Path fragment appended to every route in the group.
	pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
		self.suffix = suffix.into();
		self
	}

	/// Custom pattern shared by every route in the group.
	pub fn with_pattern(mut self, name: impl Into<String>, regex: impl Into<String>) -> Self {
		self.patterns.insert(name.into(), regex.into());
		self
	}

	/// Filter attached to every route in the group.
	pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
		let filter = filter.into();
		if !self.filters.contains(&filter) {
			self.filters.push(filter);
		}
		self
	}

	/// Method constraint applied (overwriting) to every route in the group.
	pub fn with_methods<S: AsRef<str>>(mut self, methods: &[S]) -> Self {
		for method in methods {
			let method = method.as_ref().to_lowercase();
			if !self.methods.contains(&method) {
				self.methods.push(method);
			}
		}
		self
	}

	/// Security flag applied (overwriting) to every route in the group.
	pub fn with_secure(mut self, secure: bool) -> Self {
		self.secure = Some(secure);
		self
	}

	/// Gating predicate attached to every route in the group.
	pub fn with_condition<F>(mut self, condition: F) -> Self
	where
		F: Fn(&crate::Route) -> bool + Send + Sync + 'static,
	{
		self.conditions.push(Arc::new(condition));
		self
	}

	/// The group's prefix fragment.
	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	/// The group's suffix fragment.
	pub fn suffix(&self) -> &str {
		&self.suffix
	}
}
