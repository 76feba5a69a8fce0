//! Route definition and matching.
//!
//! A [`Route`] is immutable once registered: matching never mutates it and
//! instead produces an immutable [`MatchResult`] carrying the matched URL
//! and captured parameters. The only deferred state is the compiled
//! pattern, memoized behind a single-computation guard; custom patterns
//! added *after* the first compilation do not retrigger it, which keeps
//! compilation idempotent and is preserved here as a documented property.

use crate::error::{Error, Result};
use crate::handler::ActionTarget;
use crate::params::Params;
use crate::pattern::{self, CompiledPattern};
use crate::request::RequestContext;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Extra gating predicate evaluated after method and security checks.
pub type Condition = Arc<dyn Fn(&Route) -> bool + Send + Sync>;

/// Immutable record of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
	/// Name the route was registered under.
	pub name: String,
	/// The full matched URL (the whole regex match, or the path itself on
	/// the exact-equality fast path).
	pub matched_url: String,
	/// Captured parameters in token order. Trailing optional tokens with
	/// no captured group are absent.
	pub params: Params,
}

/// A declared route: path template, action target, constraints and filters.
///
/// # Examples
///
/// ```
/// use djangology::{RequestContext, Route};
///
/// let route = Route::new("/users/[id]", "app::Users@show").unwrap();
/// let ctx = RequestContext::new("GET", false);
///
/// let result = route.matches("/users/42", &ctx).unwrap().unwrap();
/// assert_eq!(result.params.get("id"), Some("42"));
/// assert!(route.matches("/users/abc", &ctx).unwrap().is_none());
/// ```
#[derive(Clone)]
pub struct Route {
	pub(crate) name: Option<String>,
	pub(crate) path: String,
	pub(crate) target: ActionTarget,
	/// Lower-case method constraints; empty means any method.
	pub(crate) methods: Vec<String>,
	pub(crate) secure: bool,
	/// Filter keys in registration order, de-duplicated.
	pub(crate) filters: Vec<String>,
	pub(crate) patterns: IndexMap<String, String>,
	pub(crate) conditions: Vec<Condition>,
	compiled: OnceCell<CompiledPattern>,
	regex: OnceCell<Regex>,
}

impl Route {
	/// Declare a route for a path template and an action string.
	///
	/// The path is normalized to start with `/` and carry no trailing
	/// slash (the root route `/` excepted).
	///
	/// # Errors
	///
	/// [`Error::InvalidActionFormat`] when `action` does not parse as
	/// `module::Class@method`.
	pub fn new(path: impl AsRef<str>, action: &str) -> Result<Self> {
		Ok(Self {
			name: None,
			path: normalize_path(path.as_ref()),
			target: ActionTarget::parse(action)?,
			methods: Vec::new(),
			secure: false,
			filters: Vec::new(),
			patterns: IndexMap::new(),
			conditions: Vec::new(),
			compiled: OnceCell::new(),
			regex: OnceCell::new(),
		})
	}

	/// Constrain the route to the given methods (any casing).
	pub fn with_methods<S: AsRef<str>>(mut self, methods: &[S]) -> Self {
		for method in methods {
			let method = method.as_ref().to_lowercase();
			if !self.methods.contains(&method) {
				self.methods.push(method);
			}
		}
		self
	}

	/// Require an HTTPS-equivalent connection.
	pub fn with_secure(mut self, secure: bool) -> Self {
		self.secure = secure;
		self
	}

	/// Attach a filter key, keeping registration order and dropping
	/// duplicates.
	pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
		let filter = filter.into();
		if !self.filters.contains(&filter) {
			self.filters.push(filter);
		}
		self
	}

	/// Register a named regex fragment for `<name>` tokens.
	pub fn with_pattern(mut self, name: impl Into<String>, regex: impl Into<String>) -> Self {
		self.patterns.insert(name.into(), regex.into());
		self
	}

	/// Same as [`Route::with_pattern`] but on an already-built route.
	/// Patterns added after the first compilation are ignored by the
	/// cached compile result.
	pub fn add_pattern(&mut self, name: impl Into<String>, regex: impl Into<String>) {
		self.patterns.insert(name.into(), regex.into());
	}

	/// Attach an extra gating predicate, evaluated after method and
	/// security checks.
	pub fn with_condition<F>(mut self, condition: F) -> Self
	where
		F: Fn(&Route) -> bool + Send + Sync + 'static,
	{
		self.conditions.push(Arc::new(condition));
		self
	}

	/// Normalized path template.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Name assigned at registration, if any.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// The parsed action target.
	pub fn target(&self) -> &ActionTarget {
		&self.target
	}

	/// Method constraints, lower-cased; empty means any method.
	pub fn methods(&self) -> &[String] {
		&self.methods
	}

	/// Whether the route only matches secure connections.
	pub fn is_secure(&self) -> bool {
		self.secure
	}

	/// Attached filter keys in execution order.
	pub fn filters(&self) -> &[String] {
		&self.filters
	}

	/// Registered custom patterns (pre-compilation view; inline `<n:re>`
	/// registrations surface in [`CompiledPattern::patterns`]).
	pub fn patterns(&self) -> &IndexMap<String, String> {
		&self.patterns
	}

	/// True when the template contains no tokens. Compiles on first use.
	pub fn is_static(&self) -> Result<bool> {
		Ok(self.compile()?.is_static)
	}

	/// Compile the path template, memoizing the first result.
	///
	/// Idempotent: subsequent calls return the cached compilation even if
	/// custom patterns were added in between.
	pub fn compile(&self) -> Result<&CompiledPattern> {
		self.compiled
			.get_or_try_init(|| pattern::compile(&self.path, self.patterns.clone()))
	}

	/// Whether the route accepts the given lower-cased method.
	pub fn allows_method(&self, method: &str) -> bool {
		self.methods.is_empty() || self.methods.iter().any(|m| m == method)
	}

	/// Check this route against an incoming path and request context.
	///
	/// Check order, cheapest and most decisive first: method, security,
	/// extra conditions, exact string equality (fast path, no compilation),
	/// then the compiled pattern anchored and case-insensitive. Capturing
	/// groups bind positionally to tokens in template order.
	pub fn matches(&self, path: &str, ctx: &RequestContext) -> Result<Option<MatchResult>> {
		if !self.allows_method(ctx.method()) {
			return Ok(None);
		}
		if self.secure && !ctx.is_secure() {
			return Ok(None);
		}
		if !self.conditions.iter().all(|condition| condition(self)) {
			return Ok(None);
		}

		if self.path == path {
			return Ok(Some(MatchResult {
				name: self.name.clone().unwrap_or_default(),
				matched_url: path.to_string(),
				params: Params::new(),
			}));
		}

		let regex = self.regex()?;
		let Some(caps) = regex.captures(path) else {
			return Ok(None);
		};

		let tokens = &self.compile()?.tokens;
		let mut params = Params::new();
		for (index, token) in tokens.iter().enumerate() {
			if let Some(group) = caps.get(index + 1) {
				params.insert(&token.name, group.as_str());
			}
		}

		Ok(Some(MatchResult {
			name: self.name.clone().unwrap_or_default(),
			matched_url: caps
				.get(0)
				.expect("match always has group 0")
				.as_str()
				.to_string(),
			params,
		}))
	}

	/// Serializable view of the route, forcing compilation so the cached
	/// table skips tokenization entirely.
	pub fn snapshot(&self) -> Result<RouteSnapshot> {
		Ok(RouteSnapshot {
			name: self.name.clone(),
			path: self.path.clone(),
			target: self.target.clone(),
			methods: self.methods.clone(),
			secure: self.secure,
			filters: self.filters.clone(),
			compiled: self.compile()?.clone(),
		})
	}

	/// Rebuild a route from a snapshot, seeding the compilation cache.
	///
	/// Conditions and handlers are not part of a snapshot: conditions are
	/// re-attached by the router from the same-named in-memory route, and
	/// handlers resolve through the action locator at dispatch time.
	pub fn from_snapshot(snapshot: RouteSnapshot) -> Self {
		Self {
			name: snapshot.name,
			path: snapshot.path,
			target: snapshot.target,
			methods: snapshot.methods,
			secure: snapshot.secure,
			filters: snapshot.filters,
			patterns: snapshot.compiled.patterns.clone(),
			conditions: Vec::new(),
			compiled: OnceCell::with_value(snapshot.compiled),
			regex: OnceCell::new(),
		}
	}

	/// Drop memoized compilation after a registration-time path rewrite.
	pub(crate) fn reset_compilation(&mut self) {
		self.compiled = OnceCell::new();
		self.regex = OnceCell::new();
	}

	fn regex(&self) -> Result<&Regex> {
		self.regex.get_or_try_init(|| {
			let compiled = self.compile()?;
			pattern::build_regex(&compiled.pattern, &self.path)
		})
	}
}

impl fmt::Debug for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("name", &self.name)
			.field("path", &self.path)
			.field("target", &self.target)
			.field("methods", &self.methods)
			.field("secure", &self.secure)
			.field("filters", &self.filters)
			.field("conditions", &self.conditions.len())
			.finish()
	}
}

/// Serializable form of a fully-compiled route, used by the route-table
/// cache. Round-trips through MessagePack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSnapshot {
	pub name: Option<String>,
	pub path: String,
	pub target: ActionTarget,
	pub methods: Vec<String>,
	pub secure: bool,
	pub filters: Vec<String>,
	pub compiled: CompiledPattern,
}

/// Normalize a template to start with `/` and carry no trailing slash,
/// keeping the root route as `/`.
pub(crate) fn normalize_path(path: &str) -> String {
	let trimmed = path.trim();
	let mut normalized = if trimmed.starts_with('/') {
		trimmed.to_string()
	} else {
		format!("/{trimmed}")
	};
	while normalized.len() > 1 && normalized.ends_with('/') {
		normalized.pop();
	}
	normalized
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn ctx() -> RequestContext {
		RequestContext::new("GET", false)
	}

	#[rstest]
	#[case("users", "/users")]
	#[case("/users/", "/users")]
	#[case("/users//", "/users")]
	#[case("/", "/")]
	fn test_path_normalization(#[case] raw: &str, #[case] expected: &str) {
		assert_eq!(normalize_path(raw), expected);
	}

	#[rstest]
	fn test_static_route_uses_exact_equality() {
		let route = Route::new("/", "app::Home@index").unwrap();
		assert!(route.is_static().unwrap());

		let result = route.matches("/", &ctx()).unwrap().unwrap();
		assert_eq!(result.matched_url, "/");
		assert!(result.params.is_empty());
	}

	#[rstest]
	fn test_token_order_binding() {
		let route = Route::new("/{module}/{controller}/{action}.{ext}", "app::Mvc@run").unwrap();
		let result = route
			.matches("/users/profile/view.json", &ctx())
			.unwrap()
			.unwrap();
		assert_eq!(result.params.get("module"), Some("users"));
		assert_eq!(result.params.get("controller"), Some("profile"));
		assert_eq!(result.params.get("action"), Some("view"));
		assert_eq!(result.params.get("ext"), Some("json"));
		assert_eq!(result.matched_url, "/users/profile/view.json");
	}

	#[rstest]
	#[case("/users")]
	#[case("/users/")]
	#[case("/users/1")]
	fn test_optional_token_variants(#[case] path: &str) {
		let route = Route::new("/users/[id?]", "app::Users@show").unwrap();
		assert!(route.matches(path, &ctx()).unwrap().is_some());
	}

	#[rstest]
	#[case("/users/1", true)]
	#[case("/users", false)]
	#[case("/users/", false)]
	fn test_required_token_variants(#[case] path: &str, #[case] matched: bool) {
		let route = Route::new("/users/[id]", "app::Users@show").unwrap();
		assert_eq!(route.matches(path, &ctx()).unwrap().is_some(), matched);
	}

	#[rstest]
	fn test_trailing_optional_token_left_unset() {
		let route = Route::new("/users/[id?]", "app::Users@show").unwrap();
		let result = route.matches("/users", &ctx()).unwrap().unwrap();
		assert_eq!(result.params.get("id"), None);
	}

	#[rstest]
	#[case("get", false)]
	#[case("post", true)]
	#[case("put", true)]
	fn test_method_gating(#[case] method: &str, #[case] matched: bool) {
		let route = Route::new("/submit", "app::Form@save")
			.unwrap()
			.with_methods(&["POST", "put"]);
		let ctx = RequestContext::new(method, false);
		assert_eq!(route.matches("/submit", &ctx).unwrap().is_some(), matched);
	}

	#[rstest]
	fn test_security_gating() {
		let route = Route::new("/account", "app::Account@show")
			.unwrap()
			.with_secure(true);
		assert!(
			route
				.matches("/account", &RequestContext::new("GET", false))
				.unwrap()
				.is_none()
		);
		assert!(
			route
				.matches("/account", &RequestContext::new("GET", true))
				.unwrap()
				.is_some()
		);
	}

	#[rstest]
	fn test_condition_gating() {
		let route = Route::new("/cond", "app::C@run")
			.unwrap()
			.with_condition(|_| false);
		assert!(route.matches("/cond", &ctx()).unwrap().is_none());
	}

	#[rstest]
	fn test_compile_caches_first_result() {
		let mut route = Route::new("/p/<slug>", "app::P@show")
			.unwrap()
			.with_pattern("slug", "[a-z-]+");
		let first = route.compile().unwrap().pattern.clone();

		// Later pattern mutation does not retrigger compilation.
		route.add_pattern("slug", "[0-9]+");
		assert_eq!(route.compile().unwrap().pattern, first);
	}

	#[rstest]
	fn test_missing_pattern_surfaces_at_compile() {
		let route = Route::new("/x/<missing>", "app::X@run").unwrap();
		let err = route.compile().unwrap_err();
		assert!(matches!(err, Error::MissingPattern(_)));
	}

	#[rstest]
	fn test_case_insensitive_pattern_match() {
		let route = Route::new("/Users/{name}", "app::Users@show").unwrap();
		assert!(route.matches("/users/Alice", &ctx()).unwrap().is_some());
	}

	#[rstest]
	fn test_snapshot_round_trip() {
		let route = Route::new("/users/[id]", "app::Users@show")
			.unwrap()
			.with_methods(&["get"])
			.with_filter("auth");
		let snapshot = route.snapshot().unwrap();

		let bytes = rmp_serde::to_vec(&snapshot).unwrap();
		let restored: RouteSnapshot = rmp_serde::from_slice(&bytes).unwrap();
		assert_eq!(restored, snapshot);

		let rebuilt = Route::from_snapshot(restored);
		assert_eq!(rebuilt.path(), "/users/[id]");
		// Seeded compilation cache means no recompilation happens.
		assert_eq!(rebuilt.compile().unwrap(), &snapshot.compiled);
		let result = rebuilt.matches("/users/9", &ctx()).unwrap().unwrap();
		assert_eq!(result.params.get("id"), Some("9"));
	}

	#[rstest]
	fn test_snapshot_shape() {
		let route = Route::new("/users/[id]", "app::Users@show").unwrap();
		let json = serde_json::to_value(route.snapshot().unwrap()).unwrap();

		assert_eq!(json["path"], "/users/[id]");
		assert_eq!(json["target"]["class"], "app::Users");
		assert_eq!(json["compiled"]["pattern"], r"\/users\/([0-9.]+)\/?");
		assert_eq!(json["compiled"]["tokens"][0]["name"], "id");
	}
}
