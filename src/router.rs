//! Route registration and the matching lifecycle.
//!
//! The router owns the ordered route table and the filter registry,
//! applies group overlays at registration time, and drives the match
//! lifecycle: cache load, table traversal, cache save, filter execution.
//! Registration must complete before the first [`Router::match_path`]
//! call: once a cached table is loaded it replaces the in-memory one and
//! later registrations are not consulted for matching.

use crate::cache::{self, ROUTE_TABLE_KEY, ROUTE_TABLE_TTL, RouteCache};
use crate::error::{Error, Result};
use crate::filter::{Filter, FilterRegistry, filter_fn};
use crate::handler::{ActionLocator, Handler, HandlerRegistry, Response};
use crate::matcher::{LoopMatcher, Matcher};
use crate::request::{RequestContext, RequestMeta, Segments};
use crate::route::{MatchResult, Route, normalize_path};
use crate::route_group::RouteGroup;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps the five resource variants to action names and method sets.
///
/// The defaults follow REST conventions: `list`→GET `index`,
/// `create`→POST, `read`→GET, `update`→PUT/POST, `delete`→DELETE/POST.
#[derive(Debug, Clone)]
pub struct ResourceConfig {
	/// Variant name to action method name.
	pub actions: IndexMap<String, String>,
	/// Variant name to allowed methods.
	pub methods: IndexMap<String, Vec<String>>,
}

impl ResourceConfig {
	/// Variants that address a single record and get the `(id)` segment.
	const DETAIL_VARIANTS: [&'static str; 3] = ["read", "update", "delete"];

	fn variant_is_detail(variant: &str) -> bool {
		Self::DETAIL_VARIANTS.contains(&variant)
	}
}

impl Default for ResourceConfig {
	fn default() -> Self {
		let actions = [
			("list", "index"),
			("create", "create"),
			("read", "read"),
			("update", "update"),
			("delete", "delete"),
		]
		.into_iter()
		.map(|(variant, action)| (variant.to_string(), action.to_string()))
		.collect();

		let methods = [
			("list", vec!["get"]),
			("create", vec!["post"]),
			("read", vec!["get"]),
			("update", vec!["put", "post"]),
			("delete", vec!["delete", "post"]),
		]
		.into_iter()
		.map(|(variant, methods)| {
			(
				variant.to_string(),
				methods.into_iter().map(String::from).collect(),
			)
		})
		.collect();

		Self { actions, methods }
	}
}

/// The routing engine: registration API plus the matching lifecycle.
///
/// # Examples
///
/// ```
/// use djangology::{RequestContext, Route, Router};
///
/// let mut router = Router::new();
/// router.map("users.show", Route::new("/users/[id]", "app::Users@show").unwrap());
///
/// let ctx = RequestContext::new("GET", false);
/// let result = router.match_path("/users/7", &ctx).unwrap();
/// assert_eq!(result.name, "users.show");
/// assert_eq!(result.params.get("id"), Some("7"));
/// ```
pub struct Router {
	routes: IndexMap<String, Route>,
	filters: FilterRegistry,
	handlers: Arc<HandlerRegistry>,
	locator: Option<Arc<dyn ActionLocator>>,
	matcher: Box<dyn Matcher>,
	cache: Option<Arc<dyn RouteCache>>,
	groups: Vec<RouteGroup>,
	current: Option<MatchResult>,
	segments: Segments,
	resource_config: ResourceConfig,
	served_from_cache: bool,
}

impl Router {
	/// Create a router with an empty table, the default loop matcher, and
	/// no request segments.
	pub fn new() -> Self {
		Self {
			routes: IndexMap::new(),
			filters: FilterRegistry::new(),
			handlers: Arc::new(HandlerRegistry::new()),
			locator: None,
			matcher: Box::new(LoopMatcher),
			cache: None,
			groups: Vec::new(),
			current: None,
			segments: Segments::default(),
			resource_config: ResourceConfig::default(),
			served_from_cache: false,
		}
	}

	/// Create a router and snapshot request segments from transport
	/// metadata.
	pub fn from_meta(meta: &dyn RequestMeta) -> Self {
		let mut router = Self::new();
		router.segments = Segments::from_meta(meta);
		router
	}

	/// Replace the matching strategy.
	pub fn with_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
		self.matcher = Box::new(matcher);
		self
	}

	/// Attach a route-table cache store.
	pub fn with_cache(mut self, cache: Arc<dyn RouteCache>) -> Self {
		self.cache = Some(cache);
		self
	}

	/// Share a handler registry (e.g. across per-request routers).
	pub fn with_handlers(mut self, handlers: Arc<HandlerRegistry>) -> Self {
		self.handlers = handlers;
		self
	}

	/// Plug an external action locator, replacing the built-in registry
	/// for dispatch resolution.
	pub fn with_locator(mut self, locator: Arc<dyn ActionLocator>) -> Self {
		self.locator = Some(locator);
		self
	}

	/// Override the resource expansion maps.
	pub fn with_resource_config(mut self, config: ResourceConfig) -> Self {
		self.resource_config = config;
		self
	}

	// ------------------------------------------------------------------
	// Registration
	// ------------------------------------------------------------------

	/// Store a route under a name, applying every open group overlay in
	/// stack order (outer to inner).
	///
	/// Registration order is matching priority: declare specific routes
	/// before general ones.
	pub fn map(&mut self, name: impl Into<String>, mut route: Route) -> &Route {
		let name = name.into();
		route.name = Some(name.clone());
		self.apply_groups(&mut route);
		self.routes.insert(name.clone(), route);
		&self.routes[&name]
	}

	/// `map` constrained to GET (and HEAD, which GET implies).
	pub fn get(&mut self, name: impl Into<String>, route: Route) -> &Route {
		self.map(name, route.with_methods(&["get", "head"]))
	}

	/// `map` constrained to POST.
	pub fn post(&mut self, name: impl Into<String>, route: Route) -> &Route {
		self.map(name, route.with_methods(&["post"]))
	}

	/// `map` constrained to PUT.
	pub fn put(&mut self, name: impl Into<String>, route: Route) -> &Route {
		self.map(name, route.with_methods(&["put"]))
	}

	/// `map` constrained to DELETE.
	pub fn delete(&mut self, name: impl Into<String>, route: Route) -> &Route {
		self.map(name, route.with_methods(&["delete"]))
	}

	/// `map` constrained to HEAD.
	pub fn head(&mut self, name: impl Into<String>, route: Route) -> &Route {
		self.map(name, route.with_methods(&["head"]))
	}

	/// `map` constrained to OPTIONS.
	pub fn options(&mut self, name: impl Into<String>, route: Route) -> &Route {
		self.map(name, route.with_methods(&["options"]))
	}

	/// Expand one declaration into the conventional CRUD quintet.
	///
	/// Produces `name.list`, `name.create`, `name.read`, `name.update`
	/// and `name.delete`; the record-addressing variants append an `(id)`
	/// wildcard segment. Each expanded route is a fresh instance built
	/// through the ordinary `map` path, so open groups apply consistently.
	pub fn resource(&mut self, name: &str, route: Route) -> Result<()> {
		let config = self.resource_config.clone();
		for (variant, action) in &config.actions {
			let path = if ResourceConfig::variant_is_detail(variant) {
				format!("{}/(id)", route.path)
			} else {
				route.path.clone()
			};

			let mut expanded =
				Route::new(path, &route.target.with_method(action).to_string())?;
			expanded.secure = route.secure;
			expanded.filters = route.filters.clone();
			expanded.patterns = route.patterns.clone();
			expanded.conditions = route.conditions.clone();
			if let Some(methods) = config.methods.get(variant) {
				expanded = expanded.with_methods(methods);
			}

			self.map(format!("{name}.{variant}"), expanded);
		}
		Ok(())
	}

	/// Open a group scope: every `map` call issued inside the closure has
	/// the group's configuration applied, cumulatively with any groups
	/// already open.
	///
	/// # Examples
	///
	/// ```
	/// use djangology::{Route, RouteGroup, Router};
	///
	/// let mut router = Router::new();
	/// router.group(RouteGroup::new().with_prefix("/api"), |router| {
	///     router.map("users", Route::new("/users", "app::Users@index").unwrap());
	/// });
	///
	/// assert_eq!(router.get_route("users").unwrap().path(), "/api/users");
	/// ```
	pub fn group<F>(&mut self, group: RouteGroup, f: F)
	where
		F: FnOnce(&mut Self),
	{
		self.groups.push(group);
		f(self);
		self.groups.pop();
	}

	/// Register a named filter.
	pub fn filter(&mut self, key: impl Into<String>, filter: Arc<dyn Filter>) {
		self.filters.insert(key, filter);
	}

	/// Register a closure as a named filter.
	pub fn filter_callback<F>(&mut self, key: impl Into<String>, f: F)
	where
		F: Fn(&MatchResult) -> Result<()> + Send + Sync + 'static,
	{
		self.filters.insert(key, filter_fn(f));
	}

	/// Look up a registered filter by key.
	pub fn get_filter(&self, key: &str) -> Result<&Arc<dyn Filter>> {
		self.filters.get(key)
	}

	/// Register a handler for an action string in the built-in registry.
	pub fn handle(&self, action: &str, handler: Arc<dyn Handler>) -> Result<()> {
		self.handlers.register(action, handler)
	}

	// ------------------------------------------------------------------
	// Lookup
	// ------------------------------------------------------------------

	/// The route table in registration order.
	pub fn routes(&self) -> &IndexMap<String, Route> {
		&self.routes
	}

	/// Look up a route by name.
	pub fn get_route(&self, name: &str) -> Result<&Route> {
		self.routes
			.get(name)
			.ok_or_else(|| Error::MissingRoute(name.to_string()))
	}

	/// Look up a request segment snapshotted at construction.
	pub fn get_segment(&self, key: &str) -> Result<&str> {
		self.segments.get(key)
	}

	/// URL sub-path the application is mounted under.
	pub fn base(&self) -> &str {
		self.segments.base()
	}

	/// The last successful match of this router, if any.
	pub fn current(&self) -> Option<&MatchResult> {
		self.current.as_ref()
	}

	/// Whether the table was replaced by a cached snapshot this cycle.
	pub fn served_from_cache(&self) -> bool {
		self.served_from_cache
	}

	// ------------------------------------------------------------------
	// Matching lifecycle
	// ------------------------------------------------------------------

	/// Resolve an incoming path to exactly one route.
	///
	/// Lifecycle: load the cached table if a store is attached (replacing
	/// the in-memory table on a hit), run the matcher, persist the
	/// compiled table on a fresh match (best-effort), then run the matched
	/// route's filters in order. Filter errors propagate; cache failures
	/// never do.
	///
	/// # Errors
	///
	/// [`Error::NoMatch`] when no route satisfies the path and context;
	/// [`Error::MissingFilter`] and filter errors from the filter phase;
	/// compilation errors from lazily-compiled routes.
	pub fn match_path(&mut self, path: &str, ctx: &RequestContext) -> Result<MatchResult> {
		self.load_cached_table();

		let result = self
			.matcher
			.match_route(path, ctx, &self.routes)?
			.ok_or_else(|| Error::NoMatch(path.to_string()))?;
		debug!(route = %result.name, path, "route matched");
		self.current = Some(result.clone());

		if !self.served_from_cache {
			self.persist_table();
		}
		self.run_filters(&result)?;

		Ok(result)
	}

	/// Dispatch the current match through the action locator.
	///
	/// # Errors
	///
	/// [`Error::NotMatched`] when no successful match preceded the call;
	/// [`Error::MissingHandler`] when the target has no registered
	/// handler; handler errors propagate.
	pub fn dispatch(&self, ctx: &RequestContext) -> Result<Response> {
		let current = self.current.as_ref().ok_or(Error::NotMatched)?;
		let route = self.get_route(&current.name)?;
		let handler = match &self.locator {
			Some(locator) => locator.resolve(&route.target)?,
			None => self.handlers.resolve(&route.target)?,
		};
		handler.handle(ctx, &current.params)
	}

	fn apply_groups(&self, route: &mut Route) {
		if self.groups.is_empty() {
			return;
		}

		// Outer groups wrap inner ones: prefixes compose outer-to-inner
		// in front of the path, suffixes inner-to-outer behind it.
		let prefix: String = self.groups.iter().map(|g| g.prefix.as_str()).collect();
		let suffix: String = self
			.groups
			.iter()
			.rev()
			.map(|g| g.suffix.as_str())
			.collect();
		route.path = normalize_path(&format!("{prefix}{}{suffix}", route.path));
		route.reset_compilation();

		for group in &self.groups {
			if let Some(secure) = group.secure {
				route.secure = secure;
			}
			if !group.methods.is_empty() {
				route.methods = group.methods.clone();
			}
			for (name, pattern) in &group.patterns {
				// A route's own pattern for the same token is more
				// specific than the group's and stays.
				route
					.patterns
					.entry(name.clone())
					.or_insert_with(|| pattern.clone());
			}
			for filter in &group.filters {
				if !route.filters.contains(filter) {
					route.filters.push(filter.clone());
				}
			}
			route.conditions.extend(group.conditions.iter().cloned());
		}
	}

	fn load_cached_table(&mut self) {
		if self.served_from_cache {
			return;
		}
		let Some(cache) = &self.cache else { return };
		let Some(bytes) = cache.get(ROUTE_TABLE_KEY) else {
			return;
		};
		let Some(mut table) = cache::decode_table(&bytes) else {
			return;
		};

		// Conditions are not serializable; carry them over from the
		// same-named in-memory routes.
		for (name, route) in table.iter_mut() {
			if let Some(registered) = self.routes.get(name) {
				route.conditions = registered.conditions.clone();
			}
		}

		debug!(routes = table.len(), "route table served from cache");
		self.routes = table;
		self.served_from_cache = true;
	}

	fn persist_table(&self) {
		let Some(cache) = &self.cache else { return };
		let Some(bytes) = cache::encode_table(&self.routes) else {
			return;
		};
		if !cache.set(ROUTE_TABLE_KEY, &bytes, ROUTE_TABLE_TTL) {
			warn!("route-table cache write failed");
		}
	}

	fn run_filters(&self, result: &MatchResult) -> Result<()> {
		let route = self.get_route(&result.name)?;
		for key in route.filters.clone() {
			self.filters.get(&key)?.run(result)?;
		}
		Ok(())
	}
}

impl Default for Router {
	fn default() -> Self {
		Self::new()
	}
}
