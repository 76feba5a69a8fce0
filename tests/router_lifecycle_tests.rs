//! Matching lifecycle tests.
//!
//! Covers the route-table cache round trip, filter execution, dispatch
//! through the handler registry, and request-segment access.

use djangology::{
	Error, HandlerRegistry, InMemoryRouteCache, RequestContext, RequestMeta, Response, Route,
	RouteCache, Router, handler_fn,
};
use std::sync::{Arc, Mutex};

fn get_ctx() -> RequestContext {
	RequestContext::new("GET", false)
}

fn table(router: &mut Router) {
	router.map("users.show", Route::new("/users/[id]", "app::Users@show").unwrap());
	router.map("home", Route::new("/", "app::Home@index").unwrap());
}

#[test]
fn test_first_match_populates_cache() {
	let cache = Arc::new(InMemoryRouteCache::new());
	let mut router = Router::new().with_cache(cache.clone());
	table(&mut router);

	assert!(cache.get("routes").is_none());
	router.match_path("/users/3", &get_ctx()).unwrap();
	assert!(!router.served_from_cache());
	assert!(cache.get("routes").is_some());
}

#[test]
fn test_second_router_is_served_from_cache() {
	let cache = Arc::new(InMemoryRouteCache::new());
	let mut first = Router::new().with_cache(cache.clone());
	table(&mut first);
	first.match_path("/", &get_ctx()).unwrap();

	let mut second = Router::new().with_cache(cache.clone());
	table(&mut second);
	let result = second.match_path("/users/8", &get_ctx()).unwrap();

	assert!(second.served_from_cache());
	assert_eq!(result.name, "users.show");
	assert_eq!(result.params.get("id"), Some("8"));
}

#[test]
fn test_cached_table_replaces_registrations() {
	let cache = Arc::new(InMemoryRouteCache::new());
	let mut first = Router::new().with_cache(cache.clone());
	table(&mut first);
	first.match_path("/", &get_ctx()).unwrap();

	// A route that only the second router registers is not in the cached
	// table, and the cached table wins.
	let mut second = Router::new().with_cache(cache.clone());
	table(&mut second);
	second.map("late", Route::new("/late", "app::Late@index").unwrap());

	let err = second.match_path("/late", &get_ctx()).unwrap_err();
	assert!(matches!(err, Error::NoMatch(_)));
}

#[test]
fn test_conditions_survive_cache_hydration() {
	let cache = Arc::new(InMemoryRouteCache::new());
	let mut first = Router::new().with_cache(cache.clone());
	table(&mut first);
	first.match_path("/", &get_ctx()).unwrap();

	let mut second = Router::new().with_cache(cache.clone());
	second.map(
		"users.show",
		Route::new("/users/[id]", "app::Users@show")
			.unwrap()
			.with_condition(|_route| false),
	);
	second.map("home", Route::new("/", "app::Home@index").unwrap());

	// The snapshot carries no conditions; the router re-attaches them
	// from the same-named registration, so the veto still applies.
	let err = second.match_path("/users/8", &get_ctx()).unwrap_err();
	assert!(matches!(err, Error::NoMatch(_)));
}

#[test]
fn test_filters_run_in_attachment_order() {
	let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
	let mut router = Router::new();

	for key in ["audit", "throttle"] {
		let log = log.clone();
		router.filter_callback(key, move |_result| {
			log.lock().unwrap().push(key);
			Ok(())
		});
	}
	router.map(
		"x",
		Route::new("/x", "app::T@run")
			.unwrap()
			.with_filter("audit")
			.with_filter("throttle"),
	);

	router.match_path("/x", &get_ctx()).unwrap();
	assert_eq!(*log.lock().unwrap(), ["audit", "throttle"]);
}

#[test]
fn test_filter_error_propagates_out_of_match() {
	let mut router = Router::new();
	router.filter_callback("deny", |result| Err(Error::custom(format!("denied {}", result.name))));
	router.map("x", Route::new("/x", "app::T@run").unwrap().with_filter("deny"));

	let err = router.match_path("/x", &get_ctx()).unwrap_err();
	assert!(matches!(err, Error::Custom(message) if message == "denied x"));
}

#[test]
fn test_dispatch_resolves_through_registry() {
	let mut router = Router::new();
	router.map("users.show", Route::new("/users/[id]", "app::Users@show").unwrap());
	router
		.handle(
			"app::Users@show",
			handler_fn(|_ctx, params| {
				let id: i64 = params.get_as("id")?;
				Ok(Response::with_body(format!("user {id}")))
			}),
		)
		.unwrap();

	let ctx = get_ctx();
	router.match_path("/users/12", &ctx).unwrap();
	let response = router.dispatch(&ctx).unwrap();
	assert_eq!(response.status, 200);
	assert_eq!(response.body, "user 12");
}

#[test]
fn test_dispatch_with_shared_registry() {
	let handlers = Arc::new(HandlerRegistry::new());
	handlers
		.register("app::Home@index", handler_fn(|_ctx, _params| Ok(Response::ok())))
		.unwrap();

	let mut router = Router::new().with_handlers(handlers);
	router.map("home", Route::new("/", "app::Home@index").unwrap());

	let ctx = get_ctx();
	router.match_path("/", &ctx).unwrap();
	assert_eq!(router.dispatch(&ctx).unwrap().status, 200);
}

#[test]
fn test_dispatch_unregistered_action_fails() {
	let mut router = Router::new();
	router.map("home", Route::new("/", "app::Home@index").unwrap());

	let ctx = get_ctx();
	router.match_path("/", &ctx).unwrap();
	let err = router.dispatch(&ctx).unwrap_err();
	assert!(matches!(err, Error::MissingHandler(action) if action == "app::Home@index"));
}

struct TestMeta;

impl RequestMeta for TestMeta {
	fn method(&self) -> String {
		"GET".to_string()
	}
	fn is_secure(&self) -> bool {
		true
	}
	fn document_root(&self) -> String {
		"/var/www".to_string()
	}
	fn script_path(&self) -> String {
		"/var/www/blog/index.php".to_string()
	}
	fn path(&self) -> String {
		"/users/3".to_string()
	}
	fn query(&self) -> String {
		"page=2".to_string()
	}
	fn host(&self) -> String {
		"example.test".to_string()
	}
	fn port(&self) -> u16 {
		443
	}
}

#[test]
fn test_segments_snapshot_from_meta() {
	let router = Router::from_meta(&TestMeta);
	assert_eq!(router.get_segment("path").unwrap(), "/users/3");
	assert_eq!(router.get_segment("scheme").unwrap(), "https");
	assert_eq!(router.get_segment("query").unwrap(), "page=2");
	assert_eq!(router.base(), "/blog");

	let err = router.get_segment("nope").unwrap_err();
	assert!(matches!(err, Error::MissingSegment(_)));
}

#[test]
fn test_snapshot_round_trip_preserves_route() {
	let route = Route::new("/users/[id]", "app::Users@show")
		.unwrap()
		.with_methods(&["get"])
		.with_secure(true)
		.with_filter("audit");

	let snapshot = route.snapshot().unwrap();
	let rebuilt = Route::from_snapshot(snapshot.clone());
	assert_eq!(rebuilt.snapshot().unwrap(), snapshot);

	// The rebuilt route matches without re-tokenizing.
	let ctx = RequestContext::new("GET", true);
	let result = rebuilt.matches("/users/4", &ctx).unwrap().unwrap();
	assert_eq!(result.params.get("id"), Some("4"));
}
