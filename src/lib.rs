//! # Djangology
//!
//! URL routing engine: a small pattern DSL compiled to regular
//! expressions, an ordered route table, and a cache-aware matching
//! lifecycle.
//!
//! - **Pattern DSL**: `<name>` / `<name:regex>` custom tokens, `{name}`
//!   slugs, `[name]` numbers, `(name)` wildcards, with `?` marking a
//!   token optional
//! - **First-match-wins**: routes match in registration order
//! - **Groups**: prefix/suffix/method/filter overlays, structurally
//!   nested with closures
//! - **Resource expansion**: one declaration becomes the CRUD quintet
//! - **Route-table cache**: compiled tables round-trip through any
//!   [`RouteCache`] store as MessagePack
//!
//! # Examples
//!
//! ## Basic Routing
//!
//! ```
//! use djangology::{RequestContext, Route, Router};
//!
//! let mut router = Router::new();
//! router.get("users.show", Route::new("/users/[id]", "app::Users@show").unwrap());
//!
//! let ctx = RequestContext::new("GET", false);
//! let result = router.match_path("/users/42", &ctx).unwrap();
//! assert_eq!(result.params.get("id"), Some("42"));
//! ```
//!
//! ## Groups
//!
//! ```
//! use djangology::{Route, RouteGroup, Router};
//!
//! let mut router = Router::new();
//! router.group(RouteGroup::new().with_prefix("/api").with_secure(true), |router| {
//!     router.map("orders", Route::new("/orders", "api::Orders@index").unwrap());
//! });
//!
//! let route = router.get_route("orders").unwrap();
//! assert_eq!(route.path(), "/api/orders");
//! assert!(route.is_secure());
//! ```
//!
//! ## Dispatch
//!
//! ```
//! use djangology::{RequestContext, Response, Route, Router, handler_fn};
//!
//! let mut router = Router::new();
//! router.map("hello", Route::new("/hello/{name}", "app::Hello@greet").unwrap());
//! router
//!     .handle("app::Hello@greet", handler_fn(|_ctx, params| {
//!         Ok(Response::with_body(format!("hi {}", params.get("name").unwrap_or(""))))
//!     }))
//!     .unwrap();
//!
//! let ctx = RequestContext::new("GET", false);
//! router.match_path("/hello/minor-swing", &ctx).unwrap();
//! let response = router.dispatch(&ctx).unwrap();
//! assert_eq!(response.body, "hi minor-swing");
//! ```

pub mod cache;
pub mod error;
pub mod filter;
pub mod handler;
pub mod matcher;
pub mod params;
pub mod pattern;
pub mod registration;
pub mod request;
pub mod route;
pub mod route_group;
pub mod router;

pub use cache::{InMemoryRouteCache, RouteCache};
pub use error::{Error, Result};
pub use filter::{Filter, FilterRegistry, filter_fn};
pub use handler::{ActionLocator, ActionTarget, Handler, HandlerRegistry, Response, handler_fn};
pub use matcher::{LoopMatcher, Matcher};
pub use params::Params;
pub use pattern::CompiledPattern;
pub use registration::RouteRegistration;
pub use request::{RequestContext, RequestMeta, Segments};
pub use route::{MatchResult, Route, RouteSnapshot};
pub use route_group::RouteGroup;
pub use router::{ResourceConfig, Router};

// `register_route!` expands to `inventory::submit!` in the caller's crate.
pub use inventory;
