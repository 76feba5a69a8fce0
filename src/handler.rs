//! Action targets and dispatch handlers.
//!
//! A route declares *what* should run as an [`ActionTarget`] parsed from a
//! `module::Class@method` string. The executable side is a typed
//! [`Handler`] registered against that target in a [`HandlerRegistry`],
//! which implements the [`ActionLocator`] seam the router dispatches
//! through. There is no runtime reflection: targets resolve to handlers
//! registered at declaration time, and argument conversion is the handler
//! author's concern via [`crate::Params::get_as`].

use crate::error::{Error, Result};
use crate::params::Params;
use crate::request::RequestContext;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A resolved action reference, parsed once from `module::Class@method`.
///
/// # Examples
///
/// ```
/// use djangology::ActionTarget;
///
/// let target = ActionTarget::parse("app::users::UserController@show").unwrap();
/// assert_eq!(target.class(), "app::users::UserController");
/// assert_eq!(target.method(), "show");
/// assert_eq!(target.to_string(), "app::users::UserController@show");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionTarget {
	class: String,
	method: String,
}

impl ActionTarget {
	/// Parse an action string of the form `module::Class@method`.
	///
	/// # Errors
	///
	/// [`Error::InvalidActionFormat`] when the string does not contain
	/// exactly one `@` separating two non-empty parts.
	pub fn parse(action: &str) -> Result<Self> {
		match action.split_once('@') {
			Some((class, method))
				if !class.is_empty() && !method.is_empty() && !method.contains('@') =>
			{
				Ok(Self {
					class: class.to_string(),
					method: method.to_string(),
				})
			}
			_ => Err(Error::InvalidActionFormat(action.to_string())),
		}
	}

	/// Namespaced class part of the target.
	pub fn class(&self) -> &str {
		&self.class
	}

	/// Method part of the target.
	pub fn method(&self) -> &str {
		&self.method
	}

	/// Replace the method part, keeping the class. Used by resource
	/// expansion to point the five generated routes at their CRUD actions.
	pub(crate) fn with_method(&self, method: &str) -> Self {
		Self {
			class: self.class.clone(),
			method: method.to_string(),
		}
	}
}

impl fmt::Display for ActionTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}@{}", self.class, self.method)
	}
}

/// Minimal dispatch result at the router's boundary. Real response
/// modeling lives in the HTTP layer; the router only carries this through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
	/// Status code the handler decided on.
	pub status: u16,
	/// Response payload.
	pub body: String,
}

impl Response {
	/// 200 with an empty body.
	pub fn ok() -> Self {
		Self {
			status: 200,
			body: String::new(),
		}
	}

	/// 200 with the given body.
	pub fn with_body(body: impl Into<String>) -> Self {
		Self {
			status: 200,
			body: body.into(),
		}
	}
}

/// A dispatchable route action.
///
/// Handlers receive the request context and the captured parameters of the
/// match; they never see or mutate the route table.
pub trait Handler: Send + Sync {
	/// Run the action.
	fn handle(&self, ctx: &RequestContext, params: &Params) -> Result<Response>;
}

impl fmt::Debug for dyn Handler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("dyn Handler")
	}
}

struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
	F: Fn(&RequestContext, &Params) -> Result<Response> + Send + Sync,
{
	fn handle(&self, ctx: &RequestContext, params: &Params) -> Result<Response> {
		(self.0)(ctx, params)
	}
}

/// Wrap a closure as a [`Handler`].
///
/// # Examples
///
/// ```
/// use djangology::{handler_fn, Params, RequestContext, Response};
///
/// let handler = handler_fn(|_ctx, params: &Params| {
///     let id: i64 = params.get_as("id")?;
///     Ok(Response::with_body(format!("user {id}")))
/// });
///
/// let ctx = RequestContext::new("GET", false);
/// let params: Params = [("id", "7")].into_iter().collect();
/// assert_eq!(handler.handle(&ctx, &params).unwrap().body, "user 7");
/// ```
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
	F: Fn(&RequestContext, &Params) -> Result<Response> + Send + Sync + 'static,
{
	Arc::new(FnHandler(f))
}

/// Resolves an action target to an invokable handler.
///
/// This is the collaborator seam between the router and whatever owns the
/// application's controllers. [`HandlerRegistry`] is the default in-process
/// implementation.
pub trait ActionLocator: Send + Sync {
	/// Look up the handler for a target.
	fn resolve(&self, target: &ActionTarget) -> Result<Arc<dyn Handler>>;
}

/// In-process handler registry keyed by the target's string form.
#[derive(Default)]
pub struct HandlerRegistry {
	handlers: RwLock<HashMap<String, Arc<dyn Handler>>>,
}

impl HandlerRegistry {
	/// Create an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a handler for an action string.
	///
	/// # Errors
	///
	/// [`Error::InvalidActionFormat`] when `action` does not parse.
	pub fn register(&self, action: &str, handler: Arc<dyn Handler>) -> Result<()> {
		let target = ActionTarget::parse(action)?;
		self.handlers.write().insert(target.to_string(), handler);
		Ok(())
	}
}

impl ActionLocator for HandlerRegistry {
	fn resolve(&self, target: &ActionTarget) -> Result<Arc<dyn Handler>> {
		self.handlers
			.read()
			.get(&target.to_string())
			.cloned()
			.ok_or_else(|| Error::MissingHandler(target.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("app::Users@show", "app::Users", "show")]
	#[case("Health@check", "Health", "check")]
	fn test_target_parse(#[case] action: &str, #[case] class: &str, #[case] method: &str) {
		let target = ActionTarget::parse(action).unwrap();
		assert_eq!(target.class(), class);
		assert_eq!(target.method(), method);
	}

	#[rstest]
	#[case("no-separator")]
	#[case("@method")]
	#[case("Class@")]
	#[case("Class@a@b")]
	fn test_target_parse_rejects_malformed(#[case] action: &str) {
		let err = ActionTarget::parse(action).unwrap_err();
		assert!(matches!(err, Error::InvalidActionFormat(_)));
	}

	#[rstest]
	fn test_registry_resolves_registered_handler() {
		let registry = HandlerRegistry::new();
		registry
			.register("app::Users@show", handler_fn(|_, _| Ok(Response::ok())))
			.unwrap();

		let target = ActionTarget::parse("app::Users@show").unwrap();
		let handler = registry.resolve(&target).unwrap();
		let ctx = RequestContext::new("GET", false);
		assert_eq!(handler.handle(&ctx, &Params::new()).unwrap().status, 200);
	}

	#[rstest]
	fn test_registry_missing_handler() {
		let registry = HandlerRegistry::new();
		let target = ActionTarget::parse("app::Users@show").unwrap();
		let err = registry.resolve(&target).unwrap_err();
		assert!(matches!(err, Error::MissingHandler(_)));
	}
}
