//! Declarative route registration.
//!
//! Crates can announce routes at compile time with [`register_route!`];
//! a router picks them all up with [`Router::map_registered`]. Entries
//! are static data only, so handlers still have to be attached through
//! the handler registry or an external locator.

use crate::error::Result;
use crate::route::Route;
use crate::router::Router;

/// A route announced via `inventory`, gathered at link time.
pub struct RouteRegistration {
	/// Name the route is stored under.
	pub name: &'static str,
	/// Path expression with tokens.
	pub path: &'static str,
	/// Action string, `module::Class@method`.
	pub action: &'static str,
	/// Allowed methods; empty means any.
	pub methods: &'static [&'static str],
}

inventory::collect!(RouteRegistration);

/// Announce a route from anywhere in the dependency graph.
///
/// # Examples
///
/// ```
/// use djangology::{Router, register_route};
///
/// register_route!("pages.about", "/about", "pages::Static@about", ["get", "head"]);
///
/// let mut router = Router::new();
/// router.map_registered().unwrap();
/// assert!(router.get_route("pages.about").is_ok());
/// ```
#[macro_export]
macro_rules! register_route {
	($name:literal, $path:literal, $action:literal) => {
		$crate::register_route!($name, $path, $action, []);
	};
	($name:literal, $path:literal, $action:literal, [$($method:literal),* $(,)?]) => {
		$crate::inventory::submit! {
			$crate::RouteRegistration {
				name: $name,
				path: $path,
				action: $action,
				methods: &[$($method),*],
			}
		}
	};
}

impl Router {
	/// Map every route announced through [`register_route!`].
	///
	/// Entries are mapped through the ordinary registration path, so open
	/// group overlays apply. Link-section order is not defined across
	/// crates; when relative priority matters, map routes explicitly
	/// instead.
	pub fn map_registered(&mut self) -> Result<()> {
		for entry in inventory::iter::<RouteRegistration> {
			let mut route = Route::new(entry.path, entry.action)?;
			if !entry.methods.is_empty() {
				route = route.with_methods(entry.methods);
			}
			self.map(entry.name, route);
		}
		Ok(())
	}
}
