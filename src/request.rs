//! Request-side collaborators.
//!
//! The router never parses HTTP itself. It consumes an already-parsed view
//! of the inbound request through two small seams:
//!
//! - [`RequestMeta`]: raw transport facts read once at router construction
//!   to populate the segment map and the mount base
//! - [`RequestContext`]: the method/security pair threaded explicitly into
//!   every match call, so route checks never read ambient process state

use crate::error::{Error, Result};
use indexmap::IndexMap;

/// Transport-layer request metadata, read once at router construction.
///
/// Implemented by whatever fronts the process (an HTTP server adapter, a
/// test fixture, a CLI shim). All accessors return owned data because the
/// router snapshots them into [`Segments`] immediately.
pub trait RequestMeta {
	/// HTTP method of the inbound request, any casing.
	fn method(&self) -> String;
	/// Whether the connection is HTTPS-equivalent.
	fn is_secure(&self) -> bool;
	/// Filesystem document root the application is served from.
	fn document_root(&self) -> String;
	/// Filesystem path of the executing script/binary entry point.
	fn script_path(&self) -> String;
	/// Request path, without query string.
	fn path(&self) -> String;
	/// Raw query string, empty when absent.
	fn query(&self) -> String;
	/// Host name from the request.
	fn host(&self) -> String;
	/// Port the request arrived on.
	fn port(&self) -> u16;
}

/// The per-request facts a route check needs, passed explicitly.
///
/// # Examples
///
/// ```
/// use djangology::RequestContext;
///
/// let ctx = RequestContext::new("GET", false);
/// assert_eq!(ctx.method(), "get");
/// assert!(!ctx.is_secure());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
	method: String,
	secure: bool,
}

impl RequestContext {
	/// Build a context from a method (any casing) and a security flag.
	pub fn new(method: impl AsRef<str>, secure: bool) -> Self {
		Self {
			method: method.as_ref().to_lowercase(),
			secure,
		}
	}

	/// Build a context from transport metadata.
	pub fn from_meta(meta: &dyn RequestMeta) -> Self {
		Self::new(meta.method(), meta.is_secure())
	}

	/// Lower-cased request method.
	pub fn method(&self) -> &str {
		&self.method
	}

	/// Whether the connection satisfies `secure` route constraints.
	pub fn is_secure(&self) -> bool {
		self.secure
	}
}

/// Read-only facts about the current request, keyed by segment name.
///
/// Populated once from [`RequestMeta`]; lookups fail with
/// [`Error::MissingSegment`] for unknown keys.
#[derive(Debug, Clone, Default)]
pub struct Segments {
	values: IndexMap<String, String>,
	base: String,
}

impl Segments {
	/// Snapshot transport metadata into the segment map and derive the
	/// mount base by diffing the document root against the script directory.
	pub fn from_meta(meta: &dyn RequestMeta) -> Self {
		let mut values = IndexMap::new();
		values.insert("path".to_string(), meta.path());
		values.insert(
			"scheme".to_string(),
			if meta.is_secure() { "https" } else { "http" }.to_string(),
		);
		values.insert("query".to_string(), meta.query());
		values.insert("host".to_string(), meta.host());
		values.insert("port".to_string(), meta.port().to_string());

		Self {
			values,
			base: derive_base(&meta.document_root(), &meta.script_path()),
		}
	}

	/// Look up a segment value by key.
	pub fn get(&self, key: &str) -> Result<&str> {
		self.values
			.get(key)
			.map(String::as_str)
			.ok_or_else(|| Error::MissingSegment(key.to_string()))
	}

	/// URL sub-path the application is mounted under, `""` at domain root.
	pub fn base(&self) -> &str {
		&self.base
	}
}

/// The sub-path an app lives under when it is not mounted at the domain
/// root: the script's directory with the document root prefix removed.
fn derive_base(document_root: &str, script_path: &str) -> String {
	let script_dir = match script_path.rfind('/') {
		Some(idx) => &script_path[..idx],
		None => "",
	};
	let root = document_root.trim_end_matches('/');
	match script_dir.strip_prefix(root) {
		Some(rest) if !rest.is_empty() => rest.to_string(),
		_ => String::new(),
	}
}
