//! Captured path parameters.
//!
//! A successful match binds capturing groups to token names in template
//! order. Values are stored as raw strings; typed extraction is the
//! handler author's responsibility and goes through [`Params::get_as`].

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered map of parameter name to captured value.
///
/// Iteration order is token order in the path template, which is also
/// left-to-right order of the capturing groups in the compiled pattern.
///
/// # Examples
///
/// ```
/// use djangology::Params;
///
/// let mut params = Params::new();
/// params.insert("id", "42");
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get_as::<i64>("id").unwrap(), 42);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params(IndexMap<String, String>);

impl Params {
	/// Create an empty parameter map.
	pub fn new() -> Self {
		Self(IndexMap::new())
	}

	/// Insert a captured value, replacing any previous binding.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.0.insert(name.into(), value.into());
	}

	/// Look up a raw captured value.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	/// Convert a captured value into a `FromStr` type.
	///
	/// Fails with [`Error::MissingSegment`]-style lookup semantics rolled
	/// into [`Error::InvalidParam`]: an absent key reports its name with an
	/// empty value.
	pub fn get_as<T: std::str::FromStr>(&self, name: &str) -> Result<T> {
		let raw = self.get(name).ok_or_else(|| Error::InvalidParam {
			name: name.to_string(),
			value: String::new(),
		})?;
		raw.parse().map_err(|_| Error::InvalidParam {
			name: name.to_string(),
			value: raw.to_string(),
		})
	}

	/// Number of bound parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// True when no parameter was bound (static route or exact-equality match).
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterate bindings in token order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}
}
