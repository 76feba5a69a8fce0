//! Error types for the routing engine.
//!
//! Every variant is a programmer or configuration error surfaced
//! synchronously to the caller; nothing here is retried internally.
//! Cache I/O is the one failure category the router degrades on instead
//! of raising (see [`crate::cache`]).

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Routing error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A `<name>` token referenced a custom pattern that was never registered.
	#[error("no custom pattern registered for token `{0}`")]
	MissingPattern(String),

	/// A custom or inline pattern fragment failed to build as a regex.
	#[error("pattern for `{path}` failed to compile: {source}")]
	PatternSyntax {
		/// The route path whose pattern failed.
		path: String,
		#[source]
		source: regex::Error,
	},

	/// No route in the table satisfied the incoming path and context.
	#[error("no route matched path `{0}`")]
	NoMatch(String),

	/// Dispatch was requested before any route matched successfully.
	#[error("dispatch called without a matched route")]
	NotMatched,

	/// Filter lookup by key failed.
	#[error("unknown filter `{0}`")]
	MissingFilter(String),

	/// Route lookup by name failed.
	#[error("unknown route `{0}`")]
	MissingRoute(String),

	/// Request segment lookup by key failed.
	#[error("unknown request segment `{0}`")]
	MissingSegment(String),

	/// An action string did not parse as `module::Class@method`.
	#[error("invalid action target `{0}`, expected `module::Class@method`")]
	InvalidActionFormat(String),

	/// No handler is registered for a resolved action target.
	#[error("no handler registered for action `{0}`")]
	MissingHandler(String),

	/// A captured parameter could not be converted to the requested type.
	#[error("invalid value `{value}` for parameter `{name}`")]
	InvalidParam {
		/// Parameter name as declared in the path template.
		name: String,
		/// Raw captured value.
		value: String,
	},

	/// Free-form failure raised by a user-supplied filter or handler.
	#[error("{0}")]
	Custom(String),
}

impl Error {
	/// Build a [`Error::Custom`] from any displayable message.
	///
	/// # Examples
	///
	/// ```
	/// use djangology::Error;
	///
	/// let err = Error::custom("rate limit exceeded");
	/// assert_eq!(err.to_string(), "rate limit exceeded");
	/// ```
	pub fn custom(message: impl Into<String>) -> Self {
		Self::Custom(message.into())
	}
}
