//! Path-template compiler.
//!
//! Turns a declared path template into a single regex body plus an ordered
//! token list. Four token grammars are recognized:
//!
//! - `<name>` / `<name:regex>`: named custom pattern, inline form registers
//!   the fragment for reuse by later tokens
//! - `{name}`: alpha class (`[a-z_\-+]+`, case-insensitive at match time)
//! - `[name]`: numeric class (`[0-9.]+`)
//! - `(name)`: wildcard (`.*`)
//!
//! Any token may carry a trailing `?` inside the brackets to mark the
//! segment optional; the literal slash in front of an optional segment
//! becomes part of the optional group.
//!
//! Tokens of all styles are discovered in a single left-to-right pass, so
//! the token list order always equals template order and therefore the
//! positional binding order of capturing groups.
//!
//! The returned pattern body is un-anchored; [`crate::route::Route`] applies
//! `^...$` and case-insensitivity when it builds the final regex.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Maximum compiled regex size, guarding against pathological custom
/// patterns (same limit the client-side pattern compiler uses).
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// One token per capturing group, in left-to-right template order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Name the captured value binds to.
	pub name: String,
	/// True when the segment may be absent from the matched path.
	pub optional: bool,
}

/// Result of compiling a path template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledPattern {
	/// Un-anchored regex body.
	pub pattern: String,
	/// One entry per capturing group, in order of appearance.
	pub tokens: Vec<Token>,
	/// True when the template contains no tokens at all.
	pub is_static: bool,
	/// Custom patterns after inline registration, keyed by token name.
	pub patterns: IndexMap<String, String>,
}

/// Matches any of the four token grammars. Alternation order puts `<...>`
/// first so an inline regex containing `[`, `{` or `(` cannot be mistaken
/// for a shorthand token.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"<([^<>]+)>|\{([^{}]+)\}|\[([^\[\]]+)\]|\(([^()]+)\)").expect("token grammar regex")
});

/// Compile a path template against a set of named custom patterns.
///
/// The input `patterns` map is taken by value and returned (possibly
/// enriched with inline registrations) inside [`CompiledPattern`], so the
/// computation stays pure: compiling the same `(path, patterns)` pair twice
/// yields identical output.
///
/// # Errors
///
/// [`Error::MissingPattern`] when a `<name>` token has no registered custom
/// pattern at the point it is resolved.
///
/// # Examples
///
/// ```
/// use djangology::pattern;
/// use indexmap::IndexMap;
///
/// let compiled = pattern::compile("/users/[id]", IndexMap::new()).unwrap();
/// assert_eq!(compiled.pattern, r"\/users\/([0-9.]+)\/?");
/// assert_eq!(compiled.tokens.len(), 1);
/// assert_eq!(compiled.tokens[0].name, "id");
/// assert!(!compiled.is_static);
/// ```
pub fn compile(path: &str, mut patterns: IndexMap<String, String>) -> Result<CompiledPattern> {
	// `/` and `.` are regex metacharacters that must match literally.
	let escaped = path.replace('/', r"\/").replace('.', r"\.");

	let mut out = String::with_capacity(escaped.len());
	let mut tokens = Vec::new();
	let mut last = 0;

	for caps in TOKEN_RE.captures_iter(&escaped) {
		let whole = caps.get(0).expect("match always has group 0");
		out.push_str(&escaped[last..whole.start()]);

		let (kind, inner) = token_kind(&caps);

		let mut name = inner.to_string();
		let optional = name.ends_with('?');
		if optional {
			name.pop();
		}

		// `name:fragment` registers the fragment for this token and any
		// later token reusing the same name.
		let token_name = match name.split_once(':') {
			Some((token_name, inline)) => {
				patterns.insert(token_name.to_string(), inline.to_string());
				token_name.to_string()
			}
			None => name,
		};

		let fragment = match kind {
			TokenKind::Alpha => r"([a-z_\-+]+)".to_string(),
			TokenKind::Numeric => r"([0-9.]+)".to_string(),
			TokenKind::Wildcard => r"(.*)".to_string(),
			TokenKind::Custom => {
				let stored = patterns
					.get(&token_name)
					.ok_or_else(|| Error::MissingPattern(token_name.clone()))?;
				// Remove every paren from the stored pattern, wrapping or
				// interior, so the fragment contributes exactly one
				// capturing group and tokens stay aligned with groups.
				format!("({})", stored.replace(['(', ')'], ""))
			}
		};

		if optional {
			// The static slash before an optional segment must itself
			// become optional, so it moves inside the group.
			if out.ends_with(r"\/") {
				out.truncate(out.len() - 2);
				out.push_str(r"(?:\/");
			} else {
				out.push_str("(?:");
			}
			out.push_str(&fragment);
			out.push_str(")?");
		} else {
			out.push_str(&fragment);
		}

		tokens.push(Token {
			name: token_name,
			optional,
		});
		last = whole.end();
	}
	out.push_str(&escaped[last..]);

	let is_static = tokens.is_empty();

	// Tolerate an optional trailing slash everywhere except the root route.
	if path != "/" {
		out.push_str(r"\/?");
	}

	Ok(CompiledPattern {
		pattern: out,
		tokens,
		is_static,
		patterns,
	})
}

/// Build the anchored, case-insensitive matcher for a compiled pattern body.
pub(crate) fn build_regex(pattern: &str, path: &str) -> Result<Regex> {
	RegexBuilder::new(&format!("^{}$", pattern))
		.case_insensitive(true)
		.size_limit(MAX_REGEX_SIZE)
		.build()
		.map_err(|source| Error::PatternSyntax {
			path: path.to_string(),
			source,
		})
}

enum TokenKind {
	Custom,
	Alpha,
	Numeric,
	Wildcard,
}

fn token_kind<'t>(caps: &regex::Captures<'t>) -> (TokenKind, &'t str) {
	if let Some(m) = caps.get(1) {
		(TokenKind::Custom, m.as_str())
	} else if let Some(m) = caps.get(2) {
		(TokenKind::Alpha, m.as_str())
	} else if let Some(m) = caps.get(3) {
		(TokenKind::Numeric, m.as_str())
	} else {
		(
			TokenKind::Wildcard,
			caps.get(4).expect("one alternative always matches").as_str(),
		)
	}
}
