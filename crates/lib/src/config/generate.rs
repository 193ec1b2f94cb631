//! `@GEN` directive parsing and secret generation.
//!
//! A directive whose entire text matches the `@GEN` shape is replaced by a
//! freshly generated random string instead of being used literally:
//!
//! - `@GEN` - length 10, default keyspace
//! - `@GEN(16)` - length 16, default keyspace
//! - `@GEN(16;0123456789abcdef)` - length 16, custom keyspace
//!
//! Anything else, including near-misses like `@GEN(x)` or `@GEN (5)`, is a
//! literal directive value.

use rand::Rng;

/// Keyspace used when no charset parameter is given (or it is empty).
pub const DEFAULT_KEYSPACE: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_*-+!$%=";

/// Default generated length when no length parameter is given.
pub const DEFAULT_LENGTH: usize = 10;

/// A parsed `@GEN` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenSpec {
  pub length: usize,
  pub charset: Option<String>,
}

/// Parse a directive as a `@GEN` spec.
///
/// Returns `None` if the directive is not a generation directive and should
/// be treated as a literal value. The shape is strict: an optional
/// parenthesized length (digits only), optionally followed by `;` and a
/// charset that runs to the closing parenthesis.
pub fn parse(directive: &str) -> Option<GenSpec> {
  let rest = directive.strip_prefix("@GEN")?;

  if rest.is_empty() {
    return Some(GenSpec {
      length: DEFAULT_LENGTH,
      charset: None,
    });
  }

  let args = rest.strip_prefix('(')?.strip_suffix(')')?;

  let (length_str, charset) = match args.split_once(';') {
    Some((length, charset)) => (length, Some(charset.to_string())),
    None => (args, None),
  };

  if length_str.is_empty() || !length_str.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }

  let length = length_str.parse().ok()?;

  Some(GenSpec { length, charset })
}

/// Generate a random string of `length` characters drawn uniformly from
/// `charset` (or [`DEFAULT_KEYSPACE`] when empty or absent).
///
/// Uses `rand::rng()`, a cryptographically strong generator, with each
/// character chosen independently.
pub fn generate(length: usize, charset: Option<&str>) -> String {
  let keyspace = match charset {
    Some(cs) if !cs.is_empty() => cs,
    _ => DEFAULT_KEYSPACE,
  };
  let chars: Vec<char> = keyspace.chars().collect();
  let mut rng = rand::rng();

  (0..length).map(|_| chars[rng.random_range(0..chars.len())]).collect()
}

/// Evaluate a raw directive into its fact value.
///
/// `@GEN` directives produce a fresh random string; everything else is
/// returned verbatim.
pub fn evaluate(directive: &str) -> String {
  match parse(directive) {
    Some(spec) => generate(spec.length, spec.charset.as_deref()),
    None => directive.to_string(),
  }
}
