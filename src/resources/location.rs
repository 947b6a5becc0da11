//! Source descriptor parsing.
use std::fmt;
use std::path::PathBuf;

use crate::error::ParseError;

/// Where an artifact's bytes come from.
///
/// # Examples
///
/// ```
/// use provision_cli::resources::location::{Location, parse_location};
///
/// let remote = parse_location("https://example.com/go.tar.gz").unwrap();
/// assert_eq!(remote, Location::Remote("https://example.com/go.tar.gz".into()));
///
/// let local = parse_location("/srv/mirror/go.tar.gz").unwrap();
/// assert_eq!(local, Location::LocalFile("/srv/mirror/go.tar.gz".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// An `http://` or `https://` URL.
    Remote(String),
    /// A path on the local filesystem.
    LocalFile(PathBuf),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => f.write_str(url),
            Self::LocalFile(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parse a source descriptor into a [`Location`].
///
/// Purely syntactic: nothing is resolved or opened.
///
/// # Errors
///
/// Returns [`ParseError::Empty`] for blank input,
/// [`ParseError::UnsupportedScheme`] for any scheme other than `http`,
/// `https` and `file`, and [`ParseError::MissingHost`] for a URL with nothing
/// after the scheme.
pub fn parse_location(descriptor: &str) -> Result<Location, ParseError> {
    let descriptor = descriptor.trim();
    if descriptor.is_empty() {
        return Err(ParseError::Empty);
    }

    let Some((scheme, rest)) = split_scheme(descriptor) else {
        return Ok(Location::LocalFile(PathBuf::from(descriptor)));
    };

    match scheme.to_ascii_lowercase().as_str() {
        "http" | "https" => {
            if rest.is_empty() || rest.starts_with('/') {
                return Err(ParseError::MissingHost {
                    descriptor: descriptor.to_string(),
                });
            }
            Ok(Location::Remote(descriptor.to_string()))
        }
        "file" if !rest.is_empty() => Ok(Location::LocalFile(PathBuf::from(rest))),
        "file" => Err(ParseError::Empty),
        _ => Err(ParseError::UnsupportedScheme {
            scheme: scheme.to_string(),
            descriptor: descriptor.to_string(),
        }),
    }
}

/// Split `scheme://rest`, where scheme follows RFC 3986
/// (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`).
fn split_scheme(descriptor: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = descriptor.split_once("://")?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some((scheme, rest))
}
