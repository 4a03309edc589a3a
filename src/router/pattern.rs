//! Route pattern compiler.
//!
//! Turns a declaration such as `/posts/{slug}` into a [`Matcher`]: an ordered list of
//! literal and capture segments plus the anchored regex used on the dispatch path.
//!
//! # Capture kinds
//!
//! The kind of a capture is decided by its name alone:
//!
//! | Placeholder | Kind                   | Accepts              |
//! |-------------|------------------------|----------------------|
//! | `{id}`      | [`CaptureKind::Numeric`] | `[0-9]+`           |
//! | anything else | [`CaptureKind::Generic`] | `[A-Za-z0-9_-]+` |
//!
//! Captured values are returned as raw strings; nothing is coerced to an integer.

use regex::Regex;
use std::fmt;

use super::core::{Captures, MAX_INLINE_PARAMS};

/// Placeholder name that compiles to a numeric capture.
pub const NUMERIC_PARAM: &str = "id";

const NUMERIC_CLASS: &str = "[0-9]+";
const GENERIC_CLASS: &str = "[A-Za-z0-9_-]+";

/// What a capture segment accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    /// One or more ASCII digits.
    Numeric,
    /// One or more ASCII letters, digits, hyphens or underscores.
    Generic,
}

impl CaptureKind {
    /// Kind assigned to a placeholder with the given name.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        if name == NUMERIC_PARAM {
            CaptureKind::Numeric
        } else {
            CaptureKind::Generic
        }
    }

    fn class(self) -> &'static str {
        match self {
            CaptureKind::Numeric => NUMERIC_CLASS,
            CaptureKind::Generic => GENERIC_CLASS,
        }
    }

    /// Check a single candidate value without going through the regex.
    #[must_use]
    pub fn accepts(self, value: &str) -> bool {
        !value.is_empty()
            && match self {
                CaptureKind::Numeric => value.bytes().all(|b| b.is_ascii_digit()),
                CaptureKind::Generic => value
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'),
            }
    }
}

/// One `/`-separated piece of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Capture { name: String, kind: CaptureKind },
}

/// Why a route declaration was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The declaration was the empty string.
    Empty,
    /// The declaration does not start with `/`.
    MissingLeadingSlash { pattern: String },
    /// Two consecutive slashes inside the declaration.
    EmptySegment { pattern: String },
    /// A `{` without a closing `}` or a stray `}`.
    UnbalancedBrace { pattern: String },
    /// Placeholder name is empty or uses characters other than letters and `_`.
    InvalidParamName { pattern: String, name: String },
    /// A placeholder shares its segment with literal text, e.g. `post-{id}`.
    PartialSegment { pattern: String, segment: String },
    /// The same placeholder name appears twice in one declaration.
    DuplicateParam { pattern: String, name: String },
    /// The generated regex did not compile.
    Regex { pattern: String, message: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Empty => write!(f, "route pattern is empty"),
            PatternError::MissingLeadingSlash { pattern } => {
                write!(f, "route pattern '{pattern}' must start with '/'")
            }
            PatternError::EmptySegment { pattern } => {
                write!(f, "route pattern '{pattern}' contains an empty segment")
            }
            PatternError::UnbalancedBrace { pattern } => {
                write!(f, "route pattern '{pattern}' has unbalanced braces")
            }
            PatternError::InvalidParamName { pattern, name } => write!(
                f,
                "route pattern '{pattern}' has invalid placeholder name '{name}' \
                 (letters and '_' only)"
            ),
            PatternError::PartialSegment { pattern, segment } => write!(
                f,
                "route pattern '{pattern}': placeholder must fill the whole segment, got '{segment}'"
            ),
            PatternError::DuplicateParam { pattern, name } => {
                write!(f, "route pattern '{pattern}' declares '{{{name}}}' more than once")
            }
            PatternError::Regex { pattern, message } => {
                write!(f, "route pattern '{pattern}' failed to compile: {message}")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Compiled form of a route declaration.
///
/// Two matchers compiled from the same declaration compare equal.
#[derive(Debug, Clone)]
pub struct Matcher {
    segments: Vec<Segment>,
    regex: Regex,
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments && self.regex.as_str() == other.regex.as_str()
    }
}

impl Eq for Matcher {}

impl Matcher {
    /// Segments in declaration order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in left-to-right order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Number of capture segments.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.param_names().count()
    }

    /// Anchored regex source, e.g. `^/posts/([A-Za-z0-9_-]+)$`.
    #[must_use]
    pub fn regex_source(&self) -> &str {
        self.regex.as_str()
    }

    /// Test a normalised path.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match a normalised path and return the captured values in order.
    ///
    /// The whole-match group is dropped; only per-placeholder groups are kept.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Captures> {
        let caps = self.regex.captures(path)?;
        let mut out = Captures::with_capacity(caps.len().saturating_sub(1).min(MAX_INLINE_PARAMS));
        for group in caps.iter().skip(1) {
            // Every group is mandatory in the generated regex.
            out.push(group.map(|m| m.as_str().to_owned()).unwrap_or_default());
        }
        Some(out)
    }
}

/// Compile a route declaration.
///
/// `/` compiles to a root matcher that accepts both `""` and `"/"`. Every other
/// declaration has one trailing `/` removed first so it lines up with request path
/// normalisation.
///
/// # Errors
///
/// Returns a [`PatternError`] describing the first problem found.
pub fn compile(pattern: &str) -> Result<Matcher, PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }
    if !pattern.starts_with('/') {
        return Err(PatternError::MissingLeadingSlash {
            pattern: pattern.to_owned(),
        });
    }

    let body = if pattern == "/" {
        ""
    } else {
        pattern.strip_suffix('/').unwrap_or(pattern)
    };

    let segments = parse_segments(pattern, body)?;

    let mut source = String::with_capacity(body.len() + 16);
    source.push('^');
    if segments.is_empty() {
        source.push_str("/?");
    }
    for segment in &segments {
        source.push('/');
        match segment {
            Segment::Literal(text) => source.push_str(&regex::escape(text)),
            Segment::Capture { kind, .. } => {
                source.push('(');
                source.push_str(kind.class());
                source.push(')');
            }
        }
    }
    source.push('$');

    let regex = Regex::new(&source).map_err(|e| PatternError::Regex {
        pattern: pattern.to_owned(),
        message: e.to_string(),
    })?;

    Ok(Matcher { segments, regex })
}

fn parse_segments(pattern: &str, body: &str) -> Result<Vec<Segment>, PatternError> {
    let mut segments = Vec::new();
    if body.is_empty() {
        return Ok(segments);
    }

    // `body` starts with '/', so the first split item is always empty.
    for raw in body.split('/').skip(1) {
        if raw.is_empty() {
            return Err(PatternError::EmptySegment {
                pattern: pattern.to_owned(),
            });
        }

        let opens = raw.matches('{').count();
        let closes = raw.matches('}').count();
        if opens != closes {
            return Err(PatternError::UnbalancedBrace {
                pattern: pattern.to_owned(),
            });
        }
        if opens == 0 {
            segments.push(Segment::Literal(raw.to_owned()));
            continue;
        }

        let name = match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) if opens == 1 => inner,
            _ => {
                return Err(PatternError::PartialSegment {
                    pattern: pattern.to_owned(),
                    segment: raw.to_owned(),
                })
            }
        };

        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphabetic() || b == b'_') {
            return Err(PatternError::InvalidParamName {
                pattern: pattern.to_owned(),
                name: name.to_owned(),
            });
        }

        let duplicate = segments
            .iter()
            .any(|s| matches!(s, Segment::Capture { name: n, .. } if n == name));
        if duplicate {
            return Err(PatternError::DuplicateParam {
                pattern: pattern.to_owned(),
                name: name.to_owned(),
            });
        }

        segments.push(Segment::Capture {
            name: name.to_owned(),
            kind: CaptureKind::for_name(name),
        });
    }

    Ok(segments)
}
