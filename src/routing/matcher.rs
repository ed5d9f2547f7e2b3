//! Mount path matching.
//!
//! # Responsibilities
//! - Match the active request path against a mount prefix
//! - Compute the remainder path left after the prefix
//! - Decode captured segments into a `ParamSet`
//!
//! # Design Decisions
//! - The root mount (`/`) matches everything without consulting a matcher
//! - The remainder is always rooted: an empty remainder becomes `/`
//! - Percent-decoding never fails; malformed input is kept verbatim

use std::fmt;
use std::sync::Arc;

use percent_encoding::percent_decode_str;

use crate::error::MountError;
use crate::mount::params::{ParamKey, ParamSet};
use crate::routing::pattern::PathPattern;

/// Captures produced by a matcher before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCaptures<'p> {
    /// Length in bytes of the matched prefix.
    pub matched: usize,
    /// Exposed groups in declaration order. Groups that did not participate
    /// in the match are absent.
    pub groups: Vec<(ParamKey, &'p str)>,
}

/// Trait for anything that can match the start of a path.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns the captures of a match anchored at the start of `path`.
    fn captures<'p>(&self, path: &'p str) -> Option<RawCaptures<'p>>;
}

impl<M: Matcher + ?Sized> Matcher for Arc<M> {
    fn captures<'p>(&self, path: &'p str) -> Option<RawCaptures<'p>> {
        (**self).captures(path)
    }
}

/// Result of a successful mount match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// Path left after stripping the matched prefix, always starting with `/`.
    pub remainder: String,
    /// Decoded captures.
    pub params: ParamSet,
}

/// Where a mount is attached.
#[derive(Debug, Clone)]
pub enum MountPath {
    /// Matches every path and rewrites nothing.
    Root,
    /// Matches paths through a compiled matcher.
    Prefix {
        source: String,
        matcher: Arc<dyn Matcher>,
    },
}

impl MountPath {
    /// Parse a literal prefix or path pattern. It must begin with `/`.
    pub fn parse(prefix: &str) -> Result<Self, MountError> {
        Self::parse_with(prefix, false)
    }

    pub fn parse_with(prefix: &str, sensitive: bool) -> Result<Self, MountError> {
        if !prefix.starts_with('/') {
            return Err(MountError::InvalidPrefix(prefix.to_string()));
        }
        if prefix == "/" {
            return Ok(MountPath::Root);
        }
        let pattern = PathPattern::compile_with(prefix, sensitive)?;
        Ok(MountPath::Prefix {
            source: prefix.to_string(),
            matcher: Arc::new(pattern),
        })
    }

    /// Use an already compiled matcher.
    pub fn from_matcher(source: impl Into<String>, matcher: impl Matcher + 'static) -> Self {
        MountPath::Prefix {
            source: source.into(),
            matcher: Arc::new(matcher),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, MountPath::Root)
    }

    /// Human-readable form for logging.
    pub fn source(&self) -> &str {
        match self {
            MountPath::Root => "/",
            MountPath::Prefix { source, .. } => source,
        }
    }

    /// Match `path`, returning the remainder and decoded params.
    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        let matcher = match self {
            MountPath::Root => {
                return Some(PathMatch {
                    remainder: path.to_string(),
                    params: ParamSet::new(),
                })
            }
            MountPath::Prefix { matcher, .. } => matcher,
        };

        let captures = matcher.captures(path)?;
        let rest = path.get(captures.matched..)?;

        let mut params = ParamSet::new();
        for (key, raw) in captures.groups {
            params.insert(key, safe_decode(raw));
        }

        Some(PathMatch {
            remainder: rooted(rest),
            params,
        })
    }
}

impl From<PathPattern> for MountPath {
    fn from(pattern: PathPattern) -> Self {
        MountPath::from_matcher(pattern.source().to_string(), pattern)
    }
}

fn rooted(rest: &str) -> String {
    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}

/// Percent-decode a captured segment, falling back to the raw text when it
/// holds a malformed escape or does not decode to UTF-8.
pub fn safe_decode(raw: &str) -> String {
    if raw.is_empty() || !raw.contains('%') {
        return raw.to_string();
    }
    if !has_valid_escapes(raw) {
        return raw.to_string();
    }
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}
