//! Path pattern compilation.
//!
//! Turns a mount prefix such as `/users/:id(\d+)/files/:path*` into an
//! anchored prefix regex plus the list of keys its capture groups map to.
//!
//! # Syntax
//! - Literal text matches itself (`\` escapes the next character)
//! - `:name` captures one segment, `[^/]+?` by default
//! - `:name(re)` captures with a custom expression (no nested groups)
//! - `(re)` captures anonymously, keyed by position
//! - `*` captures anything, keyed by position
//! - `?`, `*`, `+` after a parameter make it optional/repeated
//!
//! # Design Decisions
//! - Prefix mode: anchored at the start, never required to reach the end
//! - Strict: a trailing `/` in the pattern is significant
//! - A match must end on a segment boundary unless the pattern ends in `/`
//! - Case-insensitive unless compiled with `sensitive = true`

use std::fmt;

use crate::error::MountError;
use crate::mount::params::ParamKey;
use crate::routing::matcher::{Matcher, RawCaptures};

/// A compiled path pattern.
pub struct PathPattern {
    source: String,
    regex: fancy_regex::Regex,
    /// One entry per capture group; `None` groups are not exposed.
    keys: Vec<Option<ParamKey>>,
}

#[derive(Debug)]
enum Token {
    Literal(String),
    Param(Param),
}

#[derive(Debug)]
struct Param {
    key: ParamKey,
    prefix: Option<char>,
    pattern: String,
    optional: bool,
    repeat: bool,
    partial: bool,
}

impl PathPattern {
    /// Compile a case-insensitive pattern.
    pub fn compile(pattern: &str) -> Result<Self, MountError> {
        Self::compile_with(pattern, false)
    }

    pub fn compile_with(pattern: &str, sensitive: bool) -> Result<Self, MountError> {
        let tokens = tokenize(pattern)?;
        let mut route = String::new();
        let mut keys = Vec::new();

        for token in &tokens {
            match token {
                Token::Literal(text) => route.push_str(&fancy_regex::escape(text)),
                Token::Param(param) => {
                    route.push_str(&param_expression(param));
                    keys.push(Some(param.key.clone()));
                }
            }
        }

        if !route.ends_with('/') {
            route.push_str("(?=/|$)");
        }
        let flags = if sensitive { "" } else { "(?i)" };
        let expression = format!("{}^{}", flags, route);

        let regex = fancy_regex::Regex::new(&expression).map_err(|e| MountError::Regex {
            pattern: pattern.to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            keys,
        })
    }

    /// Wrap a caller-supplied regular expression.
    ///
    /// Named groups become named parameters and anonymous groups are dropped.
    /// A regex without any named group exposes every group by position.
    pub fn from_regex(regex: fancy_regex::Regex) -> Self {
        let names: Vec<Option<String>> = regex
            .capture_names()
            .skip(1)
            .map(|name| name.map(str::to_string))
            .collect();

        let keys = if names.iter().any(Option::is_some) {
            names.into_iter().map(|n| n.map(ParamKey::Name)).collect()
        } else {
            (0..names.len()).map(|i| Some(ParamKey::Index(i))).collect()
        };

        Self {
            source: regex.as_str().to_string(),
            regex,
            keys,
        }
    }

    /// The pattern text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Keys exposed by this pattern, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &ParamKey> {
        self.keys.iter().flatten()
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .field("keys", &self.keys)
            .finish()
    }
}

impl Matcher for PathPattern {
    fn captures<'p>(&self, path: &'p str) -> Option<RawCaptures<'p>> {
        let caps = match self.regex.captures(path) {
            Ok(Some(caps)) => caps,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    pattern = %self.source,
                    path = %path,
                    error = %e,
                    "Pattern evaluation failed"
                );
                return None;
            }
        };

        let whole = caps.get(0)?;
        if whole.start() != 0 {
            return None;
        }

        let groups = self
            .keys
            .iter()
            .enumerate()
            .filter_map(|(i, key)| {
                let key = key.as_ref()?;
                let capture = caps.get(i + 1)?;
                Some((key.clone(), capture.as_str()))
            })
            .collect();

        Some(RawCaptures {
            matched: whole.end(),
            groups,
        })
    }
}

fn param_expression(param: &Param) -> String {
    let prefix = param
        .prefix
        .map(|c| fancy_regex::escape(&c.to_string()).into_owned())
        .unwrap_or_default();

    let mut capture = format!("(?:{})", param.pattern);
    if param.repeat {
        capture = format!("{capture}(?:{prefix}{capture})*");
    }

    if param.optional {
        if param.partial {
            format!("{prefix}({capture})?")
        } else {
            format!("(?:{prefix}({capture}))?")
        }
    } else {
        format!("{prefix}({capture})")
    }
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn pattern_error(pattern: &str, offset: usize, reason: &str) -> MountError {
    MountError::Pattern {
        pattern: pattern.to_string(),
        offset,
        reason: reason.to_string(),
    }
}

/// Does a parameter, group or wildcard start at `i`?
fn starts_param(chars: &[(usize, char)], i: usize) -> bool {
    match chars.get(i).map(|&(_, c)| c) {
        Some(':') => chars.get(i + 1).is_some_and(|&(_, c)| is_word(c)),
        Some('(') | Some('*') => true,
        _ => false,
    }
}

fn tokenize(pattern: &str) -> Result<Vec<Token>, MountError> {
    let chars: Vec<(usize, char)> = pattern.char_indices().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut next_index = 0;
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];

        if c == '\\' {
            let (_, escaped) = *chars
                .get(i + 1)
                .ok_or_else(|| pattern_error(pattern, offset, "trailing escape character"))?;
            literal.push(escaped);
            i += 2;
            continue;
        }

        let prefix = match c {
            '/' | '.' if starts_param(&chars, i + 1) => Some(c),
            _ if starts_param(&chars, i) => None,
            _ => {
                literal.push(c);
                i += 1;
                continue;
            }
        };
        if prefix.is_some() {
            i += 1;
        }
        let delimiter = prefix.unwrap_or('/');

        let (start, head) = chars[i];
        let mut name = None;
        let mut custom = None;
        let mut asterisk = false;

        match head {
            ':' => {
                i += 1;
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.get(i).filter(|(_, c)| is_word(*c)) {
                    ident.push(c);
                    i += 1;
                }
                name = Some(ident);
                if chars.get(i).is_some_and(|&(_, c)| c == '(') {
                    let (group, end) = read_group(pattern, &chars, i)?;
                    custom = Some(group);
                    i = end;
                }
            }
            '(' => {
                let (group, end) = read_group(pattern, &chars, i)?;
                custom = Some(group);
                i = end;
            }
            _ => {
                asterisk = true;
                i += 1;
            }
        }

        let modifier = if asterisk {
            None
        } else {
            match chars.get(i).map(|&(_, c)| c) {
                Some(m @ ('?' | '*' | '+')) => {
                    i += 1;
                    Some(m)
                }
                _ => None,
            }
        };

        let following = chars.get(i).map(|&(_, c)| c);
        let partial = matches!((prefix, following), (Some(p), Some(n)) if n != p);

        let key = match name {
            Some(name) => ParamKey::Name(name),
            None => {
                let key = ParamKey::Index(next_index);
                next_index += 1;
                key
            }
        };

        let pattern_text = match custom {
            Some(custom) => custom,
            None if asterisk => ".*".to_string(),
            None => format!("[^{}]+?", fancy_regex::escape(&delimiter.to_string())),
        };

        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(Token::Param(Param {
            key,
            prefix,
            pattern: pattern_text,
            optional: matches!(modifier, Some('?') | Some('*')),
            repeat: matches!(modifier, Some('+') | Some('*')),
            partial,
        }));
        tracing::trace!(pattern = %pattern, offset = start, "Parsed pattern parameter");
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

/// Read a `( ... )` group starting at `open`. Returns the inner expression
/// and the index just past the closing parenthesis.
fn read_group(
    pattern: &str,
    chars: &[(usize, char)],
    open: usize,
) -> Result<(String, usize), MountError> {
    let (open_offset, _) = chars[open];
    let mut inner = String::new();
    let mut i = open + 1;

    while let Some(&(offset, c)) = chars.get(i) {
        match c {
            '\\' => {
                let (_, escaped) = *chars
                    .get(i + 1)
                    .ok_or_else(|| pattern_error(pattern, offset, "trailing escape character"))?;
                inner.push('\\');
                inner.push(escaped);
                i += 2;
            }
            '(' => {
                return Err(pattern_error(
                    pattern,
                    offset,
                    "capturing groups are not allowed inside a parameter expression",
                ))
            }
            ')' => {
                if inner.is_empty() {
                    return Err(pattern_error(pattern, open_offset, "empty group"));
                }
                return Ok((inner, i + 1));
            }
            _ => {
                inner.push(c);
                i += 1;
            }
        }
    }

    Err(pattern_error(pattern, open_offset, "unterminated group"))
}
