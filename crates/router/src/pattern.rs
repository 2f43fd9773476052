//! Path pattern compilation and matching.
//!
//! A pattern is compiled once at registration time into a sequence of segment
//! matchers and evaluated against request paths during dispatch. Matching is a
//! pure function: it returns a [`PatternMatch`] value and never stores state on
//! the shared pattern, so compiled patterns can be evaluated concurrently from
//! any number of in-flight requests.
//!
//! Supported pattern forms:
//!
//! - literal segments: `/users/all`
//! - named parameters: `/users/:id`, with modifiers `:id?` (optional),
//!   `:rest*` (zero or more segments), `:rest+` (one or more segments)
//! - wildcards: `/files/*`, captured under index keys `"0"`, `"1"`, ...;
//!   the separator is part of the wildcard, so `/files/*` matches `/files/`
//!   (empty capture) but not bare `/files`
//! - whole-path regular expressions via [`PathSpec::Regex`], capture groups
//!   keyed by group name or index
//!
//! Compilation options:
//!
//! - `case_sensitive`: literal segments compare case-sensitively
//! - `strict`: a trailing slash is significant
//! - `end`: the pattern must consume the entire path (terminal routes); when
//!   false only a prefix is required and its byte length is reported so the
//!   dispatcher can strip it (middleware and mounted routers)

use crate::error::PatternError;
use crate::params::Params;
use regex::{Regex, RegexBuilder};

/// A path specification handed to the registration API: either a path pattern
/// string or a regular expression source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSpec {
    Path(String),
    Regex(String),
}

impl From<&str> for PathSpec {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for PathSpec {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl PathSpec {
    pub(crate) fn raw(&self) -> &str {
        match self {
            Self::Path(path) | Self::Regex(path) => path,
        }
    }
}

/// Shorthand for registering a regular-expression path.
pub fn regex(source: impl Into<String>) -> PathSpec {
    PathSpec::Regex(source.into())
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PatternOptions {
    pub case_sensitive: bool,
    pub strict: bool,
    pub end: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        PatternOptions { case_sensitive: false, strict: false, end: true }
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Param { name: String, modifier: Modifier },
    Wildcard { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Debug, Clone)]
enum PatternKind {
    /// The `"/"` prefix pattern: matches every path, strips nothing.
    FastSlash,
    Segments(Vec<Segment>),
    Regex(Regex),
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    kind: PatternKind,
    keys: Vec<String>,
    case_sensitive: bool,
    strict: bool,
    end: bool,
    trailing_slash: bool,
}

/// The result of a successful match: captured parameters plus the byte length
/// of the matched prefix (meaningful for prefix patterns).
#[derive(Debug, Clone)]
pub struct PatternMatch {
    prefix_len: usize,
    params: Params,
}

impl PatternMatch {
    #[inline]
    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// A path segment with its end byte offset in the original path.
struct Part<'path> {
    text: &'path str,
    end: usize,
}

impl Pattern {
    /// Compiles a full-path pattern with default options, for standalone use
    /// outside a [`Router`](crate::Router).
    pub fn parse(spec: impl Into<PathSpec>) -> Result<Pattern, PatternError> {
        Self::compile(&spec.into(), PatternOptions::default())
    }

    pub(crate) fn compile(spec: &PathSpec, options: PatternOptions) -> Result<Pattern, PatternError> {
        match spec {
            PathSpec::Path(path) => Self::compile_path(path, options),
            PathSpec::Regex(source) => Self::compile_regex(source, options),
        }
    }

    fn compile_path(path: &str, options: PatternOptions) -> Result<Pattern, PatternError> {
        if !path.starts_with('/') {
            return Err(PatternError::missing_leading_slash(path));
        }

        if path == "/" {
            let kind = if options.end { PatternKind::Segments(Vec::new()) } else { PatternKind::FastSlash };
            return Ok(Self::new(path, kind, Vec::new(), options, false));
        }

        let (pieces, trailing_slash) = {
            let trimmed = &path[1..];
            let trailing = trimmed.ends_with('/');
            let body = if trailing { &trimmed[..trimmed.len() - 1] } else { trimmed };
            (body.split('/').collect::<Vec<_>>(), trailing)
        };

        let mut segments = Vec::with_capacity(pieces.len());
        let mut keys = Vec::new();
        let mut wildcards = 0;

        for piece in pieces {
            if piece.is_empty() {
                return Err(PatternError::empty_segment(path));
            }
            if piece == "*" {
                segments.push(Segment::Wildcard { index: wildcards });
                keys.push(wildcards.to_string());
                wildcards += 1;
                continue;
            }
            if let Some(param) = piece.strip_prefix(':') {
                let (name, modifier) = match param.as_bytes().last() {
                    Some(b'?') => (&param[..param.len() - 1], Modifier::Optional),
                    Some(b'*') => (&param[..param.len() - 1], Modifier::ZeroOrMore),
                    Some(b'+') => (&param[..param.len() - 1], Modifier::OneOrMore),
                    _ => (param, Modifier::None),
                };
                if name.is_empty() {
                    return Err(PatternError::empty_param_name(path));
                }
                if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(PatternError::invalid_param_name(path, name));
                }
                keys.push(name.to_string());
                segments.push(Segment::Param { name: name.to_string(), modifier });
                continue;
            }
            segments.push(Segment::Literal(piece.to_string()));
        }

        Ok(Self::new(path, PatternKind::Segments(segments), keys, options, trailing_slash))
    }

    fn compile_regex(source: &str, options: PatternOptions) -> Result<Pattern, PatternError> {
        let regex = RegexBuilder::new(source).case_insensitive(!options.case_sensitive).build()?;

        let mut keys = Vec::new();
        let mut anonymous = 0;
        for name in regex.capture_names().skip(1) {
            match name {
                Some(name) => keys.push(name.to_string()),
                None => {
                    keys.push(anonymous.to_string());
                    anonymous += 1;
                }
            }
        }

        Ok(Self::new(source, PatternKind::Regex(regex), keys, options, false))
    }

    fn new(raw: &str, kind: PatternKind, keys: Vec<String>, options: PatternOptions, trailing_slash: bool) -> Self {
        Self {
            raw: raw.to_string(),
            kind,
            keys,
            case_sensitive: options.case_sensitive,
            strict: options.strict,
            end: options.end,
            trailing_slash,
        }
    }

    /// The original pattern source.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parameter names captured by this pattern, in capture order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Evaluates the pattern against a request path.
    ///
    /// Returns `None` when the path does not match. Never fails at request
    /// time: malformed patterns are rejected at compile time.
    pub fn matches(&self, path: &str) -> Option<PatternMatch> {
        let path = if path.is_empty() { "/" } else { path };
        if !path.starts_with('/') {
            return None;
        }

        match &self.kind {
            PatternKind::FastSlash => Some(PatternMatch { prefix_len: 0, params: Params::new() }),
            PatternKind::Segments(segments) => self.match_parts(segments, path),
            PatternKind::Regex(regex) => self.match_regex(regex, path),
        }
    }

    fn match_parts(&self, segments: &[Segment], path: &str) -> Option<PatternMatch> {
        let (parts, trailing_slash) = split_path(path);

        if self.end && self.strict && trailing_slash != self.trailing_slash {
            return None;
        }

        let ctx = MatchContext { case_sensitive: self.case_sensitive, end: self.end, trailing_slash };
        let (consumed, captures) = match_segments(segments, &parts, ctx)?;

        let prefix_len = if self.end {
            path.len()
        } else if consumed == 0 {
            0
        } else {
            parts[consumed - 1].end
        };

        let params = captures.into_iter().collect();
        Some(PatternMatch { prefix_len, params })
    }

    fn match_regex(&self, regex: &Regex, path: &str) -> Option<PatternMatch> {
        let target = if self.end && !self.strict && path.len() > 1 && path.ends_with('/') {
            &path[..path.len() - 1]
        } else {
            path
        };

        let captures = regex.captures(target)?;
        let full = captures.get(0)?;
        if full.start() != 0 {
            return None;
        }
        if self.end && full.end() != target.len() {
            return None;
        }

        let mut params = Params::new();
        for (key, capture) in self.keys.iter().zip(captures.iter().skip(1)) {
            if let Some(capture) = capture {
                params.insert(key, capture.as_str());
            }
        }
        Some(PatternMatch { prefix_len: full.end(), params })
    }
}

fn split_path(path: &str) -> (Vec<Part<'_>>, bool) {
    let trimmed = &path[1..];
    if trimmed.is_empty() {
        return (Vec::new(), false);
    }

    let trailing = trimmed.ends_with('/');
    let body = if trailing { &trimmed[..trimmed.len() - 1] } else { trimmed };
    if body.is_empty() {
        return (Vec::new(), trailing);
    }

    let mut parts = Vec::new();
    let mut offset = 1;
    for text in body.split('/') {
        let end = offset + text.len();
        parts.push(Part { text, end });
        offset = end + 1;
    }
    (parts, trailing)
}

/// Invariant inputs of one matching pass.
#[derive(Clone, Copy)]
struct MatchContext {
    case_sensitive: bool,
    end: bool,
    trailing_slash: bool,
}

/// Matches `segments` against a prefix of `parts`, returning the number of
/// parts consumed and the captures in key order. Repeat modifiers are greedy
/// and backtrack through recursion.
fn match_segments(
    segments: &[Segment],
    parts: &[Part<'_>],
    ctx: MatchContext,
) -> Option<(usize, Vec<(String, String)>)> {
    let Some((segment, rest)) = segments.split_first() else {
        if ctx.end && !parts.is_empty() {
            return None;
        }
        return Some((0, Vec::new()));
    };

    match segment {
        Segment::Literal(literal) => {
            let (part, tail) = parts.split_first()?;
            let matched = if ctx.case_sensitive {
                part.text == literal
            } else {
                part.text.eq_ignore_ascii_case(literal)
            };
            if !matched {
                return None;
            }
            let (consumed, captures) = match_segments(rest, tail, ctx)?;
            Some((consumed + 1, captures))
        }
        Segment::Param { name, modifier: Modifier::None } => {
            let (part, tail) = parts.split_first()?;
            if part.text.is_empty() {
                return None;
            }
            let (consumed, mut captures) = match_segments(rest, tail, ctx)?;
            captures.insert(0, (name.clone(), part.text.to_string()));
            Some((consumed + 1, captures))
        }
        Segment::Param { name, modifier: Modifier::Optional } => {
            if let Some((part, tail)) = parts.split_first() {
                if !part.text.is_empty() {
                    if let Some((consumed, mut captures)) = match_segments(rest, tail, ctx) {
                        captures.insert(0, (name.clone(), part.text.to_string()));
                        return Some((consumed + 1, captures));
                    }
                }
            }
            match_segments(rest, parts, ctx)
        }
        Segment::Param { name, modifier: Modifier::ZeroOrMore } => {
            match_repeat(name, 0, false, rest, parts, ctx)
        }
        Segment::Param { name, modifier: Modifier::OneOrMore } => {
            match_repeat(name, 1, false, rest, parts, ctx)
        }
        Segment::Wildcard { index } => {
            let key = index.to_string();
            if let Some(matched) = match_repeat(&key, 1, true, rest, parts, ctx) {
                return Some(matched);
            }
            // A wildcard stands for `/` plus a possibly empty remainder, so it
            // needs the separator: `/assets/` matches `/assets/*` with an
            // empty capture, bare `/assets` does not match at all.
            if parts.is_empty() && ctx.trailing_slash && rest.is_empty() {
                return Some((0, vec![(key, String::new())]));
            }
            None
        }
    }
}

fn match_repeat(
    key: &str,
    min: usize,
    capture_empty: bool,
    rest: &[Segment],
    parts: &[Part<'_>],
    ctx: MatchContext,
) -> Option<(usize, Vec<(String, String)>)> {
    for take in (min..=parts.len()).rev() {
        if let Some((consumed, mut captures)) = match_segments(rest, &parts[take..], ctx) {
            if take > 0 || capture_empty {
                let value = parts[..take].iter().map(|part| part.text).collect::<Vec<_>>().join("/");
                captures.insert(0, (key.to_string(), value));
            }
            return Some((consumed + take, captures));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(path: &str, end: bool) -> Pattern {
        let options = PatternOptions { case_sensitive: false, strict: false, end };
        Pattern::compile(&PathSpec::from(path), options).unwrap()
    }

    fn compile_with(path: &str, case_sensitive: bool, strict: bool, end: bool) -> Pattern {
        let options = PatternOptions { case_sensitive, strict, end };
        Pattern::compile(&PathSpec::from(path), options).unwrap()
    }

    #[test]
    fn literal_full_match() {
        let pattern = compile("/users/all", true);
        assert!(pattern.matches("/users/all").is_some());
        assert!(pattern.matches("/users/all/extra").is_none());
        assert!(pattern.matches("/users").is_none());
    }

    #[test]
    fn case_insensitive_by_default() {
        let pattern = compile("/Users", true);
        assert!(pattern.matches("/users").is_some());
        let sensitive = compile_with("/Users", true, false, true);
        assert!(sensitive.matches("/users").is_none());
        assert!(sensitive.matches("/Users").is_some());
    }

    #[test]
    fn named_param_captures_segment() {
        let pattern = compile("/users/:id", true);
        let matched = pattern.matches("/users/42").unwrap();
        assert_eq!(matched.params().get("id"), Some("42"));
        assert_eq!(pattern.keys(), ["id"]);
        assert!(pattern.matches("/users").is_none());
        assert!(pattern.matches("/users/42/books").is_none());
    }

    #[test]
    fn optional_param() {
        let pattern = compile("/users/:id?", true);
        assert_eq!(pattern.matches("/users/42").unwrap().params().get("id"), Some("42"));
        let matched = pattern.matches("/users").unwrap();
        assert_eq!(matched.params().get("id"), None);
    }

    #[test]
    fn repeat_params() {
        let star = compile("/files/:path*", true);
        assert_eq!(star.matches("/files/a/b/c").unwrap().params().get("path"), Some("a/b/c"));
        assert_eq!(star.matches("/files").unwrap().params().get("path"), None);

        let plus = compile("/files/:path+", true);
        assert_eq!(plus.matches("/files/a/b").unwrap().params().get("path"), Some("a/b"));
        assert!(plus.matches("/files").is_none());
    }

    #[test]
    fn wildcard_captures_index_key() {
        let pattern = compile("/assets/*", true);
        let matched = pattern.matches("/assets/css/site.css").unwrap();
        assert_eq!(matched.params().get("0"), Some("css/site.css"));
    }

    #[test]
    fn wildcard_requires_separator() {
        let pattern = compile("/assets/*", true);
        assert!(pattern.matches("/assets").is_none());
        assert_eq!(pattern.matches("/assets/").unwrap().params().get("0"), Some(""));

        // mid-pattern wildcards need their slot too
        let mid = compile("/a/*/b", true);
        assert!(mid.matches("/a/b").is_none());
        assert_eq!(mid.matches("/a/x/b").unwrap().params().get("0"), Some("x"));
    }

    #[test]
    fn prefix_match_reports_stripped_length() {
        let pattern = compile("/api", false);
        let matched = pattern.matches("/api/users/42").unwrap();
        assert_eq!(matched.prefix_len(), 4);
        assert_eq!(&"/api/users/42"[matched.prefix_len()..], "/users/42");

        // exact prefix, nothing left over
        assert_eq!(pattern.matches("/api").unwrap().prefix_len(), 4);
        // segment boundary required
        assert!(pattern.matches("/apiv2").is_none());
    }

    #[test]
    fn fast_slash_matches_everything() {
        let pattern = compile("/", false);
        assert_eq!(pattern.matches("/anything/at/all").unwrap().prefix_len(), 0);
        assert_eq!(pattern.matches("/").unwrap().prefix_len(), 0);
    }

    #[test]
    fn root_route_is_exact() {
        let pattern = compile("/", true);
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/users").is_none());
    }

    #[test]
    fn trailing_slash_insignificant_unless_strict() {
        let lax = compile("/users", true);
        assert!(lax.matches("/users/").is_some());

        let strict = compile_with("/users", false, true, true);
        assert!(strict.matches("/users/").is_none());
        assert!(strict.matches("/users").is_some());

        let strict_slash = compile_with("/users/", false, true, true);
        assert!(strict_slash.matches("/users/").is_some());
        assert!(strict_slash.matches("/users").is_none());
    }

    #[test]
    fn param_prefix_pattern_strips_matched_segments() {
        let pattern = compile("/tenants/:tenant", false);
        let matched = pattern.matches("/tenants/acme/users").unwrap();
        assert_eq!(matched.params().get("tenant"), Some("acme"));
        assert_eq!(&"/tenants/acme/users"[matched.prefix_len()..], "/users");
    }

    #[test]
    fn regex_pattern_with_named_and_indexed_groups() {
        let options = PatternOptions { case_sensitive: true, strict: false, end: true };
        let pattern = Pattern::compile(&regex(r"^/orders/(?P<id>\d+)/(\w+)$"), options).unwrap();
        let matched = pattern.matches("/orders/17/lines").unwrap();
        assert_eq!(matched.params().get("id"), Some("17"));
        assert_eq!(matched.params().get("0"), Some("lines"));
        assert!(pattern.matches("/orders/abc/lines").is_none());
    }

    #[test]
    fn compile_errors() {
        let options = PatternOptions { case_sensitive: false, strict: false, end: true };
        assert!(matches!(
            Pattern::compile(&PathSpec::from("users"), options),
            Err(PatternError::MissingLeadingSlash { .. })
        ));
        assert!(matches!(
            Pattern::compile(&PathSpec::from("/users//all"), options),
            Err(PatternError::EmptySegment { .. })
        ));
        assert!(matches!(
            Pattern::compile(&PathSpec::from("/users/:"), options),
            Err(PatternError::EmptyParamName { .. })
        ));
        assert!(matches!(
            Pattern::compile(&PathSpec::from("/users/:id-x"), options),
            Err(PatternError::InvalidParamName { .. })
        ));
        assert!(matches!(Pattern::compile(&regex("([unclosed"), options), Err(PatternError::InvalidRegex { .. })));
    }
}
