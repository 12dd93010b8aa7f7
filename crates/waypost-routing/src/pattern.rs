//! Path pattern compilation, matching, and generation.
//!
//! [`PathPattern::compile`] turns a route path such as `/users/:id(\d+)/:tab?`
//! into a regex plus an ordered list of parameter tokens. A compiled pattern
//! can both match a concrete path (extracting percent-decoded parameters) and
//! generate a concrete path from a parameter map (percent-encoding values).
//!
//! ## Syntax
//!
//! | Form | Meaning |
//! |------|---------|
//! | `:name` | a named parameter matching one segment |
//! | `:name(re)` | a named parameter with a custom pattern |
//! | `(re)` | an unnamed parameter, keyed by its index |
//! | `?` / `*` / `+` | optional / zero-or-more / one-or-more modifier |
//! | `*` | a catch-all, exposed as the `pathMatch` parameter |
//! | `\x` | a literal `x` |

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Regex, RegexBuilder};

use waypost_core::{WaypostError, WaypostResult};

use crate::location::Params;

/// Name under which the first unnamed capture (and `*`) is exposed.
pub const PATH_MATCH: &str = "pathMatch";

/// Tokenizer for the pattern syntax: an escaped character, or a parameter
/// with an optional `/` or `.` prefix, name, custom group and modifier, or a
/// bare asterisk.
static PATH_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\\.)|([/.])?(?:(?::([A-Za-z0-9_]+)(?:\(((?:\\.|[^\\()])+)\))?|\(((?:\\.|[^\\()])+)\))([+*?])?|(\*))",
    )
    .expect("path token regex is valid")
});

/// Characters `encodeURI` leaves alone, minus `/ ? #`.
const PRETTY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Like [`PRETTY`] but keeps `/`, for catch-all values.
const PRETTY_ASTERISK: &AsciiSet = &PRETTY.remove(b'/');

/// Options controlling how a pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternOptions {
    /// Case-sensitive matching.
    pub sensitive: bool,
    /// A trailing slash must match exactly.
    pub strict: bool,
    /// The pattern must match the whole path rather than a prefix.
    pub end: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            sensitive: false,
            strict: false,
            end: true,
        }
    }
}

/// How a parameter token is keyed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// `:name`
    Named(String),
    /// An unnamed group or asterisk, numbered from zero.
    Index(usize),
}

impl ParamKey {
    /// The key under which the captured value is stored in a params map.
    pub fn param_name(&self) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::Index(0) => PATH_MATCH.to_string(),
            Self::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A parameter token of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamToken {
    /// The parameter key.
    pub key: ParamKey,
    /// The `/` or `.` absorbed in front of the parameter, if any.
    pub prefix: String,
    /// The delimiter used between repeated values.
    pub delimiter: String,
    /// `?` or `*` modifier.
    pub optional: bool,
    /// `*` or `+` modifier.
    pub repeat: bool,
    /// The parameter is followed by literal text inside the same segment.
    pub partial: bool,
    /// The token is a bare `*`.
    pub asterisk: bool,
    /// The regex a single value must match.
    pub pattern: String,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Param(usize),
}

/// A compiled path pattern.
///
/// # Examples
///
/// ```
/// use waypost_routing::pattern::{PathPattern, PatternOptions};
///
/// let pattern = PathPattern::compile("/users/:id", PatternOptions::default()).unwrap();
/// let params = pattern.match_path("/users/42").unwrap();
/// assert_eq!(params.get("id").map(String::as_str), Some("42"));
/// assert_eq!(pattern.generate(&params).unwrap(), "/users/42");
/// ```
#[derive(Clone)]
pub struct PathPattern {
    source: String,
    options: PatternOptions,
    segments: Vec<Segment>,
    tokens: Vec<ParamToken>,
    regex: Regex,
    value_matchers: Vec<Regex>,
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .field("tokens", &self.tokens)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PathPattern {
    /// Compiles a pattern string.
    ///
    /// # Errors
    ///
    /// Returns [`WaypostError::InvalidPattern`] for unbalanced groups or a
    /// custom parameter pattern that is not a valid regex.
    pub fn compile(source: &str, options: PatternOptions) -> WaypostResult<Self> {
        let (segments, tokens) = tokenize(source)?;
        let regex = build_regex(source, &segments, &tokens, options)?;

        let value_matchers = tokens
            .iter()
            .map(|token| {
                RegexBuilder::new(&format!("^(?:{})$", token.pattern))
                    .case_insensitive(!options.sensitive)
                    .build()
                    .map_err(|e| invalid(source, format!("bad pattern for \"{}\": {e}", token.key)))
            })
            .collect::<WaypostResult<Vec<_>>>()?;

        Ok(Self {
            source: source.to_string(),
            options,
            segments,
            tokens,
            regex,
            value_matchers,
        })
    }

    /// Returns the original pattern string.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the options the pattern was compiled with.
    pub const fn options(&self) -> PatternOptions {
        self.options
    }

    /// Returns the compiled regex.
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the parameter tokens in order of appearance.
    pub fn tokens(&self) -> &[ParamToken] {
        &self.tokens
    }

    /// Returns the names of all parameters that must be present to generate a path.
    pub fn required_param_names(&self) -> Vec<String> {
        self.tokens
            .iter()
            .filter(|t| !t.optional)
            .map(|t| t.key.param_name())
            .collect()
    }

    /// Returns parameter names that appear more than once.
    pub fn duplicate_keys(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for token in &self.tokens {
            let name = token.key.param_name();
            if !seen.insert(name.clone()) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }

    /// Returns `true` if the pattern is the bare catch-all `*`.
    pub fn is_catch_all(&self) -> bool {
        self.source == "*"
    }

    /// Tests whether the pattern matches `path` without extracting parameters.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Matches `path`, returning the percent-decoded parameters.
    ///
    /// Optional parameters that did not participate in the match are absent
    /// from the returned map. A capture that is not valid percent-encoded
    /// UTF-8 is kept verbatim.
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        let mut params = BTreeMap::new();

        for (i, token) in self.tokens.iter().enumerate() {
            if let Some(m) = captures.name(&group_name(i)) {
                params.insert(token.key.param_name(), decode_param(m.as_str()));
            }
        }

        Some(params)
    }

    /// Generates a concrete path by substituting `params` into the pattern.
    ///
    /// Values are percent-encoded but never decoded. A `pathMatch` entry feeds
    /// the first unnamed capture.
    ///
    /// # Errors
    ///
    /// Returns [`WaypostError::MissingParam`] when a required parameter is
    /// absent and [`WaypostError::ParamMismatch`] when an encoded value does
    /// not satisfy its token pattern.
    pub fn generate(&self, params: &Params) -> WaypostResult<String> {
        let mut path = String::new();

        for segment in &self.segments {
            let index = match segment {
                Segment::Literal(text) => {
                    path.push_str(text);
                    continue;
                }
                Segment::Param(index) => *index,
            };

            let token = &self.tokens[index];
            let Some(value) = lookup_param(&token.key, params) else {
                if token.optional {
                    if token.partial {
                        path.push_str(&token.prefix);
                    }
                    continue;
                }
                return Err(WaypostError::MissingParam(token.key.to_string()));
            };

            let encoded = if token.asterisk {
                utf8_percent_encode(value, PRETTY_ASTERISK).to_string()
            } else {
                utf8_percent_encode(value, PRETTY).to_string()
            };

            if !self.value_matchers[index].is_match(&encoded) {
                return Err(WaypostError::ParamMismatch {
                    name: token.key.to_string(),
                    pattern: token.pattern.clone(),
                    value: encoded,
                });
            }

            path.push_str(&token.prefix);
            path.push_str(&encoded);
        }

        Ok(path)
    }
}

/// Generates a path from `pattern`, logging and returning an empty string on failure.
///
/// `context` names what was being generated (for example `named route "user"`).
pub fn fill_params(pattern: &PathPattern, params: &Params, context: &str) -> String {
    pattern
        .generate(params)
        .unwrap_or_else(|e| report_fill_error(&e, context))
}

/// Like [`fill_params`] for a pattern that has not been compiled yet.
pub fn fill_path(source: &str, params: &Params, context: &str) -> String {
    PathPattern::compile(source, PatternOptions::default())
        .and_then(|pattern| pattern.generate(params))
        .unwrap_or_else(|e| report_fill_error(&e, context))
}

fn report_fill_error(error: &WaypostError, context: &str) -> String {
    if error.is_generation_error() {
        tracing::warn!(context, error = %error, "missing param for {context}");
    } else {
        tracing::warn!(context, error = %error, "cannot generate path for {context}");
    }
    String::new()
}

fn lookup_param<'a>(key: &ParamKey, params: &'a Params) -> Option<&'a str> {
    match key {
        ParamKey::Named(name) => params.get(name),
        ParamKey::Index(0) => params.get(PATH_MATCH).or_else(|| params.get("0")),
        ParamKey::Index(i) => params.get(&i.to_string()),
    }
    .map(String::as_str)
}

fn decode_param(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::warn!(param = raw, error = %e, "Error decoding route param, keeping raw value");
            raw.to_string()
        }
    }
}

fn group_name(index: usize) -> String {
    format!("p{index}")
}

fn invalid(source: &str, reason: impl Into<String>) -> WaypostError {
    WaypostError::InvalidPattern {
        pattern: source.to_string(),
        reason: reason.into(),
    }
}

/// Splits `source` into literal runs and parameter tokens.
fn tokenize(source: &str) -> WaypostResult<(Vec<Segment>, Vec<ParamToken>)> {
    let mut segments = Vec::new();
    let mut tokens: Vec<ParamToken> = Vec::new();
    let mut literal = String::new();
    let mut next_index = 0;
    let mut cursor = 0;

    for caps in PATH_TOKEN.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        push_literal(source, &source[cursor..whole.start()], &mut literal)?;
        cursor = whole.end();

        if let Some(escaped) = caps.get(1) {
            literal.push_str(&escaped.as_str()[1..]);
            continue;
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }

        let prefix = caps.get(2).map(|m| m.as_str());
        let modifier = caps.get(6).map(|m| m.as_str());
        let asterisk = caps.get(7).is_some();
        let next_char = source[cursor..].chars().next();

        let key = if let Some(name) = caps.get(3) {
            ParamKey::Named(name.as_str().to_string())
        } else {
            let key = ParamKey::Index(next_index);
            next_index += 1;
            key
        };

        let delimiter = prefix.unwrap_or("/").to_string();
        let pattern = caps
            .get(4)
            .or_else(|| caps.get(5))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| {
                if asterisk {
                    ".*".to_string()
                } else {
                    format!("[^{}]+?", regex::escape(&delimiter))
                }
            });

        tokens.push(ParamToken {
            key,
            prefix: prefix.unwrap_or_default().to_string(),
            delimiter,
            optional: matches!(modifier, Some("?" | "*")),
            repeat: matches!(modifier, Some("+" | "*")),
            partial: prefix.is_some_and(|p| next_char.is_some_and(|c| p.chars().next() != Some(c))),
            asterisk,
            pattern,
        });
        segments.push(Segment::Param(tokens.len() - 1));
    }

    push_literal(source, &source[cursor..], &mut literal)?;
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok((segments, tokens))
}

fn push_literal(source: &str, text: &str, literal: &mut String) -> WaypostResult<()> {
    if text.contains('(') || text.contains(')') {
        return Err(invalid(source, "unbalanced group"));
    }
    literal.push_str(text);
    Ok(())
}

fn build_regex(
    source: &str,
    segments: &[Segment],
    tokens: &[ParamToken],
    options: PatternOptions,
) -> WaypostResult<Regex> {
    let mut route = String::new();

    for segment in segments {
        match segment {
            Segment::Literal(text) => route.push_str(&regex::escape(text)),
            Segment::Param(index) => {
                let token = &tokens[*index];
                let prefix = regex::escape(&token.prefix);
                let name = group_name(*index);
                let mut capture = format!("(?:{})", token.pattern);
                if token.repeat {
                    capture = format!("{capture}(?:{prefix}{capture})*");
                }
                let capture = if token.optional {
                    if token.partial {
                        format!("{prefix}(?P<{name}>{capture})?")
                    } else {
                        format!("(?:{prefix}(?P<{name}>{capture}))?")
                    }
                } else {
                    format!("{prefix}(?P<{name}>{capture})")
                };
                route.push_str(&capture);
            }
        }
    }

    let ends_with_delimiter = route.ends_with('/');
    if !options.strict {
        if ends_with_delimiter {
            route.pop();
        }
        route.push_str(if options.end { "(?:/)?$" } else { "(?:/|$)" });
    } else if options.end {
        route.push('$');
    } else if !ends_with_delimiter {
        route.push_str("(?:/|$)");
    }

    RegexBuilder::new(&format!("^{route}"))
        .case_insensitive(!options.sensitive)
        .build()
        .map_err(|e| invalid(source, e.to_string()))
}
