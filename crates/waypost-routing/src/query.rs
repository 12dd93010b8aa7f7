//! Query string parsing and serialization.
//!
//! A [`Query`] maps each key to a [`QueryValue`]. A key with no `=` decodes to
//! [`QueryValue::Null`], which is distinct from an empty string, so `?a` and
//! `?a=` survive a stringify/parse cycle unchanged. Repeated keys collapse
//! into a [`QueryValue::List`] in first-seen order.
//!
//! Custom formats plug in through the [`QueryCodec`] trait.

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use waypost_core::WaypostResult;

/// Component encoding with `!'()*` escaped and `,` left readable.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',');

/// A single query value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// A bare key (`?flag`).
    Null,
    /// A single `key=value` pair.
    Value(String),
    /// A repeated key. `None` entries are bare keys.
    ///
    /// The query string cannot tell a one-element list from a single value,
    /// so `List(vec![Some(v)])` parses back as `Value(v)` (or `Null` for
    /// `vec![None]`). An empty list is left out of the serialized query.
    /// Only lists of two or more entries survive a stringify/parse cycle.
    List(Vec<Option<String>>),
}

impl QueryValue {
    /// Returns the first value, if it is a string.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Value(v) => Some(v),
            Self::List(items) => items.first().and_then(|v| v.as_deref()),
        }
    }

    fn push(&mut self, value: Option<String>) {
        let previous = std::mem::replace(self, Self::Null);
        *self = match previous {
            Self::List(mut items) => {
                items.push(value);
                Self::List(items)
            }
            Self::Null => Self::List(vec![None, value]),
            Self::Value(v) => Self::List(vec![Some(v), value]),
        };
    }

    fn from_option(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(|v| Some(v.to_string())).collect())
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Value(v) => f.write_str(v),
            Self::List(items) => {
                let parts: Vec<&str> = items.iter().map(|v| v.as_deref().unwrap_or("")).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

/// A parsed query. Keys iterate in sorted order.
pub type Query = BTreeMap<String, QueryValue>;

/// Parses and serializes query strings.
pub trait QueryCodec: Send + Sync {
    /// Parses a raw query string (with or without the leading `?`).
    fn parse(&self, raw: &str) -> WaypostResult<Query>;

    /// Serializes a query, including the leading `?` when non-empty.
    fn stringify(&self, query: &Query) -> String;
}

/// The default `key=value&key2` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultQueryCodec;

impl QueryCodec for DefaultQueryCodec {
    fn parse(&self, raw: &str) -> WaypostResult<Query> {
        Ok(parse_query(raw))
    }

    fn stringify(&self, query: &Query) -> String {
        stringify_query(query)
    }
}

/// Parses a query string.
///
/// Surrounding whitespace and one leading `?`, `#` or `&` are ignored. `+`
/// decodes to a space.
///
/// # Examples
///
/// ```
/// use waypost_routing::query::{parse_query, QueryValue};
///
/// let q = parse_query("?tag=a&tag=b&flag&empty=");
/// assert_eq!(q["tag"], QueryValue::List(vec![Some("a".into()), Some("b".into())]));
/// assert_eq!(q["flag"], QueryValue::Null);
/// assert_eq!(q["empty"], QueryValue::Value(String::new()));
/// ```
pub fn parse_query(raw: &str) -> Query {
    let mut query = Query::new();
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(|c: char| matches!(c, '?' | '#' | '&'))
        .unwrap_or(trimmed);

    if trimmed.is_empty() {
        return query;
    }

    for param in trimmed.split('&') {
        let param = param.replace('+', " ");
        let (key, value) = match param.split_once('=') {
            Some((k, v)) => (decode(k), Some(decode(v))),
            None => (decode(&param), None),
        };

        match query.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                query.insert(key, QueryValue::from_option(value));
            }
        }
    }

    query
}

/// Serializes a query to `?k=v&k2`, or an empty string for an empty query.
pub fn stringify_query(query: &Query) -> String {
    let parts: Vec<String> = query
        .iter()
        .filter_map(|(key, value)| {
            let key = encode(key);
            let part = match value {
                QueryValue::Null => key,
                QueryValue::Value(v) => format!("{key}={}", encode(v)),
                QueryValue::List(items) => items
                    .iter()
                    .map(|item| match item {
                        Some(v) => format!("{key}={}", encode(v)),
                        None => key.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join("&"),
            };
            (!part.is_empty()).then_some(part)
        })
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

/// Parses `raw` with `codec` and overlays `extra` key by key.
///
/// A codec failure is logged and treated as an empty query.
pub fn resolve_query(raw: &str, extra: Option<&Query>, codec: &dyn QueryCodec) -> Query {
    let mut query = codec.parse(raw).unwrap_or_else(|e| {
        tracing::warn!(query = raw, error = %e, "Custom query parser failed, using empty query");
        Query::new()
    });

    if let Some(extra) = extra {
        for (key, value) in extra {
            query.insert(key.clone(), value.clone());
        }
    }

    query
}

/// Percent-encodes a query key or value.
pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}

/// Percent-decodes a query key or value, keeping the input if it is malformed.
pub fn decode(value: &str) -> String {
    match percent_decode_str(value).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::warn!(value, error = %e, "Error decoding query component");
            value.to_string()
        }
    }
}
