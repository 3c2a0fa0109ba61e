//! Resource lookups against a payload-scoped resource index.
//!
//! Provider results reference airports, carriers and equipment by short
//! code. The descriptive objects travel alongside in a `resources` index
//! shaped `{ <type>: { <code>: {...} } }`. [`resolve`] walks that index
//! with a dotted `type.code` key and reports a miss instead of failing.
//!
//! Indexes are never merged or cached across payloads: two frames may
//! resolve the same code to different objects.
//!
//! ```rust
//! use flight_stream_core::resolve::{resolve, Resolution};
//! use serde_json::json;
//!
//! let index = json!({"locations": {"JFK": {"name": "JFK", "city": "New York", "country": "US"}}});
//! assert!(matches!(resolve(&index, "locations", "JFK"), Resolution::Found(_)));
//! assert_eq!(resolve(&index, "locations", "ZZZ"), Resolution::Missing);
//! ```

use serde_json::Value;
use std::fmt;

/// Outcome of a resource lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    Found(&'a Value),
    Missing,
}

impl<'a> Resolution<'a> {
    pub fn found(self) -> Option<&'a Value> {
        match self {
            Resolution::Found(v) => Some(v),
            Resolution::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Resolution::Missing)
    }
}

/// Resolve `kind.code` in `index`.
///
/// The compound key is split on `.` and walked one segment at a time.
/// An absent key, a `null`, or a non-object intermediate ends the walk
/// with [`Resolution::Missing`].
pub fn resolve<'a>(index: &'a Value, kind: &str, code: &str) -> Resolution<'a> {
    let key = format!("{}.{}", kind, code);
    let mut node = index;
    for part in key.split('.') {
        match node.get(part) {
            None | Some(Value::Null) => return Resolution::Missing,
            Some(next) => node = next,
        }
    }
    Resolution::Found(node)
}

/// Borrowed view over one payload's resource index.
#[derive(Debug, Clone, Copy)]
pub struct ResourceIndex<'a> {
    root: &'a Value,
}

impl<'a> ResourceIndex<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    pub fn resolve(&self, kind: &str, code: &str) -> Resolution<'a> {
        resolve(self.root, kind, code)
    }

    /// Look up an airport under `locations`.
    ///
    /// A resolved object missing `name`, `city` or `country` counts as a
    /// miss.
    pub fn location(&self, code: &str) -> Option<Location> {
        self.resolve("locations", code)
            .found()
            .and_then(Location::from_value)
    }
}

/// Human-readable airport description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub city: String,
    pub country: String,
}

impl Location {
    pub fn from_value(value: &Value) -> Option<Self> {
        let field = |k: &str| value.get(k).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            name: field("name")?,
            city: field("city")?,
            country: field("country")?,
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.city, self.country)
    }
}
