use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp type (milliseconds since epoch).
pub type Timestamp = i64;

/// Value type.
pub type Value = i64;

/// Ordered tag list of a series (`key:value` pairs as they appear in the series text).
pub type TagSet = Vec<(String, String)>;

/// Separates the tokens of a series' textual form.
pub const TAG_SEPARATOR: char = ' ';

/// Separates key and value inside a tag token.
pub const TAG_ASSIGNMENT: char = ':';

/// A single observation: the atomic unit of data held by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub time: Timestamp,
    pub value: Value,
}

impl Point {
    #[inline]
    pub const fn new(time: Timestamp, value: Value) -> Self {
        Point { time, value }
    }
}

/// Identity of one logical metric stream: a metric name plus an optional tag set.
///
/// The textual form is `key:value key:value ... Name`, e.g. `ns:web @:orders ResponseTime`.
/// Equality and hashing are by content, so a `Series` works as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Series {
    tags: TagSet,
    name: String,
}

impl Series {
    /// Creates an untagged series. The name is taken verbatim; use [`Series::parse`] for text
    /// that may carry tags.
    pub fn new(name: impl Into<String>) -> Self {
        Series {
            tags: TagSet::new(),
            name: name.into(),
        }
    }

    /// Appends a tag, keeping insertion order.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Parses the textual form `key:value ... Name`.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidSeries`] for blank input, a missing or tag-like name, or a
    /// tag without a key.
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        let mut tokens: Vec<&str> = text.split(TAG_SEPARATOR).filter(|t| !t.is_empty()).collect();
        let name = tokens
            .pop()
            .ok_or_else(|| StoreError::InvalidSeries("empty series".to_string()))?;
        if name.contains(TAG_ASSIGNMENT) {
            return Err(StoreError::InvalidSeries(format!("missing metric name in {:?}", text)));
        }
        let mut tags = TagSet::with_capacity(tokens.len());
        for token in tokens {
            match token.split_once(TAG_ASSIGNMENT) {
                Some((key, value)) if !key.is_empty() => tags.push((key.to_string(), value.to_string())),
                _ => return Err(StoreError::InvalidSeries(format!("malformed tag {:?} in {:?}", token, text))),
            }
        }
        Ok(Series {
            tags,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// Value of the first tag with the given key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.tags {
            write!(f, "{}{}{}{}", key, TAG_ASSIGNMENT, value, TAG_SEPARATOR)?;
        }
        f.write_str(&self.name)
    }
}

impl FromStr for Series {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Series::parse(s)
    }
}
