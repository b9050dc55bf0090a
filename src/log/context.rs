//! Logger context: ordered key/value pairs with override-on-conflict.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Marker rendered for a trailing key that has no value.
pub const MISSING_VALUE: &str = "(MISSING)";

/// Reserved key holding the severity.
pub const LEVEL_KEY: &str = "level";

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// A single rendered field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub value: String,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Accumulated decoration carried by a [`Logger`](super::Logger).
///
/// The field list is shared between clones and copied on write, so a
/// derived context never changes the one it came from. A later field with
/// an existing key replaces the value in place and keeps the original
/// position.
#[derive(Debug, Clone, Default)]
pub struct Context {
    fields: Arc<Vec<Field>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new context with `fields` merged over this one.
    pub fn merged<I>(&self, fields: I) -> Context
    where
        I: IntoIterator<Item = Field>,
    {
        let mut next = Context {
            fields: Arc::clone(&self.fields),
        };
        for field in fields {
            next.upsert(field);
        }
        next
    }

    /// Returns a new context with the severity set.
    pub fn with_level(&self, level: Level) -> Context {
        self.merged(std::iter::once(Field::new(LEVEL_KEY, level.as_str())))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }

    /// Severity text, `info` when never set.
    pub fn level(&self) -> &str {
        self.get(LEVEL_KEY).unwrap_or(Level::Info.as_str())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<Field> {
        Arc::try_unwrap(self.fields).unwrap_or_else(|shared| (*shared).clone())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn upsert(&mut self, field: Field) {
        let fields = Arc::make_mut(&mut self.fields);
        match fields.iter_mut().find(|f| f.key == field.key) {
            Some(existing) => existing.value = field.value,
            None => fields.push(field),
        }
    }
}

/// Pairs a flat key, value, key, value... sequence.
///
/// An unpaired trailing key gets [`MISSING_VALUE`].
pub fn pair_up<I, S>(items: I) -> Vec<Field>
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    let mut out = Vec::new();
    let mut iter = items.into_iter();
    while let Some(key) = iter.next() {
        let value = match iter.next() {
            Some(v) => v.to_string(),
            None => MISSING_VALUE.to_string(),
        };
        out.push(Field::new(key.to_string(), value));
    }
    out
}
