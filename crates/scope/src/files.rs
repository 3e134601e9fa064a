//! File operations built on scoped blocks.

use crate::scope::Scope;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use warden_core::error::{WardenError, WardenResult};
use warden_core::Failure;
use warden_resource::{FileReader, FileWriter, Quiet};

/// First line of `path` without its terminator; `None` for an empty file.
pub fn first_line(path: impl AsRef<Path>) -> Result<Option<String>, Failure> {
    let path = path.as_ref();
    Scope::new()
        .named("first_line")
        .acquire(|| FileReader::open(path))
        .run(|reader| reader.read_line())
}

/// Copies the first line of `from` (plus a newline) into `to`.
///
/// The reader is opened first and released last. An empty source is a body
/// failure; `to` has already been created (and truncated) by then.
pub fn transfer_first_line(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<(), Failure> {
    let (from, to) = (from.as_ref(), to.as_ref());
    Scope::new()
        .named("transfer_first_line")
        .acquire(|| FileReader::open(from))
        .acquire(|| FileWriter::create(to))
        .run(|(reader, writer)| {
            let line = reader
                .read_line()?
                .ok_or_else(|| WardenError::InvalidInput(format!("{} is empty", from.display())))?;
            writer.write_line(&line)?;
            tracing::info!(from = %from.display(), to = %to.display(), bytes = line.len(), "transferred first line");
            Ok::<_, WardenError>(())
        })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// `key=value` settings file.
///
/// Separators are `=`, `:` or whitespace; `#` and `!` start comment lines.
/// Keys are kept sorted so output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Reads a properties file. The reader's release failures are swallowed
    /// (logged at debug): once the contents are parsed they cannot matter.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Failure> {
        let path = path.as_ref();
        Scope::new()
            .named("properties")
            .acquire(|| FileReader::open(path).map(Quiet::new))
            .run(|reader| {
                let mut props = Properties::default();
                while let Some(line) = reader.get_mut().read_line()? {
                    props.insert_line(&line);
                }
                Ok::<_, WardenError>(props)
            })
    }

    /// Like [`Properties::load`], but an unreadable file yields empty
    /// properties so callers fall back to their defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(props) => {
                tracing::info!(path = %path.display(), entries = props.len(), "loaded properties");
                props
            }
            Err(failure) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %failure,
                    "properties unavailable, using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Self {
        let mut props = Self::default();
        for line in text.lines() {
            props.insert_line(line);
        }
        props
    }

    fn insert_line(&mut self, line: &str) {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            return;
        }

        let split = line.find(|c: char| c == '=' || c == ':' || c.is_whitespace());
        let (key, rest) = match split {
            Some(idx) => (&line[..idx], &line[idx..]),
            None => (line, ""),
        };
        let rest = rest.trim_start();
        let value = rest.strip_prefix(&['=', ':'][..]).unwrap_or(rest).trim();

        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Integer value of `key`. A missing key and an unparsable value are the
    /// same kind of error to the caller.
    pub fn get_int(&self, key: &str) -> WardenResult<i64> {
        let result = match self.get(key) {
            None => Err(WardenError::Config {
                key: key.to_string(),
                reason: "missing".into(),
                source: None,
            }),
            Some(raw) => raw.parse::<i64>().map_err(|e| WardenError::Config {
                key: key.to_string(),
                reason: format!("`{raw}` is not an integer"),
                source: Some(Box::new(e)),
            }),
        };
        if let Err(err) = &result {
            tracing::debug!(key, error = %err, "property lookup failed");
        }
        result
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
