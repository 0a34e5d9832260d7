//! Severity-keyed diagnostics
//!
//! An [`ErrInfo`] collects messages from different stages of a request under
//! their severity. Merging concatenates per severity and never deduplicates:
//! the same message reported by two providers is two facts.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Invalidates the contribution it is attached to
    Error,
    /// Recoverable, the result is still usable
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(EnvelopeError::InvalidValue {
                field: "errors".to_string(),
                expected: "one of error, warning, info",
            }),
        }
    }
}

/// Messages grouped by severity, in first-seen severity order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrInfo(IndexMap<Severity, Vec<String>>);

impl ErrInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message, creating the severity's list if absent
    pub fn add(mut self, severity: Severity, message: impl Into<String>) -> Self {
        self.push(severity, message);
        self
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.0.entry(severity).or_default().push(message.into());
    }

    /// Concatenate `other` after `self`, severity by severity
    pub fn merge(&mut self, other: &ErrInfo) {
        for (severity, messages) in &other.0 {
            self.0
                .entry(*severity)
                .or_default()
                .extend(messages.iter().cloned());
        }
    }

    pub fn get(&self, severity: Severity) -> &[String] {
        self.0.get(&severity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_errors(&self) -> bool {
        !self.get(Severity::Error).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Flatten into envelope entries
    pub fn entries(&self) -> Vec<ErrorEntry> {
        self.0
            .iter()
            .flat_map(|(severity, messages)| {
                messages
                    .iter()
                    .map(|message| ErrorEntry::new(*severity, message.clone()))
            })
            .collect()
    }
}

/// Merge two diagnostics collections, `a` first
pub fn combine(a: &ErrInfo, b: &ErrInfo) -> ErrInfo {
    let mut merged = a.clone();
    merged.merge(b);
    merged
}

/// One `{severity: message}` entry in an envelope's `errors` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "IndexMap<Severity, String>", try_from = "IndexMap<Severity, String>")]
pub struct ErrorEntry {
    pub severity: Severity,
    pub message: String,
}

impl ErrorEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }
}

impl From<ErrorEntry> for IndexMap<Severity, String> {
    fn from(entry: ErrorEntry) -> Self {
        let mut map = IndexMap::with_capacity(1);
        map.insert(entry.severity, entry.message);
        map
    }
}

impl TryFrom<IndexMap<Severity, String>> for ErrorEntry {
    type Error = EnvelopeError;

    fn try_from(map: IndexMap<Severity, String>) -> Result<Self, Self::Error> {
        let mut entries = map.into_iter();
        match (entries.next(), entries.next()) {
            (Some((severity, message)), None) => Ok(ErrorEntry { severity, message }),
            _ => Err(EnvelopeError::InvalidValue {
                field: "errors".to_string(),
                expected: "a single {severity: message} pair",
            }),
        }
    }
}

impl From<Vec<ErrorEntry>> for ErrInfo {
    fn from(entries: Vec<ErrorEntry>) -> Self {
        entries
            .into_iter()
            .fold(ErrInfo::new(), |info, entry| info.add(entry.severity, entry.message))
    }
}
