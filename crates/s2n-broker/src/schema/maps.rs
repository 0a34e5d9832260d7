//! Declarative provider field maps
//!
//! A [`ProviderFieldMap`] lists, in output order, how each canonical field is
//! filled from one provider's raw record: copied from a source path, or
//! produced by a named [`Derivation`].

use serde_json::Value;

use crate::provider::ProviderCode;
use crate::schema::RecordKind;

/// Path to a value inside a raw provider record
///
/// Segments are explicit because provider keys may themselves contain dots
/// (`specimen.occurrence_id`) or full term URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSource {
    path: Vec<String>,
}

impl FieldSource {
    /// A top-level key
    pub fn key(key: &str) -> Self {
        Self {
            path: vec![key.to_string()],
        }
    }

    /// A key nested inside one or more objects
    pub fn nested(path: &[&str]) -> Self {
        Self {
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn lookup<'a>(&self, raw: &'a Value) -> Option<&'a Value> {
        self.path
            .iter()
            .try_fold(raw, |current, segment| current.get(segment.as_str()))
    }

    pub fn segments(&self) -> &[String] {
        &self.path
    }
}

impl std::fmt::Display for FieldSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path.join("/"))
    }
}

/// Named transformation producing one canonical value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    /// Human-facing page built from an identifier field
    ViewUrl(FieldSource),
    /// Machine-readable endpoint built from an identifier field
    ApiUrl(FieldSource),
    /// Name followed by its authorship
    ///
    /// The `valid_*` sources are preferred. The plain name and authority are
    /// only read when the query is not restricted to accepted names.
    AuthoredName {
        valid_name: FieldSource,
        name: FieldSource,
        valid_authority: FieldSource,
        authority: FieldSource,
    },
    /// `valid` as text, falling back to `plain` unless accepted names are requested
    AcceptedName { valid: FieldSource, plain: FieldSource },
    /// Rank keys of the raw record collapsed into an ordered rank map
    RankHierarchy,
    /// `"<tsn>:$Kingdom:Plantae$...$Species:Poa annua$"` strings
    EncodedHierarchy(FieldSource),
    /// `"<tsn>:$name$name$"` strings flattened into a list of names
    DelimitedNames(FieldSource),
    /// `"$name$language$..."` vernacular entries reduced to their names
    VernacularNames(FieldSource),
    /// First present source rendered as a string
    Text(Vec<FieldSource>),
    /// Issue codes expanded into a code to description mapping
    Issues(FieldSource),
    /// `base/tail`
    Joined { base: FieldSource, tail: FieldSource },
    /// String value with a trailing suffix removed
    TrimSuffix {
        source: FieldSource,
        suffix: &'static str,
    },
    /// Label of the first source present in the record
    Classify(Vec<(FieldSource, &'static str)>),
    /// Rendering hints taken from the query options
    VendorParameters,
}

/// How a canonical field is filled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Value of the first present source, unchanged
    Copy(Vec<FieldSource>),
    Derive(Derivation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub target: String,
    pub rule: FieldRule,
}

/// What counts as "no data" in a provider's raw records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Absence {
    /// Only a missing key or null
    #[default]
    Missing,
    /// Also empty strings, zero, false and empty containers
    Falsy,
}

impl Absence {
    pub fn is_absent(&self, value: &Value) -> bool {
        match self {
            Absence::Missing => value.is_null(),
            Absence::Falsy => match value {
                Value::Null => true,
                Value::Bool(b) => !b,
                Value::Number(n) => n.as_f64() == Some(0.0),
                Value::String(s) => s.is_empty(),
                Value::Array(a) => a.is_empty(),
                Value::Object(o) => o.is_empty(),
            },
        }
    }
}

/// Field map for one provider and record kind, in output order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFieldMap {
    provider: ProviderCode,
    kind: RecordKind,
    entries: Vec<FieldMapping>,
}

impl ProviderFieldMap {
    pub fn new(provider: ProviderCode, kind: RecordKind) -> Self {
        Self {
            provider,
            kind,
            entries: Vec::new(),
        }
    }

    pub fn provider(&self) -> ProviderCode {
        self.provider
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn entries(&self) -> &[FieldMapping] {
        &self.entries
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.target.as_str())
    }

    pub fn get(&self, target: &str) -> Option<&FieldMapping> {
        self.entries.iter().find(|e| e.target == target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy a top-level provider key
    pub fn copy(self, target: &str, key: &str) -> Self {
        self.copy_from(target, vec![FieldSource::key(key)])
    }

    /// Copy the first present of several sources
    pub fn copy_from(self, target: &str, sources: Vec<FieldSource>) -> Self {
        self.push(target, FieldRule::Copy(sources))
    }

    pub fn derive(self, target: &str, derivation: Derivation) -> Self {
        self.push(target, FieldRule::Derive(derivation))
    }

    fn push(mut self, target: &str, rule: FieldRule) -> Self {
        self.entries.push(FieldMapping {
            target: target.to_string(),
            rule,
        });
        self
    }
}
