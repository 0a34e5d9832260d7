//! Canonical field vocabulary
//!
//! Every standardized record is keyed by namespaced canonical fields such as
//! `dwc:scientificName` or `s2n:view_url`. The fields are grouped by record
//! kind into ordered [`CanonicalSchema`]s; declaration order is the order
//! fields appear in output records.

pub mod maps;
pub mod provider_maps;
pub mod registry;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{BrokerError, Result};

pub use maps::{Absence, Derivation, FieldMapping, FieldRule, FieldSource, ProviderFieldMap};
pub use registry::SchemaRegistry;

/// Kind of record a canonical schema describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Name,
    Occurrence,
    Map,
    Resolved,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Name,
        RecordKind::Occurrence,
        RecordKind::Map,
        RecordKind::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Name => "name",
            RecordKind::Occurrence => "occurrence",
            RecordKind::Map => "map",
            RecordKind::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Originating standard of a canonical field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Darwin Core
    Dwc,
    /// Dublin Core terms
    Dcterms,
    Gbif,
    Idigbio,
    Mopho,
    /// Broker-defined fields
    S2n,
}

impl Namespace {
    pub fn code(&self) -> &'static str {
        match self {
            Namespace::Dwc => "dwc",
            Namespace::Dcterms => "dcterms",
            Namespace::Gbif => "gbif",
            Namespace::Idigbio => "idigbio",
            Namespace::Mopho => "mopho",
            Namespace::S2n => "s2n",
        }
    }

    /// Term URI base, for namespaces backed by a published vocabulary
    pub fn url(&self) -> Option<&'static str> {
        match self {
            Namespace::Dwc => Some("http://rs.tdwg.org/dwc/terms"),
            Namespace::Dcterms => Some("http://purl.org/dc/terms"),
            _ => None,
        }
    }
}

/// A namespaced field name in the broker's output vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalField {
    namespace: Namespace,
    name: String,
    qualified: String,
}

impl CanonicalField {
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        let name = name.into();
        let qualified = format!("{}:{}", namespace.code(), name);
        Self {
            namespace,
            name,
            qualified,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Field name without the namespace prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<namespace>:<name>`, the key used in standardized records
    pub fn as_str(&self) -> &str {
        &self.qualified
    }

    /// Full term URI, e.g. `http://rs.tdwg.org/dwc/terms/catalogNumber`
    pub fn term_uri(&self) -> Option<String> {
        self.namespace
            .url()
            .map(|base| format!("{}/{}", base, self.name))
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified)
    }
}

/// Ordered, duplicate-free set of canonical fields for one record kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSchema {
    kind: RecordKind,
    fields: IndexMap<String, CanonicalField>,
}

impl CanonicalSchema {
    pub fn builder(kind: RecordKind) -> CanonicalSchemaBuilder {
        CanonicalSchemaBuilder {
            kind,
            fields: Vec::new(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn fields(&self) -> impl Iterator<Item = &CanonicalField> {
        self.fields.values()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn get(&self, qualified: &str) -> Option<&CanonicalField> {
        self.fields.get(qualified)
    }

    pub fn contains(&self, qualified: &str) -> bool {
        self.fields.contains_key(qualified)
    }

    /// Declaration index of a field, used to order record keys
    pub fn position(&self, qualified: &str) -> Option<usize> {
        self.fields.get_index_of(qualified)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub struct CanonicalSchemaBuilder {
    kind: RecordKind,
    fields: Vec<CanonicalField>,
}

impl CanonicalSchemaBuilder {
    pub fn field(mut self, namespace: Namespace, name: &str) -> Self {
        self.fields.push(CanonicalField::new(namespace, name));
        self
    }

    pub fn fields(mut self, namespace: Namespace, names: &[&str]) -> Self {
        self.fields
            .extend(names.iter().map(|name| CanonicalField::new(namespace, *name)));
        self
    }

    /// Fails when a qualified name is declared twice
    pub fn build(self) -> Result<CanonicalSchema> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for field in self.fields {
            let key = field.as_str().to_string();
            if fields.insert(key.clone(), field).is_some() {
                return Err(BrokerError::configuration(format!(
                    "{} declared twice in the {} schema",
                    key, self.kind
                )));
            }
        }
        Ok(CanonicalSchema {
            kind: self.kind,
            fields,
        })
    }
}

/// A taxonomic rank in canonical hierarchy order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Rank {
    /// Case-insensitive match on the rank name or one of its aliases
    pub fn matches(&self, key: &str) -> bool {
        self.name.eq_ignore_ascii_case(key) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(key))
    }
}

/// Ranks kept in a collapsed hierarchy, highest first
pub const RANKS: [Rank; 7] = [
    Rank {
        name: "Kingdom",
        aliases: &[],
    },
    Rank {
        name: "Phylum",
        aliases: &["Division"],
    },
    Rank {
        name: "Class",
        aliases: &[],
    },
    Rank {
        name: "Order",
        aliases: &[],
    },
    Rank {
        name: "Family",
        aliases: &[],
    },
    Rank {
        name: "Genus",
        aliases: &[],
    },
    Rank {
        name: "Species",
        aliases: &[],
    },
];

/// Broker name-service fields
pub fn name_schema() -> Result<CanonicalSchema> {
    CanonicalSchema::builder(RecordKind::Name)
        .fields(
            Namespace::S2n,
            &[
                "view_url",
                "api_url",
                "status",
                "scientific_name",
                "canonical_name",
                "common_names",
                "kingdom",
                "rank",
                "synonyms",
                "hierarchy",
                "gbif_occurrence_count",
                "gbif_occurrence_url",
                "gbif_confidence",
                "gbif_taxon_key",
                "itis_tsn",
                "itis_credibility",
                "worms_aphia_id",
                "worms_match_type",
            ],
        )
        .build()
}

/// Occurrence fields, Darwin Core first then provider identifiers
pub fn occurrence_schema() -> Result<CanonicalSchema> {
    CanonicalSchema::builder(RecordKind::Occurrence)
        .fields(Namespace::S2n, &["view_url", "api_url"])
        .fields(
            Namespace::Dcterms,
            &["accessRights", "language", "license", "modified", "type"],
        )
        .fields(
            Namespace::Dwc,
            &[
                "taxonRank",
                "kingdom",
                "phylum",
                "class",
                "order",
                "family",
                "genus",
                "scientificName",
                "specificEpithet",
                "scientificNameAuthorship",
                "recordedBy",
                "fieldNumber",
                "occurrenceID",
                "institutionCode",
                "collectionCode",
                "catalogNumber",
                "basisOfRecord",
                "preparations",
                "datasetName",
                "associatedReferences",
                "associatedSequences",
                "otherCatalogNumbers",
                "locality",
                "decimalLongitude",
                "decimalLatitude",
                "geodeticDatum",
                "year",
                "month",
                "day",
            ],
        )
        .field(Namespace::S2n, "issues")
        .fields(
            Namespace::Gbif,
            &["gbifID", "publishingOrgKey", "acceptedScientificName"],
        )
        .field(Namespace::Idigbio, "uuid")
        .field(Namespace::Mopho, "specimen.specimen_id")
        .field(Namespace::S2n, "specify_identifier")
        .build()
}

/// Species distribution map layer fields
pub fn map_schema() -> Result<CanonicalSchema> {
    CanonicalSchema::builder(RecordKind::Map)
        .fields(
            Namespace::S2n,
            &[
                "view_url",
                "api_url",
                "endpoint",
                "data_link",
                "sdm_projection_scenario_code",
                "sdm_projection_scenario_link",
                "layer_type",
                "layer_name",
                "point_count",
                "point_bbox",
                "species_name",
                "status",
                "modtime",
                "vendor_specific_parameters",
            ],
        )
        .build()
}

/// GUID resolution fields
pub fn resolved_schema() -> Result<CanonicalSchema> {
    CanonicalSchema::builder(RecordKind::Resolved)
        .fields(Namespace::S2n, &["ident", "dataset_guid"])
        .fields(Namespace::Dwc, &["institutionCode", "basisOfRecord"])
        .fields(Namespace::S2n, &["date", "ark", "api_url"])
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_and_term_uri() {
        let field = CanonicalField::new(Namespace::Dwc, "catalogNumber");
        assert_eq!(field.as_str(), "dwc:catalogNumber");
        assert_eq!(
            field.term_uri().as_deref(),
            Some("http://rs.tdwg.org/dwc/terms/catalogNumber")
        );
        assert_eq!(CanonicalField::new(Namespace::S2n, "view_url").term_uri(), None);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = CanonicalSchema::builder(RecordKind::Name)
            .field(Namespace::S2n, "rank")
            .field(Namespace::S2n, "rank")
            .build();
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn test_same_name_in_different_namespaces_is_distinct() {
        let schema = CanonicalSchema::builder(RecordKind::Occurrence)
            .field(Namespace::Dwc, "kingdom")
            .field(Namespace::S2n, "kingdom")
            .build()
            .unwrap();
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_occurrence_schema_order() {
        let schema = occurrence_schema().unwrap();
        let names = schema.field_names();
        assert_eq!(names[0], "s2n:view_url");
        assert_eq!(names[2], "dcterms:accessRights");
        assert_eq!(names.last().copied(), Some("s2n:specify_identifier"));
        assert!(schema.position("dwc:kingdom") < schema.position("dwc:phylum"));
        assert!(schema.contains("mopho:specimen.specimen_id"));
    }

    #[test]
    fn test_builtin_schemas_build() {
        assert_eq!(name_schema().unwrap().kind(), RecordKind::Name);
        assert_eq!(map_schema().unwrap().len(), 14);
        assert_eq!(resolved_schema().unwrap().len(), 7);
    }

    #[test]
    fn test_rank_aliases() {
        assert!(RANKS[1].matches("Division"));
        assert!(RANKS[1].matches("phylum"));
        assert!(!RANKS[0].matches("kingdomKey"));
    }
}
