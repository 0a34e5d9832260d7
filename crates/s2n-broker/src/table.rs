//! Field-by-provider comparison of an aggregate result
//!
//! Each standardized record becomes a column, each canonical field a row.
//! Specify records lead because they describe the specimen the user holds.

use serde::Serialize;
use serde_json::Value;

use crate::envelope::AggregateEnvelope;
use crate::provider::ProviderCode;
use crate::schema::CanonicalSchema;

/// Fields shown in column headers or not meant for side-by-side reading
pub const EXCLUDED_FIELDS: [&str; 5] = [
    "s2n:view_url",
    "s2n:api_url",
    "s2n:issues",
    "s2n:hierarchy",
    "s2n:gbif_occurrence_url",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnHeader {
    pub code: String,
    pub label: String,
    pub view_url: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub field: String,
    /// One cell per column, empty string where the record lacks the field
    pub cells: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<TableRow>,
}

impl ComparisonTable {
    pub fn from_aggregate(envelope: &AggregateEnvelope, schema: &CanonicalSchema) -> Self {
        let mut entries: Vec<_> = envelope.provider_records().collect();
        // Stable: provider order is kept within each group
        entries.sort_by_key(|(inner, _)| inner.provider().code != ProviderCode::Specify.as_str());

        let columns = entries
            .iter()
            .map(|(inner, record)| ColumnHeader {
                code: inner.provider().code.clone(),
                label: inner.provider().label.clone(),
                view_url: record
                    .get("s2n:view_url")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                icon_url: inner.provider().icon_url.clone(),
            })
            .collect();

        let rows = schema
            .field_names()
            .into_iter()
            .filter(|field| !EXCLUDED_FIELDS.contains(field))
            .filter(|field| entries.iter().any(|(_, record)| record.contains_key(field)))
            .map(|field| TableRow {
                field: field.to_string(),
                cells: entries
                    .iter()
                    .map(|(_, record)| {
                        record
                            .get(field)
                            .cloned()
                            .unwrap_or_else(|| Value::String(String::new()))
                    })
                    .collect(),
            })
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Plain-text rendering of a cell value
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join("; "),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| format!("{}: {}", key, cell_text(value)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::envelope::{OutputEnvelope, ProviderMeta};
    use crate::provider::Service;
    use crate::schema::{RecordKind, SchemaRegistry};
    use crate::standardize::StandardizedRecord;
    use serde_json::json;

    fn inner(code: &str, label: &str, record: Value) -> OutputEnvelope {
        let record: StandardizedRecord = serde_json::from_value(record).unwrap();
        OutputEnvelope::new(Service::Occurrence, ProviderMeta::new(code, label)).with_records(vec![record])
    }

    #[test]
    fn test_specify_first_and_missing_cells_empty() {
        let registry = SchemaRegistry::build().unwrap();
        let schema = registry.get_canonical_fields(RecordKind::Occurrence).unwrap();
        let outer: AggregateEnvelope =
            OutputEnvelope::new(Service::Occurrence, ProviderMeta::new("specifynetwork", "Specify Network"))
                .with_records(vec![
                    inner(
                        "gbif",
                        "GBIF",
                        json!({"s2n:view_url": "https://www.gbif.org/occurrence/1", "dwc:catalogNumber": "KU 1", "dwc:year": "1998"}),
                    ),
                    inner("specify", "Specify", json!({"dwc:catalogNumber": "KU 1"})),
                ]);

        let table = ComparisonTable::from_aggregate(&outer, schema);

        let codes: Vec<_> = table.columns.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["specify", "gbif"]);
        assert_eq!(
            table.columns[1].view_url.as_deref(),
            Some("https://www.gbif.org/occurrence/1")
        );

        let fields: Vec<_> = table.rows.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, ["dwc:catalogNumber", "dwc:year"]);
        assert_eq!(table.rows[1].cells, vec![json!(""), json!("1998")]);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!(["Poa", "Festuca"])), "Poa; Festuca");
        assert_eq!(cell_text(&json!(42)), "42");
        assert_eq!(cell_text(&json!({"Kingdom": "Plantae"})), "Kingdom: Plantae");
    }
}
