//! Rendering of aggregate envelopes

use clap::ValueEnum;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Table};
use s2n_broker::table::cell_text;
use s2n_broker::{AggregateEnvelope, CanonicalSchema, ComparisonTable};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// The outer envelope as JSON
    #[default]
    Json,
    /// JSON with each record naming its provider
    Annotated,
    /// Field-by-provider comparison table
    Table,
}

pub fn render(envelope: &AggregateEnvelope, schema: &CanonicalSchema, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&envelope.response()?)?),
        OutputFormat::Annotated => Ok(serde_json::to_string_pretty(&envelope.annotated_response()?)?),
        OutputFormat::Table => Ok(format_as_table(envelope, schema)),
    }
}

fn format_as_table(envelope: &AggregateEnvelope, schema: &CanonicalSchema) -> String {
    let comparison = ComparisonTable::from_aggregate(envelope, schema);
    let mut output = String::new();

    if comparison.is_empty() {
        output.push_str("No records found\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);

        let mut header = vec![Cell::new("field")];
        header.extend(comparison.columns.iter().map(|column| Cell::new(&column.label)));
        table.set_header(header);

        for row in &comparison.rows {
            let mut cells = vec![row.field.clone()];
            cells.extend(row.cells.iter().map(cell_text));
            table.add_row(cells);
        }
        output.push_str(&format!("{}\n", table));
    }

    for inner in envelope.records() {
        for entry in inner.errors() {
            output.push_str(&format!("{} {}: {}\n", inner.provider().code, entry.severity, entry.message));
        }
    }
    for entry in envelope.errors() {
        output.push_str(&format!("{}: {}\n", entry.severity, entry.message));
    }
    output
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use s2n_broker::{
        ErrInfo, OutputEnvelope, ProviderMeta, RecordKind, SchemaRegistry, Service, Severity,
        StandardizedRecord,
    };
    use serde_json::json;

    fn aggregate() -> AggregateEnvelope {
        let record: StandardizedRecord =
            serde_json::from_value(json!({"dwc:catalogNumber": "1396", "dwc:year": 1998})).unwrap();
        let gbif = OutputEnvelope::new(Service::Occurrence, ProviderMeta::new("gbif", "GBIF"))
            .with_records(vec![record]);
        let idb = OutputEnvelope::new(Service::Occurrence, ProviderMeta::new("idb", "iDigBio"))
            .with_errors(&ErrInfo::new().add(Severity::Error, "Request to idb timed out after 30 seconds"));
        OutputEnvelope::new(Service::Occurrence, ProviderMeta::new("specifynetwork", "Specify Network"))
            .with_records(vec![gbif, idb])
    }

    #[test]
    fn test_table_lists_fields_and_provider_errors() {
        let registry = SchemaRegistry::build().unwrap();
        let schema = registry.get_canonical_fields(RecordKind::Occurrence).unwrap();

        let text = render(&aggregate(), schema, OutputFormat::Table).unwrap();
        assert!(text.contains("GBIF"));
        assert!(text.contains("dwc:catalogNumber"));
        assert!(text.contains("1998"));
        assert!(text.contains("idb error: Request to idb timed out after 30 seconds"));
    }

    #[test]
    fn test_json_is_the_envelope_response() {
        let registry = SchemaRegistry::build().unwrap();
        let schema = registry.get_canonical_fields(RecordKind::Occurrence).unwrap();

        let text = render(&aggregate(), schema, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["count"], json!(2));
        assert_eq!(value["records"][1]["errors"][0]["error"], json!("Request to idb timed out after 30 seconds"));
    }
}
