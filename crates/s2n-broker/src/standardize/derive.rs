//! Derivation functions for computed canonical fields
//!
//! Every function returns `None` when its inputs are missing or malformed; the
//! caller then omits the field.

use serde_json::{json, Map, Value};

use super::Standardizer;
use crate::query::QueryOptions;
use crate::schema::{Derivation, FieldSource, RecordKind, RANKS};

/// Known occurrence issue codes, GBIF and iDigBio
const ISSUE_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "COORDINATE_ROUNDED",
        "Original coordinate modified by rounding to 5 decimals",
    ),
    (
        "GEODETIC_DATUM_ASSUMED_WGS84",
        "Interpreted coordinates assume the WGS84 datum because the datum was not given or not interpretable",
    ),
    (
        "COUNTRY_DERIVED_FROM_COORDINATES",
        "Country was derived from the coordinates, not from verbatim values",
    ),
    (
        "TAXON_MATCH_FUZZY",
        "Matching to the taxonomic backbone could only be done with a fuzzy, non exact match",
    ),
    (
        "TAXON_MATCH_HIGHERRANK",
        "Matching to the taxonomic backbone could only be done on a higher rank",
    ),
    (
        "RECORDED_DATE_INVALID",
        "Recorded date could not be interpreted",
    ),
    (
        "gbif_canonical_match",
        "Scientific name matched a GBIF canonical name",
    ),
    (
        "rev_geocode_corrected",
        "Coordinates were corrected by reverse geocoding",
    ),
    (
        "dwc_datasetid_added",
        "Dataset identifier was added by iDigBio",
    ),
];

/// Human-readable description of an issue code, the code itself if unknown
pub fn describe_issue(code: &str) -> String {
    ISSUE_DESCRIPTIONS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, description)| description.to_string())
        .unwrap_or_else(|| code.to_string())
}

pub(crate) fn derive<S: Standardizer + ?Sized>(
    standardizer: &S,
    kind: RecordKind,
    derivation: &Derivation,
    raw: &Value,
    options: &QueryOptions,
) -> Option<Value> {
    match derivation {
        Derivation::ViewUrl(source) => {
            let id = text(source.lookup(raw)?)?;
            standardizer.view_url(kind, &id).map(Value::String)
        },
        Derivation::ApiUrl(source) => {
            let id = text(source.lookup(raw)?)?;
            standardizer.api_url(kind, &id).map(Value::String)
        },
        Derivation::AuthoredName {
            valid_name,
            name,
            valid_authority,
            authority,
        } => {
            let name = accepted_text(raw, valid_name, name, options.is_accepted)?;
            let author = accepted_text(raw, valid_authority, authority, options.is_accepted);
            Some(authored_name(&name, author.as_deref()))
        },
        Derivation::AcceptedName { valid, plain } => {
            accepted_text(raw, valid, plain, options.is_accepted).map(Value::String)
        },
        Derivation::RankHierarchy => rank_hierarchy(raw),
        Derivation::EncodedHierarchy(source) => encoded_hierarchy(source.lookup(raw)?),
        Derivation::DelimitedNames(source) => delimited_names(source.lookup(raw)?),
        Derivation::VernacularNames(source) => vernacular_names(source.lookup(raw)?),
        Derivation::Text(sources) => sources
            .iter()
            .filter_map(|source| source.lookup(raw))
            .find_map(text)
            .map(Value::String),
        Derivation::Issues(source) => issues(source.lookup(raw)?),
        Derivation::Joined { base, tail } => {
            let base = text(base.lookup(raw)?)?;
            let tail = text(tail.lookup(raw)?)?;
            Some(Value::String(format!("{}/{}", base.trim_end_matches('/'), tail)))
        },
        Derivation::TrimSuffix { source, suffix } => {
            let value = text(source.lookup(raw)?)?;
            let trimmed = value.strip_suffix(*suffix).unwrap_or(&value);
            Some(Value::String(trimmed.to_string()))
        },
        Derivation::Classify(labels) => labels
            .iter()
            .find(|(source, _)| source.lookup(raw).is_some_and(|v| !v.is_null()))
            .map(|(_, label)| Value::String(label.to_string())),
        Derivation::VendorParameters => options.color.as_ref().map(|color| json!({ "color": color })),
    }
}

/// Scalar rendered as text; empty strings and containers yield `None`
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A string, or every string of a list
fn strings(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Drop a leading `<digits>:` record identifier
fn strip_id_prefix(s: &str) -> &str {
    match s.split_once(':') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => s,
    }
}

fn dollar_parts(s: &str) -> impl Iterator<Item = &str> {
    s.split('$').map(str::trim).filter(|part| !part.is_empty())
}

/// Text of `valid`, or of `plain` when accepted names are not required
fn accepted_text(raw: &Value, valid: &FieldSource, plain: &FieldSource, is_accepted: bool) -> Option<String> {
    valid.lookup(raw).and_then(text).or_else(|| {
        if is_accepted {
            None
        } else {
            plain.lookup(raw).and_then(text)
        }
    })
}

fn authored_name(name: &str, author: Option<&str>) -> Value {
    match author {
        Some(author) => Value::String(format!("{} {}", name.trim(), author.trim())),
        None => Value::String(name.trim().to_string()),
    }
}

fn ordered_ranks(found: &[(usize, String)]) -> Option<Value> {
    if found.is_empty() {
        return None;
    }
    let mut sorted: Vec<_> = found.to_vec();
    sorted.sort_by_key(|(index, _)| *index);

    let mut hierarchy = Map::new();
    for (index, name) in sorted {
        hierarchy.insert(RANKS[index].name.to_string(), Value::String(name));
    }
    Some(Value::Array(vec![Value::Object(hierarchy)]))
}

fn rank_hierarchy(raw: &Value) -> Option<Value> {
    let object = raw.as_object()?;
    let found: Vec<(usize, String)> = RANKS
        .iter()
        .enumerate()
        .filter_map(|(index, rank)| {
            object
                .iter()
                .find(|(key, _)| rank.matches(key))
                .and_then(|(_, value)| text(value))
                .map(|name| (index, name))
        })
        .collect();
    ordered_ranks(&found)
}

fn encoded_hierarchy(value: &Value) -> Option<Value> {
    let encoded = strings(value).into_iter().next()?;
    let mut found: Vec<(usize, String)> = Vec::new();

    for part in dollar_parts(strip_id_prefix(encoded)) {
        let Some((label, name)) = part.split_once(':') else {
            continue;
        };
        let Some(index) = RANKS.iter().position(|rank| rank.matches(label.trim())) else {
            continue;
        };
        if !found.iter().any(|(seen, _)| *seen == index) && !name.trim().is_empty() {
            found.push((index, name.trim().to_string()));
        }
    }
    ordered_ranks(&found)
}

fn delimited_names(value: &Value) -> Option<Value> {
    let names: Vec<Value> = strings(value)
        .into_iter()
        .flat_map(|s| dollar_parts(strip_id_prefix(s)))
        .map(|name| Value::String(name.to_string()))
        .collect();
    (!names.is_empty()).then_some(Value::Array(names))
}

fn vernacular_names(value: &Value) -> Option<Value> {
    let names: Vec<Value> = strings(value)
        .into_iter()
        .filter_map(|entry| dollar_parts(entry).next())
        .map(|name| Value::String(name.to_string()))
        .collect();
    (!names.is_empty()).then_some(Value::Array(names))
}

fn issues(value: &Value) -> Option<Value> {
    let codes = strings(value);
    if codes.is_empty() {
        return None;
    }
    let described: Map<String, Value> = codes
        .into_iter()
        .map(|code| (code.to_string(), Value::String(describe_issue(code))))
        .collect();
    Some(Value::Object(described))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_hierarchy_uses_canonical_order() {
        let raw = json!({
            "Species": "Poa annua",
            "Genus": "Poa",
            "Kingdom": "Plantae",
            "Family": "Poaceae"
        });
        let hierarchy = rank_hierarchy(&raw).unwrap();
        let ranks = hierarchy[0].as_object().unwrap();
        let keys: Vec<_> = ranks.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Kingdom", "Family", "Genus", "Species"]);
        assert_eq!(ranks["Genus"], json!("Poa"));
    }

    #[test]
    fn test_rank_hierarchy_ignores_empty_ranks() {
        assert_eq!(rank_hierarchy(&json!({"kingdom": "", "usageKey": 5})), None);
    }

    #[test]
    fn test_encoded_hierarchy() {
        let raw = json!("41107:$Kingdom:Plantae$Subkingdom:Viridiplantae$Division:Tracheophyta$Class:Magnoliopsida$Order:Poales$Family:Poaceae$Genus:Poa$Species:Poa annua$");
        let hierarchy = encoded_hierarchy(&raw).unwrap();
        assert_eq!(
            hierarchy,
            json!([{
                "Kingdom": "Plantae",
                "Phylum": "Tracheophyta",
                "Class": "Magnoliopsida",
                "Order": "Poales",
                "Family": "Poaceae",
                "Genus": "Poa",
                "Species": "Poa annua"
            }])
        );
    }

    #[test]
    fn test_encoded_hierarchy_accepts_list() {
        let raw = json!(["$Kingdom:Animalia$Genus:Canis$"]);
        assert_eq!(
            encoded_hierarchy(&raw).unwrap(),
            json!([{"Kingdom": "Animalia", "Genus": "Canis"}])
        );
        assert_eq!(encoded_hierarchy(&json!("no ranks here")), None);
    }

    #[test]
    fn test_delimited_names() {
        let raw = json!(["41107:$Poa annua aquatica$Poa annua reptans$Aira pumila$"]);
        assert_eq!(
            delimited_names(&raw).unwrap(),
            json!(["Poa annua aquatica", "Poa annua reptans", "Aira pumila"])
        );
    }

    #[test]
    fn test_vernacular_names() {
        let raw = json!(["$annual bluegrass$English$N$152797$", "$pâturin annuel$French$N$1$"]);
        assert_eq!(
            vernacular_names(&raw).unwrap(),
            json!(["annual bluegrass", "pâturin annuel"])
        );
    }

    #[test]
    fn test_accepted_text_prefers_valid_source() {
        let valid = FieldSource::key("valid_authority");
        let plain = FieldSource::key("authority");

        let raw = json!({"authority": "(W. Wood, 1802)"});
        assert_eq!(
            accepted_text(&raw, &valid, &plain, false).as_deref(),
            Some("(W. Wood, 1802)")
        );
        assert_eq!(accepted_text(&raw, &valid, &plain, true), None);

        let raw = json!({"valid_authority": "(W. Wood, 1802)", "authority": "Linnaeus"});
        assert_eq!(
            accepted_text(&raw, &valid, &plain, true).as_deref(),
            Some("(W. Wood, 1802)")
        );
    }

    #[test]
    fn test_authored_name() {
        assert_eq!(
            authored_name(" Abra alba", Some("(W. Wood, 1802) ")),
            json!("Abra alba (W. Wood, 1802)")
        );
        assert_eq!(authored_name("Abra alba", None), json!("Abra alba"));
    }

    #[test]
    fn test_issues_described() {
        let value = issues(&json!(["COORDINATE_ROUNDED", "SOMETHING_NEW"])).unwrap();
        assert_eq!(
            value["COORDINATE_ROUNDED"],
            json!("Original coordinate modified by rounding to 5 decimals")
        );
        assert_eq!(value["SOMETHING_NEW"], json!("SOMETHING_NEW"));
        assert_eq!(issues(&json!([])), None);
    }

    #[test]
    fn test_text_renders_scalars() {
        assert_eq!(text(&json!(1999)), Some("1999".to_string()));
        assert_eq!(text(&json!("  ")), None);
        assert_eq!(text(&json!({"a": 1})), None);
    }
}
