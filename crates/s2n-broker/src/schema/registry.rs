//! Startup-built schema registry
//!
//! [`SchemaRegistry::build`] assembles every canonical schema and provider
//! field map once, validates them, and is then shared read-only. Tests can
//! assemble their own registry from fixture schemas with [`SchemaRegistry::new`].

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{BrokerError, Result};
use crate::provider::ProviderCode;
use crate::schema::{
    map_schema, name_schema, occurrence_schema, provider_maps, resolved_schema, CanonicalSchema,
    ProviderFieldMap, RecordKind,
};

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<RecordKind, CanonicalSchema>,
    maps: IndexMap<(ProviderCode, RecordKind), ProviderFieldMap>,
}

impl SchemaRegistry {
    /// An empty registry to be filled with [`with_schema`](Self::with_schema)
    /// and [`with_map`](Self::with_map)
    pub fn new() -> Self {
        Self::default()
    }

    /// The broker's built-in vocabulary and provider maps
    pub fn build() -> Result<Self> {
        let occurrence = occurrence_schema()?;
        let registry = Self::new()
            .with_map(provider_maps::gbif_occurrence(&occurrence))
            .with_map(provider_maps::idigbio_occurrence(&occurrence))
            .with_map(provider_maps::specify_occurrence(&occurrence))
            .with_map(provider_maps::morphosource_occurrence())
            .with_map(provider_maps::gbif_name())
            .with_map(provider_maps::itis_name())
            .with_map(provider_maps::worms_name())
            .with_map(provider_maps::ipni_name())
            .with_map(provider_maps::lifemapper_map())
            .with_map(provider_maps::specify_resolved())
            .with_schema(name_schema()?)
            .with_schema(occurrence)
            .with_schema(map_schema()?)
            .with_schema(resolved_schema()?);

        registry.validate()?;
        debug!(
            schemas = registry.schemas.len(),
            maps = registry.maps.len(),
            "Schema registry built"
        );
        Ok(registry)
    }

    pub fn with_schema(mut self, schema: CanonicalSchema) -> Self {
        self.schemas.insert(schema.kind(), schema);
        self
    }

    pub fn with_map(mut self, map: ProviderFieldMap) -> Self {
        self.maps.insert((map.provider(), map.kind()), map);
        self
    }

    pub fn get_canonical_fields(&self, kind: RecordKind) -> Result<&CanonicalSchema> {
        self.schemas
            .get(&kind)
            .ok_or_else(|| BrokerError::configuration(format!("No canonical schema for {} records", kind)))
    }

    pub fn get_provider_map(&self, provider: ProviderCode, kind: RecordKind) -> Result<&ProviderFieldMap> {
        self.maps.get(&(provider, kind)).ok_or_else(|| {
            BrokerError::configuration(format!("No {} field map registered for {}", kind, provider))
        })
    }

    pub fn has_map(&self, provider: ProviderCode, kind: RecordKind) -> bool {
        self.maps.contains_key(&(provider, kind))
    }

    pub fn provider_maps(&self) -> impl Iterator<Item = &ProviderFieldMap> {
        self.maps.values()
    }

    /// Every map targets only fields of its kind's schema, each at most once
    pub fn validate(&self) -> Result<()> {
        for map in self.maps.values() {
            let schema = self.get_canonical_fields(map.kind())?;
            let mut seen = Vec::with_capacity(map.len());
            for target in map.targets() {
                if !schema.contains(target) {
                    return Err(BrokerError::configuration(format!(
                        "{} {} map targets {}, which is not a canonical {} field",
                        map.provider(),
                        map.kind(),
                        target,
                        map.kind()
                    )));
                }
                if seen.contains(&target) {
                    return Err(BrokerError::configuration(format!(
                        "{} {} map targets {} twice",
                        map.provider(),
                        map.kind(),
                        target
                    )));
                }
                seen.push(target);
            }
        }
        Ok(())
    }
}
