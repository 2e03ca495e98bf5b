use contracts::domain::catalog;
use contracts::domain::common::EntitySchema;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::shared::errors::RecordError;

/// Реестр схем сущностей, строится один раз при первом обращении
pub struct SchemaRegistry {
    by_name: HashMap<&'static str, &'static EntitySchema>,
    ordered: Vec<&'static EntitySchema>,
}

static REGISTRY: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::from_catalog);

pub fn registry() -> &'static SchemaRegistry {
    &REGISTRY
}

impl SchemaRegistry {
    fn from_catalog() -> Self {
        let ordered: Vec<&'static EntitySchema> = catalog::all_schemas().collect();
        let by_name = ordered.iter().map(|s| (s.name, *s)).collect();
        Self { by_name, ordered }
    }

    pub fn get(&self, name: &str) -> Option<&'static EntitySchema> {
        self.by_name.get(name).copied()
    }

    /// Схема по имени или `UnknownEntity`
    pub fn resolve(&self, name: &str) -> Result<&'static EntitySchema, RecordError> {
        self.get(name)
            .ok_or_else(|| RecordError::UnknownEntity(name.to_string()))
    }

    /// Профиль фермы, затем секции экспорта в порядке каталога
    pub fn list_all(&self) -> &[&'static EntitySchema] {
        &self.ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown() {
        let schema = registry().resolve("animal_mortality").unwrap();
        assert_eq!(schema.collection, "mortality");

        assert!(matches!(
            registry().resolve("greenhouses"),
            Err(RecordError::UnknownEntity(name)) if name == "greenhouses"
        ));
    }

    #[test]
    fn test_list_all_starts_with_farm_profile() {
        let all = registry().list_all();
        assert_eq!(all.len(), 21);
        assert_eq!(all[0].name, "farm");
        assert_eq!(all[1].name, "water_consumption");
    }
}
