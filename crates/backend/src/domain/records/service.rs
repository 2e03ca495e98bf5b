use contracts::domain::common::schema::IMMUTABLE_KEYS;
use contracts::domain::common::{EntitySchema, FarmRecord, RecordPayload};
use contracts::shared::filter::FilterCondition;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::ownership;
use super::registry::registry;
use crate::shared::errors::RecordError;
use crate::shared::filter::{FilterBuilder, FilterExpression};
use crate::shared::store::{ListQuery, RecordStore};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 500;
/// Лимит выборки для аналитики по умолчанию
pub const DEFAULT_FULL_LIST_CAP: u32 = 500;

/// Страница списка записей
#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub items: Vec<FarmRecord>,
    pub total_items: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Ограниченная выборка для аналитики и экспорта
#[derive(Debug, Clone, Default)]
pub struct FullList {
    pub items: Vec<FarmRecord>,
    /// Хранилище сообщило больше записей, чем вошло в лимит
    pub truncated: bool,
}

/// Доступ к записям одной сущности от имени владельца
#[derive(Clone)]
pub struct RecordAccessService {
    store: Arc<dyn RecordStore>,
    schema: &'static EntitySchema,
}

impl RecordAccessService {
    pub fn new(store: Arc<dyn RecordStore>, schema: &'static EntitySchema) -> Self {
        Self { store, schema }
    }

    /// Сервис по имени сущности из реестра
    pub fn for_entity(store: Arc<dyn RecordStore>, entity: &str) -> Result<Self, RecordError> {
        Ok(Self::new(store, registry().resolve(entity)?))
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    /// Страница записей владельца (и фермы, если задана), новые первыми
    pub async fn list(
        &self,
        owner_id: &str,
        farm_id: Option<&str>,
        page: u32,
        page_size: u32,
        extra_filters: &[FilterCondition],
    ) -> Result<ListResult, RecordError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let filter = self.scope_filter(owner_id, farm_id, extra_filters)?;

        let query = ListQuery {
            page,
            per_page: page_size,
            filter,
            sort: Some(format!("-{}", self.schema.sort_key)),
            expand: self.expand(),
        };
        let result = self
            .store
            .query(self.schema.collection, &query)
            .await
            .map_err(|e| RecordError::from_store(e, self.schema.collection, None))?;

        Ok(ListResult {
            items: self.normalized(result.items),
            total_items: result.total_items,
            page,
            page_size,
        })
    }

    pub async fn get(&self, id: &str, owner_id: &str) -> Result<FarmRecord, RecordError> {
        let mut record =
            ownership::authorize(self.store.as_ref(), self.schema, id, owner_id).await?;
        self.schema.normalize_record(&mut record);
        Ok(record)
    }

    /// Создать запись от имени владельца
    ///
    /// Вся валидация выполняется до обращения к хранилищу.
    pub async fn create(
        &self,
        owner_id: &str,
        mut payload: RecordPayload,
    ) -> Result<FarmRecord, RecordError> {
        if let Some(Value::String(claimed)) = payload.get("owner_id") {
            if !claimed.is_empty() && claimed != owner_id {
                tracing::warn!(
                    "Owner {} tried to create a {} record for {}",
                    owner_id,
                    self.schema.collection,
                    claimed
                );
                return Err(RecordError::PermissionDenied {
                    collection: self.schema.collection.to_string(),
                    id: String::new(),
                });
            }
        }
        if !self.schema.farm_scoped {
            payload.remove("farm_id");
        }

        let invalid = self.schema.normalize_payload(&mut payload);
        let missing = self.schema.missing_required(&payload);
        if !missing.is_empty() || !invalid.is_empty() {
            return Err(RecordError::Validation {
                missing_fields: missing,
                invalid_fields: invalid,
            });
        }

        payload.insert("owner_id".to_string(), Value::String(owner_id.to_string()));
        self.schema.apply_derived_on_create(&mut payload);
        self.schema.apply_numeric_defaults(&mut payload);

        let mut record = self
            .store
            .create(self.schema.collection, &payload)
            .await
            .map_err(|e| RecordError::from_store(e, self.schema.collection, None))?;
        self.schema.normalize_record(&mut record);

        tracing::info!("Created {}/{} for owner {}", self.schema.collection, record.id, owner_id);
        Ok(record)
    }

    /// Частичное обновление записи владельца
    pub async fn update(
        &self,
        id: &str,
        mut payload: RecordPayload,
        owner_id: &str,
    ) -> Result<FarmRecord, RecordError> {
        let mut current =
            ownership::authorize(self.store.as_ref(), self.schema, id, owner_id).await?;
        self.schema.normalize_record(&mut current);

        // Неизменяемые ключи допустимы только с текущим значением
        let mut invalid = Vec::new();
        for key in IMMUTABLE_KEYS {
            let Some(value) = payload.remove(key) else {
                continue;
            };
            if !value.is_null() && Some(&value) != current.value(key).as_ref() {
                invalid.push(key.to_string());
            }
        }
        invalid.extend(self.schema.normalize_payload(&mut payload));

        let missing: Vec<String> = self
            .schema
            .required
            .iter()
            .filter(|name| match payload.get(**name) {
                Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                _ => false,
            })
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() || !invalid.is_empty() {
            return Err(RecordError::Validation {
                missing_fields: missing,
                invalid_fields: invalid,
            });
        }

        if payload.is_empty() {
            return Ok(current);
        }

        self.schema.apply_derived_on_update(&current, &mut payload);

        let mut record = self
            .store
            .update(self.schema.collection, id, &payload)
            .await
            .map_err(|e| RecordError::from_store(e, self.schema.collection, Some(id)))?;
        self.schema.normalize_record(&mut record);

        tracing::info!("Updated {}/{}", self.schema.collection, id);
        Ok(record)
    }

    pub async fn delete(&self, id: &str, owner_id: &str) -> Result<(), RecordError> {
        ownership::authorize(self.store.as_ref(), self.schema, id, owner_id).await?;
        self.store
            .delete(self.schema.collection, id)
            .await
            .map_err(|e| RecordError::from_store(e, self.schema.collection, Some(id)))?;

        tracing::info!("Deleted {}/{}", self.schema.collection, id);
        Ok(())
    }

    /// Одна страница размером `cap`, без дальнейшей пагинации
    pub async fn get_full_list(
        &self,
        owner_id: &str,
        farm_id: Option<&str>,
        filters: &[FilterCondition],
        cap: u32,
    ) -> Result<FullList, RecordError> {
        let cap = cap.max(1);
        let query = ListQuery {
            page: 1,
            per_page: cap,
            filter: self.scope_filter(owner_id, farm_id, filters)?,
            sort: Some(format!("-{}", self.schema.sort_key)),
            expand: self.expand(),
        };
        let result = self
            .store
            .query(self.schema.collection, &query)
            .await
            .map_err(|e| RecordError::from_store(e, self.schema.collection, None))?;

        let truncated = result.total_items > result.items.len() as u64;
        if truncated {
            tracing::warn!(
                "{}: {} records match, only {} loaded (cap {})",
                self.schema.collection,
                result.total_items,
                result.items.len(),
                cap
            );
        }

        Ok(FullList {
            items: self.normalized(result.items),
            truncated,
        })
    }

    /// `owner_id = caller [&& farm = given] [&& extra...]`
    fn scope_filter(
        &self,
        owner_id: &str,
        farm_id: Option<&str>,
        extra: &[FilterCondition],
    ) -> Result<FilterExpression, RecordError> {
        let unknown: Vec<String> = extra
            .iter()
            .filter(|c| !self.schema.is_filterable(&c.field))
            .map(|c| c.field.clone())
            .collect();
        if !unknown.is_empty() {
            return Err(RecordError::invalid(unknown));
        }

        let mut builder = FilterBuilder::new().equals("owner_id", owner_id);
        if let Some(farm_id) = farm_id.filter(|f| !f.is_empty()) {
            // У профиля фермы нет farm_id: ферма и есть запись
            let key = if self.schema.farm_scoped { "farm_id" } else { "id" };
            builder = builder.equals(key, farm_id);
        }
        builder.extend(extra.iter().cloned()).build()
    }

    fn expand(&self) -> Vec<String> {
        self.schema.expand.iter().map(|s| s.to_string()).collect()
    }

    fn normalized(&self, mut items: Vec<FarmRecord>) -> Vec<FarmRecord> {
        for record in &mut items {
            self.schema.normalize_record(record);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::registry;
    use crate::shared::store::MemoryRecordStore;
    use contracts::domain::catalog::{ANIMAL_MORTALITY, FARM, WATER_CONSUMPTION};
    use contracts::shared::filter::FilterOperator;
    use serde_json::json;

    fn payload(value: Value) -> RecordPayload {
        value.as_object().cloned().unwrap()
    }

    fn service(store: &Arc<MemoryRecordStore>, schema: &'static EntitySchema) -> RecordAccessService {
        RecordAccessService::new(store.clone(), schema)
    }

    #[tokio::test]
    async fn test_water_total_is_derived_on_create_and_update() {
        let store = Arc::new(MemoryRecordStore::new());
        let water = service(&store, &WATER_CONSUMPTION);

        let created = water
            .create(
                "u1",
                payload(json!({
                    "farm_id": "f1", "date": "2024-01-05",
                    "drinking": 10, "cleaning": "5", "delivered": 0
                })),
            )
            .await
            .unwrap();
        assert_eq!(created.number("total"), 15.0);
        assert_eq!(created.owner_id, "u1");

        let updated = water
            .update(&created.id, payload(json!({"drinking": 20})), "u1")
            .await
            .unwrap();
        assert_eq!(updated.number("total"), 25.0);
    }

    #[tokio::test]
    async fn test_explicit_total_is_kept() {
        let store = Arc::new(MemoryRecordStore::new());
        let created = service(&store, &WATER_CONSUMPTION)
            .create(
                "u1",
                payload(json!({"farm_id": "f1", "date": "2024-01-05", "drinking": 10, "total": 12})),
            )
            .await
            .unwrap();
        assert_eq!(created.number("total"), 12.0);
    }

    #[tokio::test]
    async fn test_missing_required_never_reaches_store() {
        let store = Arc::new(MemoryRecordStore::new());
        let err = service(&store, &ANIMAL_MORTALITY)
            .create("u1", payload(json!({"farm_id": "f1", "date": " ", "count": 3})))
            .await
            .unwrap_err();

        match err {
            RecordError::Validation { missing_fields, invalid_fields } => {
                assert!(missing_fields.contains(&"date".to_string()));
                assert!(invalid_fields.is_empty());
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_create_for_another_owner_is_denied() {
        let store = Arc::new(MemoryRecordStore::new());
        let err = service(&store, &WATER_CONSUMPTION)
            .create(
                "u1",
                payload(json!({"owner_id": "u2", "farm_id": "f1", "date": "2024-01-05"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::PermissionDenied { .. }));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_and_delete_by_other_owner_are_denied() {
        let store = Arc::new(MemoryRecordStore::new());
        let water = service(&store, &WATER_CONSUMPTION);
        let created = water
            .create("u1", payload(json!({"farm_id": "f1", "date": "2024-01-05"})))
            .await
            .unwrap();

        let update = water
            .update(&created.id, payload(json!({"drinking": 1})), "u2")
            .await
            .unwrap_err();
        assert!(matches!(update, RecordError::PermissionDenied { .. }));

        let delete = water.delete(&created.id, "u2").await.unwrap_err();
        assert!(matches!(delete, RecordError::PermissionDenied { .. }));

        assert_eq!(store.write_count(), 1);
        water.delete(&created.id, "u1").await.unwrap();
        assert!(store.records("water_consumption").is_empty());
    }

    #[tokio::test]
    async fn test_every_entity_denies_foreign_update_and_delete() {
        let store = Arc::new(MemoryRecordStore::new());
        for schema in registry().list_all().iter().copied() {
            let id = format!("{}-1", schema.name);
            store.insert(
                schema.collection,
                serde_json::from_value(json!({"id": id, "owner_id": "u1", "farm_id": "f1"}))
                    .unwrap(),
            );
            let records = service(&store, schema);

            let update = records
                .update(&id, payload(json!({"notes": "x"})), "u2")
                .await
                .unwrap_err();
            assert!(
                matches!(update, RecordError::PermissionDenied { .. }),
                "{}: {update:?}",
                schema.name
            );

            let delete = records.delete(&id, "u2").await.unwrap_err();
            assert!(
                matches!(delete, RecordError::PermissionDenied { .. }),
                "{}: {delete:?}",
                schema.name
            );
        }
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.records("water_consumption").len(), 1);
    }

    #[tokio::test]
    async fn test_update_reads_stored_numeric_strings() {
        let store = Arc::new(MemoryRecordStore::new());
        store.insert(
            "water_consumption",
            serde_json::from_value(json!({
                "id": "w1", "owner_id": "u1", "farm_id": "f1", "date": "2024-01-05",
                "drinking": 10, "cleaning": "5", "delivered": 0, "total": 15
            }))
            .unwrap(),
        );
        let water = service(&store, &WATER_CONSUMPTION);
        assert_eq!(water.get("w1", "u1").await.unwrap().number("cleaning"), 5.0);

        let updated = water
            .update("w1", payload(json!({"drinking": 20})), "u1")
            .await
            .unwrap();
        assert_eq!(updated.number("total"), 25.0);
    }

    #[tokio::test]
    async fn test_update_with_null_total_recomputes() {
        let store = Arc::new(MemoryRecordStore::new());
        let water = service(&store, &WATER_CONSUMPTION);
        let created = water
            .create(
                "u1",
                payload(json!({
                    "farm_id": "f1", "date": "2024-01-05",
                    "drinking": 10, "cleaning": 5, "total": null
                })),
            )
            .await
            .unwrap();
        assert_eq!(created.number("total"), 15.0);

        let updated = water
            .update(&created.id, payload(json!({"drinking": 20, "total": null})), "u1")
            .await
            .unwrap();
        assert_eq!(updated.number("total"), 25.0);
    }

    #[tokio::test]
    async fn test_update_rejects_changing_scope_keys() {
        let store = Arc::new(MemoryRecordStore::new());
        let water = service(&store, &WATER_CONSUMPTION);
        let created = water
            .create("u1", payload(json!({"farm_id": "f1", "date": "2024-01-05"})))
            .await
            .unwrap();

        let err = water
            .update(&created.id, payload(json!({"farm_id": "f2"})), "u1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RecordError::Validation { invalid_fields, .. } if invalid_fields == vec!["farm_id"]
        ));

        // Same value is accepted and ignored
        let ok = water
            .update(&created.id, payload(json!({"farm_id": "f1", "notes": "ok"})), "u1")
            .await
            .unwrap();
        assert_eq!(ok.text("notes"), Some("ok"));
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_sorted() {
        let store = Arc::new(MemoryRecordStore::new());
        let water = service(&store, &WATER_CONSUMPTION);
        for (owner, farm, date) in [
            ("u1", "f1", "2024-01-05"),
            ("u1", "f1", "2024-02-05"),
            ("u1", "f2", "2024-03-05"),
            ("u2", "f1", "2024-04-05"),
        ] {
            water
                .create(owner, payload(json!({"farm_id": farm, "date": date})))
                .await
                .unwrap();
        }

        let page = water.list("u1", Some("f1"), 0, 0, &[]).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].text("date"), Some("2024-02-05"));

        let all = water.list("u1", None, 1, 10_000, &[]).await.unwrap();
        assert_eq!(all.page_size, MAX_PAGE_SIZE);
        assert_eq!(all.total_items, 3);
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_filter_fields() {
        let store = Arc::new(MemoryRecordStore::new());
        let extra = [FilterCondition::new("password", FilterOperator::Equals, "x")];
        let err = service(&store, &WATER_CONSUMPTION)
            .list("u1", None, 1, 50, &extra)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RecordError::Validation { invalid_fields, .. } if invalid_fields == vec!["password"]
        ));
    }

    #[tokio::test]
    async fn test_farm_profile_is_scoped_by_id() {
        let store = Arc::new(MemoryRecordStore::new());
        let farms = service(&store, &FARM);
        let farm = farms
            .create("u1", payload(json!({"name": "Green Acres", "farm_id": "ignored"})))
            .await
            .unwrap();
        assert!(farm.farm_id.is_empty());

        let found = farms.list("u1", Some(&farm.id), 1, 50, &[]).await.unwrap();
        assert_eq!(found.total_items, 1);
    }

    #[tokio::test]
    async fn test_full_list_flags_truncation() {
        let store = Arc::new(MemoryRecordStore::new());
        let mortality = service(&store, &ANIMAL_MORTALITY);
        for day in 1..=3 {
            mortality
                .create(
                    "u1",
                    payload(json!({
                        "farm_id": "f1", "date": format!("2024-01-0{day}"),
                        "species": "hens", "count": day
                    })),
                )
                .await
                .unwrap();
        }

        let capped = mortality.get_full_list("u1", Some("f1"), &[], 2).await.unwrap();
        assert_eq!(capped.items.len(), 2);
        assert!(capped.truncated);

        let full = mortality.get_full_list("u1", Some("f1"), &[], 500).await.unwrap();
        assert_eq!(full.items.len(), 3);
        assert!(!full.truncated);
    }
}
