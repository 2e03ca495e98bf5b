use contracts::domain::common::{EntitySchema, FarmRecord};

use crate::shared::errors::RecordError;
use crate::shared::store::RecordStore;

/// Загрузить запись и убедиться, что она принадлежит вызывающему.
///
/// Чужая запись всегда даёт `PermissionDenied`, даже если она существует.
pub async fn authorize(
    store: &dyn RecordStore,
    schema: &EntitySchema,
    id: &str,
    caller_owner_id: &str,
) -> Result<FarmRecord, RecordError> {
    let expand: Vec<String> = schema.expand.iter().map(|s| s.to_string()).collect();
    let record = store
        .get_one(schema.collection, id, &expand)
        .await
        .map_err(|e| RecordError::from_store(e, schema.collection, Some(id)))?;

    if record.owner_id != caller_owner_id {
        tracing::warn!(
            "Access to {}/{} denied for owner {}",
            schema.collection,
            id,
            caller_owner_id
        );
        return Err(RecordError::PermissionDenied {
            collection: schema.collection.to_string(),
            id: id.to_string(),
        });
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::store::MemoryRecordStore;
    use contracts::domain::catalog::ANIMAL_MORTALITY;
    use serde_json::json;

    fn store() -> MemoryRecordStore {
        let store = MemoryRecordStore::new();
        store.insert(
            "mortality",
            serde_json::from_value(json!({
                "id": "m1", "owner_id": "u1", "farm_id": "f1", "count": 2
            }))
            .unwrap(),
        );
        store
    }

    #[tokio::test]
    async fn test_owner_gets_record() {
        let store = store();
        let record = authorize(&store, &ANIMAL_MORTALITY, "m1", "u1").await.unwrap();
        assert_eq!(record.id, "m1");
    }

    #[tokio::test]
    async fn test_other_owner_is_denied_not_hidden() {
        let store = store();
        let err = authorize(&store, &ANIMAL_MORTALITY, "m1", "u2").await.unwrap_err();
        assert!(matches!(err, RecordError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_missing_record() {
        let store = store();
        let err = authorize(&store, &ANIMAL_MORTALITY, "nope", "u1").await.unwrap_err();
        assert!(matches!(err, RecordError::NotFound { id, .. } if id == "nope"));
    }
}
