//! In-process record store
//!
//! Evaluates [`FilterExpression`] structurally instead of parsing the query
//! string. Collections can be switched into a failing mode to exercise error
//! paths.

use async_trait::async_trait;
use chrono::Utc;
use contracts::domain::common::{FarmRecord, RecordPayload};
use contracts::shared::filter::{FilterCondition, FilterOperator, FilterValue};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{PoisonError, RwLock};

use super::{ListQuery, RecordPage, RecordStore};
use crate::shared::errors::StoreError;
use crate::shared::filter::FilterExpression;

#[derive(Default)]
pub struct MemoryRecordStore {
    collections: RwLock<HashMap<String, Vec<FarmRecord>>>,
    failing: RwLock<HashSet<String>>,
    next_id: AtomicU64,
    writes: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Положить запись как есть (минуя create)
    pub fn insert(&self, collection: &str, record: FarmRecord) {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    /// Все операции с коллекцией будут завершаться ошибкой транспорта
    pub fn fail_collection(&self, collection: &str) {
        self.failing
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection.to_string());
    }

    /// Число выполненных create/update/delete
    pub fn write_count(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    pub fn records(&self, collection: &str) -> Vec<FarmRecord> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn check_available(&self, collection: &str) -> Result<(), StoreError> {
        let failing = self.failing.read().unwrap_or_else(PoisonError::into_inner);
        if failing.contains(collection) {
            return Err(StoreError::Transport(format!(
                "connection reset while reading {}",
                collection
            )));
        }
        Ok(())
    }

    fn generate_id(&self) -> String {
        let n = self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        format!("rec{:012}", n)
    }
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S%.3fZ").to_string()
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn query(&self, collection: &str, query: &ListQuery) -> Result<RecordPage, StoreError> {
        self.check_available(collection)?;

        let mut items: Vec<FarmRecord> = self
            .records(collection)
            .into_iter()
            .filter(|r| matches_expression(&query.filter, r))
            .collect();

        if let Some(sort) = &query.sort {
            let (key, descending) = match sort.strip_prefix('-') {
                Some(key) => (key, true),
                None => (sort.as_str(), false),
            };
            items.sort_by(|a, b| {
                let ord = compare_values(a.value(key).as_ref(), b.value(key).as_ref());
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let total_items = items.len() as u64;
        let per_page = query.per_page.max(1) as usize;
        let skip = (query.page.max(1) as usize - 1) * per_page;
        let items = items.into_iter().skip(skip).take(per_page).collect();

        Ok(RecordPage { items, total_items })
    }

    async fn get_one(
        &self,
        collection: &str,
        id: &str,
        _expand: &[String],
    ) -> Result<FarmRecord, StoreError> {
        self.check_available(collection)?;
        self.records(collection)
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))
    }

    async fn create(
        &self,
        collection: &str,
        payload: &RecordPayload,
    ) -> Result<FarmRecord, StoreError> {
        self.check_available(collection)?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let mut fields = payload.clone();
        let owner_id = take_string(&mut fields, "owner_id");
        let farm_id = take_string(&mut fields, "farm_id");
        if owner_id.is_empty() {
            return Err(StoreError::Validation {
                message: "Failed to create record.".to_string(),
                fields: vec!["owner_id".to_string()],
            });
        }

        let now = timestamp();
        let record = FarmRecord {
            id: self.generate_id(),
            owner_id,
            farm_id,
            created: Some(now.clone()),
            updated: Some(now),
            fields,
        };
        self.insert(collection, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        payload: &RecordPayload,
    ) -> Result<FarmRecord, StoreError> {
        self.check_available(collection)?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let record = collections
            .get_mut(collection)
            .and_then(|items| items.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;

        for (key, value) in payload {
            if matches!(key.as_str(), "id" | "owner_id" | "farm_id" | "created" | "updated") {
                continue;
            }
            record.fields.insert(key.clone(), value.clone());
        }
        record.updated = Some(timestamp());
        Ok(record.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_available(collection)?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let items = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;
        let before = items.len();
        items.retain(|r| r.id != id);
        if items.len() == before {
            return Err(StoreError::NotFound(format!("{}/{}", collection, id)));
        }
        Ok(())
    }
}

fn take_string(fields: &mut RecordPayload, key: &str) -> String {
    match fields.remove(key) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

fn matches_expression(expr: &FilterExpression, record: &FarmRecord) -> bool {
    expr.conditions().iter().all(|c| matches_condition(c, record))
}

fn matches_condition(condition: &FilterCondition, record: &FarmRecord) -> bool {
    let Some(actual) = record.value(&condition.field) else {
        return false;
    };
    if actual.is_null() {
        return false;
    }
    let actual_text = value_text(&actual);
    let expected_text = match &condition.value {
        FilterValue::Text(t) => t.clone(),
        FilterValue::Number(n) => n.to_string(),
        FilterValue::Bool(b) => b.to_string(),
    };
    let numeric = actual_text
        .parse::<f64>()
        .ok()
        .zip(expected_text.parse::<f64>().ok());

    match condition.operator {
        FilterOperator::Equals => match numeric {
            Some((a, e)) => a == e,
            None => actual_text == expected_text,
        },
        FilterOperator::Contains => actual_text
            .to_lowercase()
            .contains(&expected_text.to_lowercase()),
        FilterOperator::GreaterOrEqual => match numeric {
            Some((a, e)) => a >= e,
            None => actual_text >= expected_text,
        },
        FilterOperator::LessOrEqual => match numeric {
            Some((a, e)) => a <= e,
            None => actual_text <= expected_text,
        },
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(|f| f.to_string()).unwrap_or_default(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => {
            let x = a.map(value_text).unwrap_or_default();
            let y = b.map(value_text).unwrap_or_default();
            x.cmp(&y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::filter::FilterBuilder;
    use serde_json::json;

    fn record(id: &str, owner: &str, date: &str, count: f64) -> FarmRecord {
        serde_json::from_value(json!({
            "id": id, "owner_id": owner, "farm_id": "f1",
            "date": date, "count": count, "cause": "Heat stress"
        }))
        .unwrap()
    }

    fn seeded() -> MemoryRecordStore {
        let store = MemoryRecordStore::new();
        store.insert("mortality", record("a", "u1", "2024-01-05", 2.0));
        store.insert("mortality", record("b", "u1", "2024-03-01", 7.0));
        store.insert("mortality", record("c", "u2", "2024-02-01", 1.0));
        store
    }

    #[tokio::test]
    async fn test_query_filters_sorts_and_pages() {
        let store = seeded();
        let query = ListQuery {
            page: 1,
            per_page: 1,
            filter: FilterBuilder::new()
                .equals("owner_id", "u1")
                .contains("cause", "heat")
                .at_least("date", "2024-01-01")
                .build()
                .unwrap(),
            sort: Some("-date".into()),
            expand: Vec::new(),
        };

        let page = store.query("mortality", &query).await.unwrap();
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "b");
    }

    #[tokio::test]
    async fn test_numeric_range() {
        let store = seeded();
        let query = ListQuery {
            page: 1,
            per_page: 50,
            filter: FilterBuilder::new().at_least("count", 2.0).build().unwrap(),
            ..Default::default()
        };
        let page = store.query("mortality", &query).await.unwrap();
        assert_eq!(page.total_items, 2);
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let store = MemoryRecordStore::new();
        let payload = json!({"owner_id": "u1", "farm_id": "f1", "count": 3})
            .as_object()
            .cloned()
            .unwrap();
        let created = store.create("mortality", &payload).await.unwrap();
        assert_eq!(created.owner_id, "u1");
        assert!(created.created.is_some());

        let patch = json!({"count": 4, "owner_id": "u9"}).as_object().cloned().unwrap();
        let updated = store.update("mortality", &created.id, &patch).await.unwrap();
        assert_eq!(updated.number("count"), 4.0);
        assert_eq!(updated.owner_id, "u1");

        store.delete("mortality", &created.id).await.unwrap();
        assert!(matches!(
            store.get_one("mortality", &created.id, &[]).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.write_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_collection() {
        let store = seeded();
        store.fail_collection("mortality");
        let result = store.query("mortality", &ListQuery::default()).await;
        assert!(matches!(result, Err(StoreError::Transport(_))));
    }
}
