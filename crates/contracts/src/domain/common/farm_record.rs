use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Произвольный набор полей записи (тело create/update запроса)
pub type RecordPayload = Map<String, Value>;

/// Служебные поля хранилища, которые не относятся к данным записи
pub const STORAGE_METADATA_KEYS: [&str; 3] = ["collectionId", "collectionName", "expand"];

/// Запись фермы (общая форма для всех типов записей)
///
/// Поля, специфичные для сущности, лежат в `fields` и описываются
/// схемой [`EntitySchema`](super::EntitySchema).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmRecord {
    /// Идентификатор, назначенный хранилищем
    pub id: String,

    /// Пользователь, создавший запись
    pub owner_id: String,

    /// Ферма, к которой относится запись (пусто для профиля фермы)
    #[serde(default)]
    pub farm_id: String,

    /// Время создания (назначается хранилищем)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// Время последнего изменения (назначается хранилищем)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    /// Поля сущности
    #[serde(flatten)]
    pub fields: RecordPayload,
}

impl FarmRecord {
    /// Числовое значение поля; отсутствующее или нечисловое значение даёт 0
    pub fn number(&self, field: &str) -> f64 {
        self.fields
            .get(field)
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Ключ месяца `YYYY-MM` из ISO-даты в поле `field`
    pub fn month_key(&self, field: &str) -> Option<&str> {
        let date = self.text(field)?;
        let key = date.get(..7)?;
        let bytes = key.as_bytes();
        let well_formed = bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        well_formed.then_some(key)
    }

    /// Значение по имени колонки, включая системные поля
    pub fn value(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::String(self.id.clone())),
            "owner_id" => Some(Value::String(self.owner_id.clone())),
            "farm_id" => Some(Value::String(self.farm_id.clone())),
            "created" => self.created.clone().map(Value::String),
            "updated" => self.updated.clone().map(Value::String),
            other => self.fields.get(other).cloned(),
        }
    }

    /// Имена всех присутствующих колонок (без служебных полей хранилища)
    pub fn present_keys(&self) -> Vec<&str> {
        let mut keys = vec!["id", "owner_id"];
        if !self.farm_id.is_empty() {
            keys.push("farm_id");
        }
        keys.extend(
            self.fields
                .iter()
                .filter(|(k, v)| !v.is_null() && !STORAGE_METADATA_KEYS.contains(&k.as_str()))
                .map(|(k, _)| k.as_str()),
        );
        if self.created.is_some() {
            keys.push("created");
        }
        if self.updated.is_some() {
            keys.push("updated");
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> FarmRecord {
        serde_json::from_value(json!({
            "id": "r1",
            "owner_id": "u1",
            "farm_id": "f1",
            "created": "2024-01-05 10:00:00.000Z",
            "collectionId": "abc",
            "collectionName": "water_consumption",
            "date": "2024-01-05",
            "drinking": 10,
            "notes": null
        }))
        .unwrap()
    }

    #[test]
    fn test_flattened_fields() {
        let record = sample();
        assert_eq!(record.owner_id, "u1");
        assert_eq!(record.number("drinking"), 10.0);
        assert_eq!(record.number("cleaning"), 0.0);
        assert_eq!(record.text("date"), Some("2024-01-05"));
    }

    #[test]
    fn test_month_key() {
        let mut record = sample();
        assert_eq!(record.month_key("date"), Some("2024-01"));

        record.fields.insert("date".into(), json!("Jan 2024"));
        assert_eq!(record.month_key("date"), None);

        record.fields.insert("date".into(), json!("2024"));
        assert_eq!(record.month_key("date"), None);
    }

    #[test]
    fn test_present_keys_skip_storage_metadata() {
        let record = sample();
        let keys = record.present_keys();
        assert!(keys.contains(&"drinking"));
        assert!(keys.contains(&"created"));
        assert!(!keys.contains(&"collectionId"));
        assert!(!keys.contains(&"notes"));
        assert!(!keys.contains(&"updated"));
    }
}
