//! Compile-time schema of a farm record entity
//!
//! Every entity type (water consumption, fuel intake, mortality...) is a
//! `'static` [`EntitySchema`] value. The generic record service, the analytics
//! use-cases and the export pipeline all read their behaviour from it.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use super::farm_record::{FarmRecord, RecordPayload};

/// Keys that scope a record to its owner and farm
pub const SCOPE_KEYS: [&str; 2] = ["owner_id", "farm_id"];

/// Keys assigned by the store or fixed at creation
pub const IMMUTABLE_KEYS: [&str; 5] = ["id", "owner_id", "farm_id", "created", "updated"];

/// Value type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Number,
    Text,
    Boolean,
    /// ISO-8601 date (`YYYY-MM-DD`, time part tolerated)
    Date,
    /// Id of a record in another collection
    Relation,
}

/// Field declaration
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
}

impl FieldDef {
    pub const fn number(name: &'static str, label: &'static str) -> Self {
        Self { name, kind: FieldKind::Number, label }
    }

    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self { name, kind: FieldKind::Text, label }
    }

    pub const fn boolean(name: &'static str, label: &'static str) -> Self {
        Self { name, kind: FieldKind::Boolean, label }
    }

    pub const fn date(name: &'static str, label: &'static str) -> Self {
        Self { name, kind: FieldKind::Date, label }
    }

    pub const fn relation(name: &'static str, label: &'static str) -> Self {
        Self { name, kind: FieldKind::Relation, label }
    }
}

/// `target = sum(sources)` unless the caller supplies `target` explicitly
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedFieldRule {
    pub target: &'static str,
    pub sources: &'static [&'static str],
}

/// Schema of one record collection
#[derive(Debug, Serialize)]
pub struct EntitySchema {
    /// Registry key, also used in API paths
    pub name: &'static str,
    /// Collection name in the record store
    pub collection: &'static str,
    /// Human readable title (export section header)
    pub title: &'static str,
    /// Records belong to a farm (everything except the farm profile itself)
    pub farm_scoped: bool,
    pub fields: &'static [FieldDef],
    pub required: &'static [&'static str],
    pub derived: Option<DerivedFieldRule>,
    /// Date the record is about, for time-series entities
    pub date_field: Option<&'static str>,
    /// Default sort key, always applied descending
    pub sort_key: &'static str,
    pub expand: &'static [&'static str],
    /// Default label field for category rankings
    pub category_field: Option<&'static str>,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn numeric_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Number)
            .map(|f| f.name)
            .collect()
    }

    /// Field can appear in a filter expression
    pub fn is_filterable(&self, name: &str) -> bool {
        IMMUTABLE_KEYS.contains(&name) || self.field(name).is_some()
    }

    /// Required fields including the farm scope key
    pub fn required_fields(&self) -> Vec<&'static str> {
        let mut required = Vec::with_capacity(self.required.len() + 1);
        if self.farm_scoped {
            required.push("farm_id");
        }
        required.extend(self.required.iter().copied());
        required
    }

    /// Required fields that are absent, null, or blank text
    pub fn missing_required(&self, payload: &RecordPayload) -> Vec<String> {
        self.required_fields()
            .into_iter()
            .filter(|name| match payload.get(*name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .map(str::to_string)
            .collect()
    }

    /// Check keys and value types, coercing numeric and boolean strings in place.
    /// Returns the names of invalid fields.
    pub fn normalize_payload(&self, payload: &mut RecordPayload) -> Vec<String> {
        let mut invalid = Vec::new();
        let keys: Vec<String> = payload.keys().cloned().collect();

        for key in keys {
            if SCOPE_KEYS.contains(&key.as_str()) {
                if !matches!(payload.get(&key), Some(Value::String(_)) | Some(Value::Null)) {
                    invalid.push(key);
                }
                continue;
            }

            let Some(field) = self.field(&key) else {
                invalid.push(key);
                continue;
            };

            let outcome = match payload.get(&key) {
                Some(value) => coerce_value(field.kind, value),
                None => continue,
            };
            match outcome {
                Coerced::Keep => {}
                Coerced::Replace(v) => {
                    payload.insert(key, v);
                }
                Coerced::Drop => {
                    payload.remove(&key);
                }
                Coerced::Invalid => invalid.push(key),
            }
        }

        invalid
    }

    /// Absent numeric fields become 0
    pub fn apply_numeric_defaults(&self, payload: &mut RecordPayload) {
        for name in self.numeric_fields() {
            if payload.get(name).map_or(true, Value::is_null) {
                payload.insert(name.to_string(), Value::from(0.0));
            }
        }
    }

    /// Fill the derived field from its sources when the caller left it out
    pub fn apply_derived_on_create(&self, payload: &mut RecordPayload) {
        let Some(rule) = self.derived else {
            return;
        };
        if payload.get(rule.target).map_or(false, |v| !v.is_null()) {
            return;
        }
        let total: f64 = rule
            .sources
            .iter()
            .map(|s| payload.get(*s).and_then(Value::as_f64).unwrap_or(0.0))
            .sum();
        payload.insert(rule.target.to_string(), Value::from(total));
    }

    /// Recompute the derived field when the payload touches a source and
    /// does not override the target. Untouched sources keep their stored value.
    pub fn apply_derived_on_update(&self, current: &FarmRecord, payload: &mut RecordPayload) {
        let Some(rule) = self.derived else {
            return;
        };
        match payload.get(rule.target) {
            Some(Value::Null) => {
                payload.remove(rule.target);
            }
            Some(_) => return,
            None => {}
        }
        if !rule.sources.iter().any(|s| payload.contains_key(*s)) {
            return;
        }
        let total: f64 = rule
            .sources
            .iter()
            .map(|s| match payload.get(*s) {
                Some(v) => v.as_f64().unwrap_or(0.0),
                None => current.number(s),
            })
            .sum();
        payload.insert(rule.target.to_string(), Value::from(total));
    }

    /// Read-side cleanup: numeric fields always hold numbers (malformed or absent -> 0)
    pub fn normalize_record(&self, record: &mut FarmRecord) {
        for name in self.numeric_fields() {
            let number = match record.fields.get(name) {
                Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
                Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
                _ => 0.0,
            };
            let number = if number.is_finite() { number } else { 0.0 };
            record.fields.insert(name.to_string(), Value::from(number));
        }
    }
}

enum Coerced {
    Keep,
    Replace(Value),
    Drop,
    Invalid,
}

fn coerce_value(kind: FieldKind, value: &Value) -> Coerced {
    match (kind, value) {
        (_, Value::Null) => Coerced::Keep,
        (FieldKind::Number, Value::Number(_)) => Coerced::Keep,
        (FieldKind::Number, Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Coerced::Drop;
            }
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Coerced::Replace(Value::from(n)),
                _ => Coerced::Invalid,
            }
        }
        (FieldKind::Boolean, Value::Bool(_)) => Coerced::Keep,
        (FieldKind::Boolean, Value::String(s)) => match s.trim() {
            "true" => Coerced::Replace(Value::Bool(true)),
            "false" => Coerced::Replace(Value::Bool(false)),
            _ => Coerced::Invalid,
        },
        (FieldKind::Date, Value::String(s)) => {
            if s.trim().is_empty() || is_iso_date(s) {
                Coerced::Keep
            } else {
                Coerced::Invalid
            }
        }
        (FieldKind::Text | FieldKind::Relation, Value::String(_)) => Coerced::Keep,
        _ => Coerced::Invalid,
    }
}

fn is_iso_date(s: &str) -> bool {
    s.get(..10)
        .map_or(false, |d| NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok())
}
