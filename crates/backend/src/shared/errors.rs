use contracts::shared::response::OperationResult;
use std::collections::BTreeMap;
use thiserror::Error;

/// Ошибки адаптера хранилища записей
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    /// Хранилище отклонило данные (серверная валидация схемы)
    #[error("rejected by record store: {message}")]
    Validation { message: String, fields: Vec<String> },

    #[error("access forbidden: {0}")]
    Forbidden(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else if e.is_timeout() {
            StoreError::Transport(format!("request timed out: {}", e))
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

/// Ошибки операций над записями
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("validation failed (missing: {missing_fields:?}, invalid: {invalid_fields:?})")]
    Validation {
        missing_fields: Vec<String>,
        invalid_fields: Vec<String>,
    },

    #[error("permission denied for {collection}/{id}")]
    PermissionDenied { collection: String, id: String },

    #[error("record {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("{summary}: {message}")]
    RemoteStore { summary: String, message: String },
}

impl RecordError {
    pub fn missing(fields: Vec<String>) -> Self {
        RecordError::Validation {
            missing_fields: fields,
            invalid_fields: Vec::new(),
        }
    }

    pub fn invalid(fields: Vec<String>) -> Self {
        RecordError::Validation {
            missing_fields: Vec::new(),
            invalid_fields: fields,
        }
    }

    /// Перевести ошибку адаптера в ошибку операции
    pub fn from_store(err: StoreError, collection: &str, id: Option<&str>) -> Self {
        match err {
            StoreError::NotFound(_) => RecordError::NotFound {
                collection: collection.to_string(),
                id: id.unwrap_or_default().to_string(),
            },
            StoreError::Validation { fields, .. } if !fields.is_empty() => {
                RecordError::invalid(fields)
            }
            StoreError::Validation { message, .. } => RecordError::RemoteStore {
                summary: format!("Record store rejected the {} record", collection),
                message,
            },
            other => RecordError::RemoteStore {
                summary: format!("Record store request for {} failed", collection),
                message: other.to_string(),
            },
        }
    }

    /// Структурированный ответ для UI
    pub fn to_operation_result(&self) -> OperationResult {
        match self {
            RecordError::Validation {
                missing_fields,
                invalid_fields,
            } => {
                let mut errors = BTreeMap::new();
                for field in missing_fields {
                    errors.insert(field.clone(), "required".to_string());
                }
                for field in invalid_fields {
                    errors.insert(field.clone(), "invalid value".to_string());
                }
                OperationResult::failure("Validation failed").with_field_errors(errors)
            }
            RecordError::PermissionDenied { .. } => {
                OperationResult::failure("You do not have permission to access this record")
            }
            RecordError::NotFound { .. } => OperationResult::failure("Record not found"),
            RecordError::UnknownEntity(name) => {
                OperationResult::failure(format!("Unknown record type: {}", name))
            }
            RecordError::RemoteStore { summary, message } => {
                OperationResult::failure(format!("{}: {}", summary, message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_validation_with_fields_becomes_invalid_fields() {
        let err = RecordError::from_store(
            StoreError::Validation {
                message: "Failed to create record.".into(),
                fields: vec!["date".into()],
            },
            "fuel_entries",
            None,
        );
        match err {
            RecordError::Validation { invalid_fields, .. } => assert_eq!(invalid_fields, vec!["date"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_transport_error_keeps_original_message() {
        let err = RecordError::from_store(
            StoreError::Transport("connection refused".into()),
            "mortality",
            Some("r1"),
        );
        let text = err.to_string();
        assert!(text.starts_with("Record store request for mortality failed"));
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_validation_result_lists_fields() {
        let result = RecordError::Validation {
            missing_fields: vec!["date".into()],
            invalid_fields: vec!["count".into()],
        }
        .to_operation_result();

        assert!(!result.success);
        let errors = result.field_errors.unwrap();
        assert_eq!(errors.get("date").map(String::as_str), Some("required"));
        assert_eq!(errors.get("count").map(String::as_str), Some("invalid value"));
    }
}
