use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Результат операции для UI
///
/// Ошибки валидации и доступа возвращаются значением, а не исключением,
/// чтобы форма могла подсветить конкретные поля.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    /// Ошибки по полям: имя поля -> текст
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, String>>,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn with_field_errors(mut self, errors: BTreeMap<String, String>) -> Self {
        if !errors.is_empty() {
            self.field_errors = Some(errors);
        }
        self
    }
}
