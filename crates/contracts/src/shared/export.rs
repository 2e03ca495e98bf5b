//! Сводный отчёт по ферме

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Состояние секции отчёта
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionStatus {
    Ok,
    /// Запрос выполнен, данных нет
    Empty,
    /// Запрос завершился ошибкой, секция пропущена
    Error { reason: String },
}

impl SectionStatus {
    pub fn label(&self) -> String {
        match self {
            SectionStatus::Ok => "ok".to_string(),
            SectionStatus::Empty => "empty".to_string(),
            SectionStatus::Error { reason } => format!("error: {}", reason),
        }
    }
}

/// Одна секция: таблица записей одного типа
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub entity: String,
    pub title: String,
    #[serde(flatten)]
    pub status: SectionStatus,
    /// Выборка упёрлась в лимит
    pub truncated: bool,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportSection {
    pub fn has_rows(&self) -> bool {
        self.status == SectionStatus::Ok && !self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeReport {
    pub farm_id: String,
    pub farm_name: String,
    pub generated_at: DateTime<Utc>,
    pub metadata: Vec<MetadataEntry>,
    pub sections: Vec<ReportSection>,
}

impl CompositeReport {
    pub fn non_empty_sections(&self) -> impl Iterator<Item = &ReportSection> {
        self.sections.iter().filter(|s| s.has_rows())
    }

    pub fn failed_sections(&self) -> impl Iterator<Item = &ReportSection> {
        self.sections
            .iter()
            .filter(|s| matches!(s.status, SectionStatus::Error { .. }))
    }
}
