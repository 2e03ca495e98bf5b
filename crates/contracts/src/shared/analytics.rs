//! Результаты аналитики (никогда не сохраняются)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

/// Сводка по одному числовому полю
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSummary {
    pub total: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

/// Группа записей за один месяц
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// YYYY-MM
    pub month: String,
    pub count: usize,
    pub totals: BTreeMap<String, f64>,
    pub averages: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increase,
    Decrease,
    Unchanged,
}

/// Сравнение периода B с периодом A
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub delta_total: f64,
    pub percent_change: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub label: String,
    pub count: f64,
}

/// Границы периода (включительно), ISO-даты
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

// ============================================================================
// Ответы API аналитики
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub entity: String,
    pub record_count: usize,
    /// Выборка обрезана лимитом и может быть неполной
    pub truncated: bool,
    pub fields: BTreeMap<String, FieldSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyResponse {
    pub entity: String,
    pub truncated: bool,
    pub months: Vec<MonthlyBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionResponse {
    pub entity: String,
    pub truncated: bool,
    pub totals: BTreeMap<String, f64>,
    pub percentages: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub range: DateRange,
    pub total: f64,
    pub count: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResponse {
    pub entity: String,
    pub field: String,
    pub period_a: PeriodTotals,
    pub period_b: PeriodTotals,
    pub comparison: PeriodComparison,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopCategoriesResponse {
    pub entity: String,
    pub label_field: String,
    pub weight_field: Option<String>,
    pub truncated: bool,
    pub entries: Vec<RankedEntry>,
}

// ============================================================================
// Параметры запросов
// ============================================================================

/// Query-параметры эндпоинтов аналитики (не все нужны каждому эндпоинту)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub farm_id: Option<String>,
    /// Числовые поля через запятую
    #[serde(default)]
    pub fields: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,

    /// Поле сравнения периодов
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub a_from: Option<String>,
    #[serde(default)]
    pub a_to: Option<String>,
    #[serde(default)]
    pub b_from: Option<String>,
    #[serde(default)]
    pub b_to: Option<String>,

    /// Поле-категория для рейтинга
    #[serde(default)]
    pub label: Option<String>,
    /// Числовой вес записи в рейтинге (по умолчанию 1)
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub n: Option<usize>,
}

impl AnalyticsQuery {
    pub fn field_list(&self) -> Vec<String> {
        self.fields
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }

    pub fn period_a(&self) -> DateRange {
        DateRange {
            from: self.a_from.clone(),
            to: self.a_to.clone(),
        }
    }

    pub fn period_b(&self) -> DateRange {
        DateRange {
            from: self.b_from.clone(),
            to: self.b_to.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_list_skips_blanks() {
        let query = AnalyticsQuery {
            fields: Some("drinking, cleaning,,".into()),
            ..Default::default()
        };
        assert_eq!(query.field_list(), vec!["drinking", "cleaning"]);
        assert!(AnalyticsQuery::default().field_list().is_empty());
    }
}
