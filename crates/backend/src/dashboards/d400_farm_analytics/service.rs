//! Farm analytics
//!
//! Each use-case loads one bounded snapshot through
//! [`RecordAccessService::get_full_list`] and runs the pure aggregation
//! engine over it. Results are computed on demand and never stored.

use chrono::NaiveDate;
use contracts::domain::common::{EntitySchema, FieldKind};
use contracts::shared::analytics::{
    ComparisonResponse, DateRange, DistributionResponse, MonthlyResponse, PeriodTotals,
    SummaryResponse, TopCategoriesResponse,
};
use contracts::shared::filter::{FilterCondition, FilterOperator};
use std::sync::Arc;

use crate::domain::records::{registry, FullList, RecordAccessService};
use crate::shared::aggregation;
use crate::shared::errors::RecordError;
use crate::shared::store::RecordStore;

/// Размер рейтинга по умолчанию
pub const DEFAULT_TOP_N: usize = 5;

pub struct FarmAnalytics {
    store: Arc<dyn RecordStore>,
    cap: u32,
}

impl FarmAnalytics {
    pub fn new(store: Arc<dyn RecordStore>, cap: u32) -> Self {
        Self { store, cap }
    }

    /// Количество записей и сводка по числовым полям (по умолчанию по всем)
    pub async fn summary(
        &self,
        entity: &str,
        owner_id: &str,
        farm_id: Option<&str>,
        fields: &[String],
        range: &DateRange,
    ) -> Result<SummaryResponse, RecordError> {
        let schema = registry().resolve(entity)?;
        let fields = numeric_fields(schema, fields, false)?;
        let snapshot = self.load(schema, owner_id, farm_id, range).await?;

        Ok(SummaryResponse {
            entity: schema.name.to_string(),
            record_count: snapshot.items.len(),
            truncated: snapshot.truncated,
            fields: aggregation::summarize(&snapshot.items, &fields),
        })
    }

    /// Помесячные суммы и средние
    pub async fn monthly(
        &self,
        entity: &str,
        owner_id: &str,
        farm_id: Option<&str>,
        fields: &[String],
        range: &DateRange,
    ) -> Result<MonthlyResponse, RecordError> {
        let schema = registry().resolve(entity)?;
        let date_field = date_field(schema)?;
        let fields = numeric_fields(schema, fields, false)?;
        let snapshot = self.load(schema, owner_id, farm_id, range).await?;

        Ok(MonthlyResponse {
            entity: schema.name.to_string(),
            truncated: snapshot.truncated,
            months: aggregation::group_by_month(&snapshot.items, date_field, &fields),
        })
    }

    /// Доля каждого поля в общей сумме (например, структура расхода воды).
    /// Производное поле-итог по умолчанию не участвует.
    pub async fn distribution(
        &self,
        entity: &str,
        owner_id: &str,
        farm_id: Option<&str>,
        fields: &[String],
        range: &DateRange,
    ) -> Result<DistributionResponse, RecordError> {
        let schema = registry().resolve(entity)?;
        let fields = numeric_fields(schema, fields, true)?;
        let snapshot = self.load(schema, owner_id, farm_id, range).await?;

        let totals = aggregation::sum_fields(&snapshot.items, &fields);
        let percentages = aggregation::percentage_distribution(&totals);
        Ok(DistributionResponse {
            entity: schema.name.to_string(),
            truncated: snapshot.truncated,
            totals,
            percentages,
        })
    }

    /// Сравнение суммы поля за период B с периодом A
    pub async fn compare_periods(
        &self,
        entity: &str,
        owner_id: &str,
        farm_id: Option<&str>,
        field: &str,
        period_a: &DateRange,
        period_b: &DateRange,
    ) -> Result<ComparisonResponse, RecordError> {
        let schema = registry().resolve(entity)?;
        date_field(schema)?;
        let fields = numeric_fields(schema, &[field.to_string()], false)?;

        let a = self.period_totals(schema, owner_id, farm_id, &fields, period_a).await?;
        let b = self.period_totals(schema, owner_id, farm_id, &fields, period_b).await?;
        let comparison = aggregation::period_comparison(a.total, a.count, b.total, b.count);

        Ok(ComparisonResponse {
            entity: schema.name.to_string(),
            field: field.to_string(),
            period_a: a,
            period_b: b,
            comparison,
        })
    }

    /// Топ категорий по количеству записей или по сумме весового поля
    pub async fn top_categories(
        &self,
        entity: &str,
        owner_id: &str,
        farm_id: Option<&str>,
        label_field: Option<&str>,
        weight_field: Option<&str>,
        n: usize,
    ) -> Result<TopCategoriesResponse, RecordError> {
        let schema = registry().resolve(entity)?;

        let label_field = match label_field.or(schema.category_field) {
            Some(name) if schema.field(name).is_some() => name,
            Some(name) => return Err(RecordError::invalid(vec![name.to_string()])),
            None => return Err(RecordError::missing(vec!["label".to_string()])),
        };
        if let Some(weight) = weight_field {
            numeric_fields(schema, &[weight.to_string()], false)?;
        }

        let snapshot = self
            .load(schema, owner_id, farm_id, &DateRange::default())
            .await?;
        let grouped = aggregation::count_by(&snapshot.items, label_field, weight_field);

        Ok(TopCategoriesResponse {
            entity: schema.name.to_string(),
            label_field: label_field.to_string(),
            weight_field: weight_field.map(str::to_string),
            truncated: snapshot.truncated,
            entries: aggregation::top_n(&grouped, n),
        })
    }

    async fn period_totals(
        &self,
        schema: &'static EntitySchema,
        owner_id: &str,
        farm_id: Option<&str>,
        fields: &[&str],
        range: &DateRange,
    ) -> Result<PeriodTotals, RecordError> {
        let snapshot = self.load(schema, owner_id, farm_id, range).await?;
        let totals = aggregation::sum_fields(&snapshot.items, fields);
        Ok(PeriodTotals {
            range: range.clone(),
            total: totals.values().sum(),
            count: snapshot.items.len(),
            truncated: snapshot.truncated,
        })
    }

    async fn load(
        &self,
        schema: &'static EntitySchema,
        owner_id: &str,
        farm_id: Option<&str>,
        range: &DateRange,
    ) -> Result<FullList, RecordError> {
        let conditions = range_conditions(schema, range)?;
        RecordAccessService::new(self.store.clone(), schema)
            .get_full_list(owner_id, farm_id, &conditions, self.cap)
            .await
    }
}

fn date_field(schema: &EntitySchema) -> Result<&'static str, RecordError> {
    schema
        .date_field
        .ok_or_else(|| RecordError::invalid(vec!["date".to_string()]))
}

/// Проверить запрошенные поля; пустой список означает все числовые поля схемы
fn numeric_fields(
    schema: &'static EntitySchema,
    requested: &[String],
    skip_derived: bool,
) -> Result<Vec<&'static str>, RecordError> {
    if requested.is_empty() {
        let derived_target = schema.derived.filter(|_| skip_derived).map(|r| r.target);
        return Ok(schema
            .numeric_fields()
            .into_iter()
            .filter(|name| Some(*name) != derived_target)
            .collect());
    }

    let mut fields = Vec::with_capacity(requested.len());
    let mut invalid = Vec::new();
    for name in requested {
        match schema.field(name) {
            Some(def) if def.kind == FieldKind::Number => fields.push(def.name),
            _ => invalid.push(name.clone()),
        }
    }
    if !invalid.is_empty() {
        return Err(RecordError::invalid(invalid));
    }
    Ok(fields)
}

/// Границы периода как `>=` / `<=` по полю даты; конец включает весь день
fn range_conditions(
    schema: &EntitySchema,
    range: &DateRange,
) -> Result<Vec<FilterCondition>, RecordError> {
    let from = range.from.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let to = range.to.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if from.is_none() && to.is_none() {
        return Ok(Vec::new());
    }

    let date_field = date_field(schema)?;
    let mut invalid = Vec::new();
    let mut conditions = Vec::new();

    if let Some(from) = from {
        if is_date(from) {
            conditions.push(FilterCondition::new(
                date_field,
                FilterOperator::GreaterOrEqual,
                from,
            ));
        } else {
            invalid.push("from".to_string());
        }
    }
    if let Some(to) = to {
        if is_date(to) {
            let end = if to.len() == 10 {
                format!("{} 23:59:59.999Z", to)
            } else {
                to.to_string()
            };
            conditions.push(FilterCondition::new(date_field, FilterOperator::LessOrEqual, end));
        } else {
            invalid.push("to".to_string());
        }
    }

    if !invalid.is_empty() {
        return Err(RecordError::invalid(invalid));
    }
    Ok(conditions)
}

fn is_date(value: &str) -> bool {
    value
        .get(..10)
        .map_or(false, |d| NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok())
}
