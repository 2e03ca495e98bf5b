//! Aggregation engine
//!
//! Pure, total functions over an already fetched record set. Numeric values
//! are read with [`FarmRecord::number`], so an absent field counts as 0.
//! Malformed numeric strings are normalized to 0 when records are read from
//! the store, before they get here.

use contracts::domain::common::FarmRecord;
use contracts::shared::analytics::{
    FieldSummary, MinMax, MonthlyBucket, PeriodComparison, RankedEntry, Trend,
};
use std::collections::BTreeMap;

use super::format::round2;

/// Label used when a record has no value in the grouping field
pub const UNSPECIFIED_LABEL: &str = "Unspecified";

/// Sum of each field in a single pass
pub fn sum_fields(records: &[FarmRecord], fields: &[&str]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = fields.iter().map(|f| (f.to_string(), 0.0)).collect();
    for record in records {
        for field in fields {
            if let Some(total) = totals.get_mut(*field) {
                *total += record.number(field);
            }
        }
    }
    totals
}

pub fn average(records: &[FarmRecord], field: &str) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let sum: f64 = records.iter().map(|r| r.number(field)).sum();
    sum / records.len() as f64
}

pub fn min_max(records: &[FarmRecord], field: &str) -> MinMax {
    let mut values = records.iter().map(|r| r.number(field));
    let Some(first) = values.next() else {
        return MinMax::default();
    };
    values.fold(MinMax { min: first, max: first }, |acc, v| MinMax {
        min: acc.min.min(v),
        max: acc.max.max(v),
    })
}

/// Total, average, min and max per field
pub fn summarize(records: &[FarmRecord], fields: &[&str]) -> BTreeMap<String, FieldSummary> {
    let totals = sum_fields(records, fields);
    fields
        .iter()
        .map(|field| {
            let total = totals.get(*field).copied().unwrap_or(0.0);
            let average = if records.is_empty() {
                0.0
            } else {
                total / records.len() as f64
            };
            let MinMax { min, max } = min_max(records, field);
            (
                field.to_string(),
                FieldSummary {
                    total,
                    average,
                    min,
                    max,
                },
            )
        })
        .collect()
}

/// Group by `YYYY-MM` (first 7 characters of the ISO date), ascending.
/// Records without a usable date are skipped.
pub fn group_by_month(
    records: &[FarmRecord],
    date_field: &str,
    value_fields: &[&str],
) -> Vec<MonthlyBucket> {
    let mut months: BTreeMap<String, (usize, BTreeMap<String, f64>)> = BTreeMap::new();

    for record in records {
        let Some(month) = record.month_key(date_field) else {
            continue;
        };
        let (count, totals) = months.entry(month.to_string()).or_insert_with(|| {
            (
                0,
                value_fields.iter().map(|f| (f.to_string(), 0.0)).collect(),
            )
        });
        *count += 1;
        for field in value_fields {
            if let Some(total) = totals.get_mut(*field) {
                *total += record.number(field);
            }
        }
    }

    months
        .into_iter()
        .map(|(month, (count, totals))| {
            let averages = totals
                .iter()
                .map(|(field, total)| (field.clone(), total / count as f64))
                .collect();
            MonthlyBucket {
                month,
                count,
                totals,
                averages,
            }
        })
        .collect()
}

/// Share of each part in the total, in percent with 2 decimals.
/// A zero total maps every label to 0.
pub fn percentage_distribution(parts: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let total: f64 = parts.values().sum();
    parts
        .iter()
        .map(|(label, part)| {
            let percent = if total == 0.0 {
                0.0
            } else {
                round2(part / total * 100.0)
            };
            (label.clone(), percent)
        })
        .collect()
}

/// Period B against period A. Counts are carried for callers that report
/// them; the comparison itself is on totals.
pub fn period_comparison(
    total_a: f64,
    _count_a: usize,
    total_b: f64,
    _count_b: usize,
) -> PeriodComparison {
    let delta_total = total_b - total_a;
    let percent_change = if total_a == 0.0 {
        0.0
    } else {
        round2(delta_total / total_a * 100.0)
    };
    let trend = if delta_total > 0.0 {
        Trend::Increase
    } else if delta_total < 0.0 {
        Trend::Decrease
    } else {
        Trend::Unchanged
    };
    PeriodComparison {
        delta_total,
        percent_change,
        trend,
    }
}

/// Count records per label in first-seen order, optionally weighting each
/// record by a numeric field (e.g. head count per mortality entry)
pub fn count_by(
    records: &[FarmRecord],
    label_field: &str,
    weight_field: Option<&str>,
) -> Vec<(String, f64)> {
    let mut order: Vec<(String, f64)> = Vec::new();
    for record in records {
        let label = record
            .text(label_field)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNSPECIFIED_LABEL);
        let weight = weight_field.map_or(1.0, |f| record.number(f));
        match order.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += weight,
            None => order.push((label.to_string(), weight)),
        }
    }
    order
}

/// Highest counts first; ties keep first-seen order
pub fn top_n(grouped_counts: &[(String, f64)], n: usize) -> Vec<RankedEntry> {
    let mut ranked: Vec<&(String, f64)> = grouped_counts.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
        .into_iter()
        .take(n)
        .map(|(label, count)| RankedEntry {
            label: label.clone(),
            count: *count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use serde_json::json;

    fn record(date: &str, drinking: f64, cause: Option<&str>) -> FarmRecord {
        let mut value = json!({
            "id": "r", "owner_id": "u1", "farm_id": "f1",
            "date": date, "drinking": drinking
        });
        if let Some(cause) = cause {
            value["cause"] = json!(cause);
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_sum_fields_treats_missing_as_zero() {
        let records = vec![record("2024-01-01", 10.0, None), record("2024-01-02", 5.5, None)];
        let totals = sum_fields(&records, &["drinking", "cleaning"]);
        assert_eq!(totals, btreemap! {"cleaning".to_string() => 0.0, "drinking".to_string() => 15.5});
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(average(&[], "drinking"), 0.0);
        assert_eq!(min_max(&[], "drinking"), MinMax { min: 0.0, max: 0.0 });
        assert!(group_by_month(&[], "date", &["drinking"]).is_empty());
        let summary = summarize(&[], &["drinking"]);
        assert_eq!(summary["drinking"], FieldSummary::default());
    }

    #[test]
    fn test_min_max_and_average() {
        let records = vec![
            record("2024-01-01", 4.0, None),
            record("2024-01-02", -1.0, None),
            record("2024-01-03", 9.0, None),
        ];
        assert_eq!(min_max(&records, "drinking"), MinMax { min: -1.0, max: 9.0 });
        assert_eq!(average(&records, "drinking"), 4.0);
    }

    #[test]
    fn test_group_by_month_orders_ascending() {
        let records = vec![
            record("2024-01-05", 10.0, None),
            record("2024-03-01", 6.0, None),
            record("2024-01-20", 20.0, None),
            record("not a date", 99.0, None),
        ];
        let months = group_by_month(&records, "date", &["drinking"]);

        let keys: Vec<_> = months.iter().map(|m| (m.month.as_str(), m.count)).collect();
        assert_eq!(keys, vec![("2024-01", 2), ("2024-03", 1)]);
        assert_eq!(months[0].totals["drinking"], 30.0);
        assert_eq!(months[0].averages["drinking"], 15.0);
    }

    #[test]
    fn test_percentage_distribution() {
        let zeros = percentage_distribution(&btreemap! {"a".to_string() => 0.0, "b".to_string() => 0.0});
        assert_eq!(zeros, btreemap! {"a".to_string() => 0.0, "b".to_string() => 0.0});

        let split = percentage_distribution(&btreemap! {
            "drinking".to_string() => 1.0,
            "cleaning".to_string() => 2.0,
        });
        assert_eq!(split["drinking"], 33.33);
        assert_eq!(split["cleaning"], 66.67);
    }

    #[test]
    fn test_period_comparison() {
        let up = period_comparison(100.0, 3, 150.0, 4);
        assert_eq!(up.delta_total, 50.0);
        assert_eq!(up.percent_change, 50.0);
        assert_eq!(up.trend, Trend::Increase);

        let from_zero = period_comparison(0.0, 0, 80.0, 2);
        assert_eq!(from_zero.percent_change, 0.0);
        assert_eq!(from_zero.trend, Trend::Increase);

        assert_eq!(period_comparison(50.0, 1, 25.0, 1).trend, Trend::Decrease);
        assert_eq!(period_comparison(5.0, 1, 5.0, 1).trend, Trend::Unchanged);
    }

    #[test]
    fn test_count_by_and_top_n_keep_first_seen_ties() {
        let records = vec![
            record("2024-01-01", 0.0, Some("disease")),
            record("2024-01-02", 0.0, Some("heat")),
            record("2024-01-03", 0.0, Some("injury")),
            record("2024-01-04", 0.0, Some("heat")),
            record("2024-01-05", 0.0, Some("injury")),
            record("2024-01-06", 0.0, None),
        ];
        let grouped = count_by(&records, "cause", None);
        assert_eq!(grouped[0], ("disease".to_string(), 1.0));
        assert_eq!(grouped[3], (UNSPECIFIED_LABEL.to_string(), 1.0));

        let top = top_n(&grouped, 3);
        let labels: Vec<_> = top.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["heat", "injury", "disease"]);
    }

    #[test]
    fn test_count_by_weighted() {
        let mut a = record("2024-01-01", 0.0, Some("heat"));
        a.fields.insert("count".into(), json!(4));
        let mut b = record("2024-01-02", 0.0, Some("heat"));
        b.fields.insert("count".into(), json!(3));
        let grouped = count_by(&[a, b], "cause", Some("count"));
        assert_eq!(grouped, vec![("heat".to_string(), 7.0)]);
    }
}
