use serde::{Deserialize, Serialize};

/// Operator of a single filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Equal (=)
    Equals,
    /// Substring match (~)
    Contains,
    /// Greater than or equal (>=)
    GreaterOrEqual,
    /// Less than or equal (<=)
    LessOrEqual,
}

impl FilterOperator {
    /// Operator token in the record store query language
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "=",
            FilterOperator::Contains => "~",
            FilterOperator::GreaterOrEqual => ">=",
            FilterOperator::LessOrEqual => "<=",
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(
            self,
            FilterOperator::GreaterOrEqual | FilterOperator::LessOrEqual
        )
    }
}

/// Right-hand side of a predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

/// Filter condition as sent by the UI (`extra_filters` of a list request)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterCondition {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_json_shape() {
        let json = r#"[
            {"field": "cause", "operator": "contains", "value": "heat"},
            {"field": "count", "operator": "greater_or_equal", "value": 3},
            {"field": "active", "operator": "equals", "value": true}
        ]"#;
        let conditions: Vec<FilterCondition> = serde_json::from_str(json).unwrap();

        assert_eq!(conditions[0], FilterCondition::new("cause", FilterOperator::Contains, "heat"));
        assert_eq!(conditions[1].value, FilterValue::Number(3.0));
        assert_eq!(conditions[2].value, FilterValue::Bool(true));
        assert!(conditions[1].operator.is_range());
    }
}
