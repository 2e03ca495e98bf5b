//! Filter expressions for the record store query language
//!
//! Grammar: `field="value"`, `field~"value"`, `field>=value`, `field<=value`,
//! joined with ` && `. Field names are checked against a strict identifier
//! pattern; every quoted value is escaped, so free text can never close the
//! literal and inject another predicate.

use contracts::shared::filter::{FilterCondition, FilterOperator, FilterValue};

use super::errors::RecordError;

/// Immutable AND-combination of predicates, built per query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression {
    conditions: Vec<FilterCondition>,
}

impl FilterExpression {
    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render to the store query string (empty string for no predicates)
    pub fn render(&self) -> String {
        self.conditions
            .iter()
            .map(render_condition)
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

/// Builder for [`FilterExpression`]
#[derive(Debug, Default)]
pub struct FilterBuilder {
    conditions: Vec<FilterCondition>,
    invalid: Vec<String>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.condition(FilterCondition::new(field, FilterOperator::Equals, value))
    }

    /// Substring match; blank search text adds nothing
    pub fn contains(self, field: &str, text: &str) -> Self {
        if text.trim().is_empty() {
            return self;
        }
        self.condition(FilterCondition::new(field, FilterOperator::Contains, text))
    }

    pub fn at_least(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.condition(FilterCondition::new(field, FilterOperator::GreaterOrEqual, value))
    }

    pub fn at_most(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.condition(FilterCondition::new(field, FilterOperator::LessOrEqual, value))
    }

    pub fn condition(mut self, condition: FilterCondition) -> Self {
        let bad_number = matches!(condition.value, FilterValue::Number(n) if !n.is_finite());
        if !is_valid_field_name(&condition.field) || bad_number {
            if !self.invalid.contains(&condition.field) {
                self.invalid.push(condition.field);
            }
            return self;
        }
        if condition.operator == FilterOperator::Contains
            && matches!(&condition.value, FilterValue::Text(t) if t.trim().is_empty())
        {
            return self;
        }
        self.conditions.push(condition);
        self
    }

    pub fn extend<I>(self, conditions: I) -> Self
    where
        I: IntoIterator<Item = FilterCondition>,
    {
        conditions.into_iter().fold(self, |b, c| b.condition(c))
    }

    pub fn build(self) -> Result<FilterExpression, RecordError> {
        if !self.invalid.is_empty() {
            return Err(RecordError::invalid(self.invalid));
        }
        Ok(FilterExpression {
            conditions: self.conditions,
        })
    }
}

/// `[A-Za-z_][A-Za-z0-9_.]*`
pub fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Escape backslashes and double quotes for a quoted literal
pub fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            other => escaped.push(other),
        }
    }
    escaped
}

fn quoted(value: &FilterValue) -> String {
    let raw = match value {
        FilterValue::Text(t) => escape_value(t),
        FilterValue::Number(n) => n.to_string(),
        FilterValue::Bool(b) => b.to_string(),
    };
    format!("\"{}\"", raw)
}

fn render_condition(condition: &FilterCondition) -> String {
    let op = condition.operator.symbol();
    let value = match (&condition.value, condition.operator.is_range()) {
        (FilterValue::Number(n), true) => n.to_string(),
        (v, _) => quoted(v),
    };
    format!("{}{}{}", condition.field, op, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_grammar() {
        let expr = FilterBuilder::new()
            .equals("owner_id", "u1")
            .equals("farm_id", "f1")
            .contains("cause", "heat")
            .at_least("count", 3.0)
            .at_most("date", "2024-03-31")
            .build()
            .unwrap();

        assert_eq!(
            expr.render(),
            r#"owner_id="u1" && farm_id="f1" && cause~"heat" && count>=3 && date<="2024-03-31""#
        );
    }

    #[test]
    fn test_quotes_and_backslashes_are_escaped() {
        let expr = FilterBuilder::new()
            .equals("owner_id", r#"u1" || owner_id!="x"#)
            .contains("notes", r"C:\temp")
            .build()
            .unwrap();

        assert_eq!(
            expr.render(),
            r#"owner_id="u1\" || owner_id!=\"x" && notes~"C:\\temp""#
        );
    }

    #[test]
    fn test_invalid_field_names_rejected() {
        let err = FilterBuilder::new()
            .equals("owner_id", "u1")
            .equals("x=1 || y", "z")
            .at_least("", 1.0)
            .build()
            .unwrap_err();

        match err {
            RecordError::Validation { invalid_fields, .. } => {
                assert_eq!(invalid_fields, vec!["x=1 || y".to_string(), String::new()])
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_blank_search_and_empty_expression() {
        let expr = FilterBuilder::new().contains("notes", "   ").build().unwrap();
        assert!(expr.is_empty());
        assert_eq!(expr.render(), "");
    }

    #[test]
    fn test_field_name_pattern() {
        assert!(is_valid_field_name("reported_by.full_name"));
        assert!(is_valid_field_name("_x1"));
        assert!(!is_valid_field_name("1abc"));
        assert!(!is_valid_field_name("a b"));
        assert!(!is_valid_field_name("a\"b"));
    }
}
