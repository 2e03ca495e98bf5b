use serde_json::Value;

/// Округление до 2 знаков
///
/// # Примеры
/// ```
/// use backend::shared::format::round2;
/// assert_eq!(round2(33.33333), 33.33);
/// assert_eq!(round2(66.666), 66.67);
/// ```
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Значение поля как текст ячейки отчёта
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            Some(f) => f.to_string(),
            None => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Безопасный фрагмент имени файла
pub fn sanitize_file_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "farm".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&json!(15.0)), "15");
        assert_eq!(format_cell(&json!(2.5)), "2.5");
        assert_eq!(format_cell(&json!(null)), "");
        assert_eq!(format_cell(&json!(true)), "true");
        assert_eq!(format_cell(&json!("Heat \"stress\"")), "Heat \"stress\"");
    }

    #[test]
    fn test_sanitize_file_component() {
        assert_eq!(sanitize_file_component("Green Acres/North"), "Green_Acres_North");
        assert_eq!(sanitize_file_component("   "), "farm");
        assert_eq!(sanitize_file_component("Ферма №1"), "Ферма_№1");
    }
}
