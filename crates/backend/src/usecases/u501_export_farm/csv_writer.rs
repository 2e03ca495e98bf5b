use chrono::SecondsFormat;
use contracts::shared::export::CompositeReport;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io::Write;

use crate::shared::format::sanitize_file_component;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Сериализация сводного отчёта в CSV
///
/// Формат: BOM, блок `=== FARM INFORMATION ===`, по блоку на каждую непустую
/// секцию, итоговый блок `=== EXPORT SUMMARY ===`. Блоки разделены одной
/// пустой строкой, все значения в кавычках.
pub fn to_csv(report: &CompositeReport) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::from(UTF8_BOM);

    write_header(&mut out, "FARM INFORMATION")?;
    let generated_at = report.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut info: Vec<Vec<String>> = vec![vec!["Field".into(), "Value".into()]];
    info.extend(
        report
            .metadata
            .iter()
            .map(|m| vec![m.label.clone(), m.value.clone()]),
    );
    info.push(vec!["Generated at".into(), generated_at]);
    write_rows(&mut out, &info)?;

    for section in report.non_empty_sections() {
        out.write_all(b"\n")?;
        write_header(&mut out, &section.title.to_uppercase())?;
        write_rows(&mut out, std::slice::from_ref(&section.columns))?;
        write_rows(&mut out, &section.rows)?;
    }

    out.write_all(b"\n")?;
    write_header(&mut out, "EXPORT SUMMARY")?;
    let mut summary: Vec<Vec<String>> = vec![vec![
        "Section".into(),
        "Status".into(),
        "Rows".into(),
        "Truncated".into(),
    ]];
    summary.extend(report.sections.iter().map(|s| {
        vec![
            s.title.clone(),
            s.status.label(),
            s.rows.len().to_string(),
            if s.truncated { "yes" } else { "no" }.to_string(),
        ]
    }));
    write_rows(&mut out, &summary)?;

    Ok(out)
}

/// `Export_<ферма>_<время ISO-8601 с заменой ':' и '.' на '-'>.csv`
pub fn file_name(report: &CompositeReport) -> String {
    let stamp = report
        .generated_at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!(
        "Export_{}_{}.csv",
        sanitize_file_component(&report.farm_name),
        stamp
    )
}

fn write_header(out: &mut Vec<u8>, title: &str) -> anyhow::Result<()> {
    writeln!(out, "=== {} ===", title)?;
    Ok(())
}

fn write_rows(out: &mut Vec<u8>, rows: &[Vec<String>]) -> anyhow::Result<()> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(out);
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
