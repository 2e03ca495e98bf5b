use chrono::Utc;
use contracts::domain::catalog::{EXPORT_SECTIONS, FARM};
use contracts::domain::common::{EntitySchema, FarmRecord};
use contracts::shared::export::{CompositeReport, MetadataEntry, ReportSection, SectionStatus};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::records::RecordAccessService;
use crate::shared::errors::RecordError;
use crate::shared::format::format_cell;
use crate::shared::store::RecordStore;

/// Лимит записей на секцию по умолчанию
pub const DEFAULT_EXPORT_CAP: u32 = 1000;

const UNKNOWN_FARM_NAME: &str = "Unknown farm";

/// Сводный экспорт всех записей фермы
///
/// Секции читаются последовательно, в порядке каталога. Ошибка одной секции
/// попадает в её статус и не прерывает экспорт.
pub struct ExportCoordinator {
    store: Arc<dyn RecordStore>,
    cap: u32,
    sections: Vec<&'static EntitySchema>,
}

impl ExportCoordinator {
    pub fn new(store: Arc<dyn RecordStore>, cap: u32) -> Self {
        Self {
            store,
            cap,
            sections: EXPORT_SECTIONS.to_vec(),
        }
    }

    pub fn with_sections(mut self, sections: Vec<&'static EntitySchema>) -> Self {
        self.sections = sections;
        self
    }

    pub async fn export_farm(
        &self,
        owner_id: &str,
        farm_id: &str,
    ) -> Result<CompositeReport, RecordError> {
        tracing::info!("Export of farm {} started ({} sections)", farm_id, self.sections.len());

        let (farm_name, metadata) = self.farm_metadata(owner_id, farm_id).await?;

        let mut sections = Vec::with_capacity(self.sections.len());
        for schema in &self.sections {
            sections.push(self.export_section(schema, owner_id, farm_id).await);
        }

        let report = CompositeReport {
            farm_id: farm_id.to_string(),
            farm_name,
            generated_at: Utc::now(),
            metadata,
            sections,
        };

        tracing::info!(
            "Export of farm {} finished: {} sections with data, {} failed",
            farm_id,
            report.non_empty_sections().count(),
            report.failed_sections().count()
        );
        Ok(report)
    }

    /// Профиль фермы. Чужая ферма прерывает экспорт; любая другая ошибка
    /// даёт минимальный блок метаданных.
    async fn farm_metadata(
        &self,
        owner_id: &str,
        farm_id: &str,
    ) -> Result<(String, Vec<MetadataEntry>), RecordError> {
        let farms = RecordAccessService::new(self.store.clone(), &FARM);
        match farms.get(farm_id, owner_id).await {
            Ok(farm) => {
                let name = farm
                    .text("name")
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or(UNKNOWN_FARM_NAME)
                    .to_string();
                Ok((name, farm_entries(&farm)))
            }
            Err(err @ RecordError::PermissionDenied { .. }) => Err(err),
            Err(err) => {
                tracing::warn!("Farm profile {} unavailable for export: {}", farm_id, err);
                let metadata = vec![
                    entry("Farm ID", farm_id),
                    entry("Farm name", UNKNOWN_FARM_NAME),
                ];
                Ok((UNKNOWN_FARM_NAME.to_string(), metadata))
            }
        }
    }

    async fn export_section(
        &self,
        schema: &'static EntitySchema,
        owner_id: &str,
        farm_id: &str,
    ) -> ReportSection {
        let service = RecordAccessService::new(self.store.clone(), schema);
        let mut section = ReportSection {
            entity: schema.name.to_string(),
            title: schema.title.to_string(),
            status: SectionStatus::Empty,
            truncated: false,
            columns: Vec::new(),
            rows: Vec::new(),
        };

        match service
            .get_full_list(owner_id, Some(farm_id), &[], self.cap)
            .await
        {
            Ok(list) if list.items.is_empty() => {}
            Ok(list) => {
                let columns = section_columns(schema, &list.items);
                section.rows = list
                    .items
                    .iter()
                    .map(|record| {
                        columns
                            .iter()
                            .map(|c| record.value(c).map(|v| format_cell(&v)).unwrap_or_default())
                            .collect()
                    })
                    .collect();
                section.columns = columns;
                section.truncated = list.truncated;
                section.status = SectionStatus::Ok;
            }
            Err(err) => {
                tracing::error!("Export section {} failed: {}", schema.name, err);
                section.status = SectionStatus::Error {
                    reason: err.to_string(),
                };
            }
        }

        section
    }
}

fn entry(label: &str, value: &str) -> MetadataEntry {
    MetadataEntry {
        label: label.to_string(),
        value: value.to_string(),
    }
}

fn farm_entries(farm: &FarmRecord) -> Vec<MetadataEntry> {
    let mut metadata = vec![entry("Farm ID", &farm.id)];
    for field in FARM.fields {
        if let Some(value) = farm.fields.get(field.name) {
            let text = format_cell(value);
            if !text.is_empty() {
                metadata.push(entry(field.label, &text));
            }
        }
    }
    metadata
}

/// Объединение присутствующих колонок: `id`, поле даты, поля схемы,
/// прочие по алфавиту (включая `farm_id`, `owner_id`), затем `created`, `updated`.
pub fn section_columns(schema: &EntitySchema, records: &[FarmRecord]) -> Vec<String> {
    let present: BTreeSet<&str> = records.iter().flat_map(|r| r.present_keys()).collect();

    let mut order: Vec<&str> = vec!["id"];
    order.extend(schema.date_field);
    order.extend(schema.fields.iter().map(|f| f.name));
    order.extend(
        present
            .iter()
            .copied()
            .filter(|k| !matches!(*k, "id" | "created" | "updated") && schema.field(k).is_none()),
    );
    order.extend(["created", "updated"]);

    let mut columns: Vec<String> = Vec::with_capacity(present.len());
    for key in order {
        if present.contains(key) && !columns.iter().any(|c| c == key) {
            columns.push(key.to_string());
        }
    }
    columns
}
