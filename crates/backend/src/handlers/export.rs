use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use contracts::shared::response::OperationResult;

use super::ApiError;
use crate::system::app_state::AppState;
use crate::system::auth::CurrentOwner;
use crate::usecases::u501_export_farm::{file_name, to_csv, ExportCoordinator};

/// GET /api/export/:farm_id
///
/// Сводный CSV по ферме как вложение
pub async fn export_farm(
    State(state): State<AppState>,
    owner: CurrentOwner,
    Path(farm_id): Path<String>,
) -> Result<Response, ApiError> {
    let report = ExportCoordinator::new(state.store.clone(), state.config.limits.export_cap)
        .export_farm(owner.owner_id(), &farm_id)
        .await?;

    let body = match to_csv(&report) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("CSV serialization of farm {} failed: {:#}", farm_id, e);
            let result = OperationResult::failure("Failed to build the export file");
            return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(result)).into_response());
        }
    };

    let disposition = content_disposition(&file_name(&report));
    let mut response = (
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8"))],
        body,
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// ASCII-имя для старых клиентов и полное имя в `filename*` (RFC 5987)
fn content_disposition(name: &str) -> String {
    let ascii: String = name
        .chars()
        .map(|c| if c.is_ascii_graphic() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_is_header_safe() {
        let value = content_disposition("Export_Ферма_2024-05-01T10-20-30-000Z.csv");
        assert!(value.starts_with("attachment; filename=\"Export_______2024-05-01T10-20-30-000Z.csv\""));
        assert!(value.contains("filename*=UTF-8''Export_%D0%A4"));
        assert!(HeaderValue::from_str(&value).is_ok());
    }
}
