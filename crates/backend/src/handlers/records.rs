use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use contracts::domain::common::{FarmRecord, RecordPayload};
use contracts::shared::filter::FilterCondition;
use contracts::shared::response::OperationResult;
use serde::Deserialize;

use super::ApiError;
use crate::domain::records::{ListResult, RecordAccessService};
use crate::shared::errors::RecordError;
use crate::system::app_state::AppState;
use crate::system::auth::CurrentOwner;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub farm_id: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// JSON-массив условий `[{"field":..,"operator":..,"value":..}]`
    pub filters: Option<String>,
}

fn service(state: &AppState, entity: &str) -> Result<RecordAccessService, ApiError> {
    Ok(RecordAccessService::for_entity(state.store.clone(), entity)?)
}

fn parse_filters(raw: Option<&str>) -> Result<Vec<FilterCondition>, RecordError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json)
            .map_err(|_| RecordError::invalid(vec!["filters".to_string()])),
    }
}

/// GET /api/records/:entity
pub async fn list(
    State(state): State<AppState>,
    owner: CurrentOwner,
    Path(entity): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult>, ApiError> {
    let filters = parse_filters(params.filters.as_deref())?;
    let result = service(&state, &entity)?
        .list(
            owner.owner_id(),
            params.farm_id.as_deref(),
            params.page.unwrap_or(1),
            params
                .page_size
                .unwrap_or(state.config.limits.default_page_size),
            &filters,
        )
        .await?;
    Ok(Json(result))
}

/// GET /api/records/:entity/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    owner: CurrentOwner,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<FarmRecord>, ApiError> {
    let record = service(&state, &entity)?.get(&id, owner.owner_id()).await?;
    Ok(Json(record))
}

/// POST /api/records/:entity
pub async fn create(
    State(state): State<AppState>,
    owner: CurrentOwner,
    Path(entity): Path<String>,
    Json(payload): Json<RecordPayload>,
) -> Result<(StatusCode, Json<FarmRecord>), ApiError> {
    let record = service(&state, &entity)?
        .create(owner.owner_id(), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /api/records/:entity/:id
pub async fn update(
    State(state): State<AppState>,
    owner: CurrentOwner,
    Path((entity, id)): Path<(String, String)>,
    Json(payload): Json<RecordPayload>,
) -> Result<Json<FarmRecord>, ApiError> {
    let record = service(&state, &entity)?
        .update(&id, payload, owner.owner_id())
        .await?;
    Ok(Json(record))
}

/// DELETE /api/records/:entity/:id
pub async fn delete(
    State(state): State<AppState>,
    owner: CurrentOwner,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<OperationResult>, ApiError> {
    service(&state, &entity)?
        .delete(&id, owner.owner_id())
        .await?;
    Ok(Json(OperationResult::ok("Record deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::filter::{FilterOperator, FilterValue};

    #[test]
    fn test_parse_filters() {
        let parsed = parse_filters(Some(
            r#"[{"field":"cause","operator":"contains","value":"heat"},{"field":"count","operator":"greater_or_equal","value":2}]"#,
        ))
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].operator, FilterOperator::Contains);
        assert_eq!(parsed[1].value, FilterValue::Number(2.0));

        assert!(parse_filters(None).unwrap().is_empty());
        assert!(matches!(
            parse_filters(Some("not json")),
            Err(RecordError::Validation { .. })
        ));
    }
}
