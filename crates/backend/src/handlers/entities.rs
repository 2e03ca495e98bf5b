use axum::{extract::Path, Json};
use contracts::domain::common::EntitySchema;

use super::ApiError;
use crate::domain::records::registry;

/// GET /api/entities
pub async fn list_all() -> Json<&'static [&'static EntitySchema]> {
    Json(registry().list_all())
}

/// GET /api/entities/:entity
pub async fn get_by_name(
    Path(entity): Path<String>,
) -> Result<Json<&'static EntitySchema>, ApiError> {
    Ok(Json(registry().resolve(&entity)?))
}
