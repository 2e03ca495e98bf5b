use axum::{
    extract::{Path, Query, State},
    Json,
};
use contracts::shared::analytics::{
    AnalyticsQuery, ComparisonResponse, DistributionResponse, MonthlyResponse, SummaryResponse,
    TopCategoriesResponse,
};

use super::ApiError;
use crate::dashboards::d400_farm_analytics::service::{FarmAnalytics, DEFAULT_TOP_N};
use crate::shared::errors::RecordError;
use crate::system::app_state::AppState;
use crate::system::auth::CurrentOwner;

fn analytics(state: &AppState) -> FarmAnalytics {
    FarmAnalytics::new(state.store.clone(), state.config.limits.analytics_cap)
}

/// GET /api/analytics/:entity/summary
pub async fn summary(
    State(state): State<AppState>,
    owner: CurrentOwner,
    Path(entity): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let result = analytics(&state)
        .summary(
            &entity,
            owner.owner_id(),
            query.farm_id.as_deref(),
            &query.field_list(),
            &query.range(),
        )
        .await?;
    Ok(Json(result))
}

/// GET /api/analytics/:entity/monthly
pub async fn monthly(
    State(state): State<AppState>,
    owner: CurrentOwner,
    Path(entity): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<MonthlyResponse>, ApiError> {
    let result = analytics(&state)
        .monthly(
            &entity,
            owner.owner_id(),
            query.farm_id.as_deref(),
            &query.field_list(),
            &query.range(),
        )
        .await?;
    Ok(Json(result))
}

/// GET /api/analytics/:entity/distribution
pub async fn distribution(
    State(state): State<AppState>,
    owner: CurrentOwner,
    Path(entity): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<DistributionResponse>, ApiError> {
    let result = analytics(&state)
        .distribution(
            &entity,
            owner.owner_id(),
            query.farm_id.as_deref(),
            &query.field_list(),
            &query.range(),
        )
        .await?;
    Ok(Json(result))
}

/// GET /api/analytics/:entity/compare?field=&a_from=&a_to=&b_from=&b_to=
pub async fn compare(
    State(state): State<AppState>,
    owner: CurrentOwner,
    Path(entity): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ComparisonResponse>, ApiError> {
    let field = query
        .field
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| RecordError::missing(vec!["field".to_string()]))?;

    let result = analytics(&state)
        .compare_periods(
            &entity,
            owner.owner_id(),
            query.farm_id.as_deref(),
            field,
            &query.period_a(),
            &query.period_b(),
        )
        .await?;
    Ok(Json(result))
}

/// GET /api/analytics/:entity/top?label=&weight=&n=
pub async fn top(
    State(state): State<AppState>,
    owner: CurrentOwner,
    Path(entity): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<TopCategoriesResponse>, ApiError> {
    let result = analytics(&state)
        .top_categories(
            &entity,
            owner.owner_id(),
            query.farm_id.as_deref(),
            query.label.as_deref(),
            query.weight.as_deref(),
            query.n.unwrap_or(DEFAULT_TOP_N),
        )
        .await?;
    Ok(Json(result))
}
