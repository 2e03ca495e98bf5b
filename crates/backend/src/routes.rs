use axum::{
    middleware,
    routing::get,
    Router,
};

use crate::handlers;
use crate::system::{app_state::AppState, auth::middleware::require_auth};

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    let api = Router::new()
        // ========================================
        // ENTITY CATALOG
        // ========================================
        .route("/api/entities", get(handlers::entities::list_all))
        .route("/api/entities/:entity", get(handlers::entities::get_by_name))
        // ========================================
        // RECORDS
        // ========================================
        .route(
            "/api/records/:entity",
            get(handlers::records::list).post(handlers::records::create),
        )
        .route(
            "/api/records/:entity/:id",
            get(handlers::records::get_by_id)
                .patch(handlers::records::update)
                .delete(handlers::records::delete),
        )
        // ========================================
        // ANALYTICS
        // ========================================
        .route("/api/analytics/:entity/summary", get(handlers::analytics::summary))
        .route("/api/analytics/:entity/monthly", get(handlers::analytics::monthly))
        .route(
            "/api/analytics/:entity/distribution",
            get(handlers::analytics::distribution),
        )
        .route("/api/analytics/:entity/compare", get(handlers::analytics::compare))
        .route("/api/analytics/:entity/top", get(handlers::analytics::top))
        // ========================================
        // EXPORT
        // ========================================
        .route("/api/export/:farm_id", get(handlers::export::export_farm))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(api)
        .with_state(state)
}
