use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Middleware для логирования HTTP запросов
///
/// Пишет через tracing: id запроса, метод, путь, статус и длительность.
/// Id запроса возвращается в заголовке `x-request-id`.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = uuid::Uuid::new_v4().to_string();

    let mut response = next.run(req).await;

    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();
    if status.is_server_error() {
        tracing::error!(%request_id, "{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed_ms);
    } else if status.is_client_error() {
        tracing::warn!(%request_id, "{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed_ms);
    } else {
        tracing::info!(%request_id, "{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed_ms);
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}
