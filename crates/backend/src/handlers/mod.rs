pub mod analytics;
pub mod entities;
pub mod export;
pub mod records;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::shared::errors::RecordError;

/// Ошибка операции как HTTP-ответ с `OperationResult` в теле
#[derive(Debug)]
pub struct ApiError(pub RecordError);

impl From<RecordError> for ApiError {
    fn from(e: RecordError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RecordError::Validation { .. } => StatusCode::BAD_REQUEST,
            RecordError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            RecordError::NotFound { .. } | RecordError::UnknownEntity(_) => StatusCode::NOT_FOUND,
            RecordError::RemoteStore { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::BAD_GATEWAY {
            tracing::error!("{}", self.0);
        }
        (status, Json(self.0.to_operation_result())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let denied = ApiError(RecordError::PermissionDenied {
            collection: "mortality".into(),
            id: "m1".into(),
        });
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError(RecordError::missing(vec!["date".into()])).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(RecordError::UnknownEntity("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(RecordError::RemoteStore {
                summary: "s".into(),
                message: "m".into()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
