use async_trait::async_trait;
use contracts::domain::common::{FarmRecord, RecordPayload};
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{ListQuery, RecordPage, RecordStore};
use crate::shared::config::StoreConfig;
use crate::shared::errors::StoreError;

/// HTTP-клиент REST API хранилища записей
///
/// `GET {base}/api/collections/{collection}/records?page=&perPage=&filter=&sort=&expand=`,
/// `GET|PATCH|DELETE .../records/{id}`, `POST .../records`.
pub struct HttpRecordStore {
    client: Client,
    base_url: String,
}

impl HttpRecordStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = config.api_token.as_deref().filter(|t| !t.trim().is_empty()) {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| StoreError::Transport(format!("invalid API token: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn records_url(&self, collection: &str) -> String {
        format!(
            "{}/api/collections/{}/records",
            self.base_url,
            urlencoding::encode(collection)
        )
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.records_url(collection), urlencoding::encode(id))
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        what: &str,
    ) -> Result<T, StoreError> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }
        Err(error_from_status(status, response.text().await.unwrap_or_default(), what))
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn query(&self, collection: &str, query: &ListQuery) -> Result<RecordPage, StoreError> {
        let url = self.records_url(collection);
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.max(1).to_string()),
            ("perPage", query.per_page.max(1).to_string()),
        ];
        if !query.filter.is_empty() {
            params.push(("filter", query.filter.render()));
        }
        if let Some(sort) = &query.sort {
            params.push(("sort", sort.clone()));
        }
        if !query.expand.is_empty() {
            params.push(("expand", query.expand.join(",")));
        }

        tracing::debug!("Record store: GET {} {:?}", url, params);
        let response = self.client.get(&url).query(&params).send().await?;
        self.handle_response(response, collection).await
    }

    async fn get_one(
        &self,
        collection: &str,
        id: &str,
        expand: &[String],
    ) -> Result<FarmRecord, StoreError> {
        let url = self.record_url(collection, id);
        let mut request = self.client.get(&url);
        if !expand.is_empty() {
            request = request.query(&[("expand", expand.join(","))]);
        }
        let response = request.send().await?;
        self.handle_response(response, &format!("{}/{}", collection, id))
            .await
    }

    async fn create(
        &self,
        collection: &str,
        payload: &RecordPayload,
    ) -> Result<FarmRecord, StoreError> {
        let url = self.records_url(collection);
        let response = self.client.post(&url).json(payload).send().await?;
        self.handle_response(response, collection).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        payload: &RecordPayload,
    ) -> Result<FarmRecord, StoreError> {
        let url = self.record_url(collection, id);
        let response = self.client.patch(&url).json(payload).send().await?;
        self.handle_response(response, &format!("{}/{}", collection, id))
            .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.record_url(collection, id);
        let response = self.client.delete(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(error_from_status(
            status,
            response.text().await.unwrap_or_default(),
            &format!("{}/{}", collection, id),
        ))
    }
}

/// Разбор ответа с ошибкой: `{"message": "...", "data": {"field": {...}}}`
fn error_from_status(status: StatusCode, body: String, what: &str) -> StoreError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(&body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.clone());

    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(what.to_string()),
        StatusCode::BAD_REQUEST => {
            let mut fields: Vec<String> = parsed
                .as_ref()
                .and_then(|v| v.get("data"))
                .and_then(|d| d.as_object())
                .map(|d| d.keys().cloned().collect())
                .unwrap_or_default();
            fields.sort();
            StoreError::Validation { message, fields }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::Forbidden(format!("HTTP {} for {}: {}", status.as_u16(), what, message))
        }
        _ => StoreError::Transport(format!("HTTP {} for {}: {}", status.as_u16(), what, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpRecordStore {
        HttpRecordStore::new(&StoreConfig {
            base_url: "http://localhost:8090/".into(),
            api_token: Some("service-token".into()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_urls_encode_segments() {
        let s = store();
        assert_eq!(
            s.records_url("fuel_entries"),
            "http://localhost:8090/api/collections/fuel_entries/records"
        );
        assert_eq!(
            s.record_url("fuel_entries", "a/b"),
            "http://localhost:8090/api/collections/fuel_entries/records/a%2Fb"
        );
    }

    #[test]
    fn test_bad_request_lists_rejected_fields() {
        let body = r#"{"code":400,"message":"Failed to create record.","data":{"quantity_liters":{"code":"validation_required"},"date":{"code":"validation_invalid_date"}}}"#;
        match error_from_status(StatusCode::BAD_REQUEST, body.into(), "fuel_entries") {
            StoreError::Validation { message, fields } => {
                assert_eq!(message, "Failed to create record.");
                assert_eq!(fields, vec!["date", "quantity_liters"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_from_status(StatusCode::NOT_FOUND, String::new(), "mortality/r1"),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            error_from_status(StatusCode::FORBIDDEN, "{}".into(), "mortality"),
            StoreError::Forbidden(_)
        ));
        match error_from_status(StatusCode::BAD_GATEWAY, "upstream down".into(), "mortality") {
            StoreError::Transport(msg) => assert!(msg.contains("upstream down")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
