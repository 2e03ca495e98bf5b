//! Remote record store interface
//!
//! The store itself (persistence, auth, transport) is an external service.
//! The core talks to it only through [`RecordStore`]; one handle is built at
//! startup and injected everywhere.

pub mod http_client;
pub mod memory;

use async_trait::async_trait;
use contracts::domain::common::{FarmRecord, RecordPayload};
use serde::Deserialize;

use super::errors::StoreError;
use super::filter::FilterExpression;

pub use http_client::HttpRecordStore;
pub use memory::MemoryRecordStore;

/// Параметры запроса списка
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub filter: FilterExpression,
    /// `-field` сортирует по убыванию
    pub sort: Option<String>,
    pub expand: Vec<String>,
}

/// Страница результата
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub items: Vec<FarmRecord>,
    pub total_items: u64,
}

/// Трейт для клиента хранилища записей
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query(&self, collection: &str, query: &ListQuery) -> Result<RecordPage, StoreError>;

    /// `StoreError::NotFound` если записи нет
    async fn get_one(
        &self,
        collection: &str,
        id: &str,
        expand: &[String],
    ) -> Result<FarmRecord, StoreError>;

    async fn create(&self, collection: &str, payload: &RecordPayload)
        -> Result<FarmRecord, StoreError>;

    async fn update(
        &self,
        collection: &str,
        id: &str,
        payload: &RecordPayload,
    ) -> Result<FarmRecord, StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}
