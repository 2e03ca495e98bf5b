use std::sync::Arc;

use crate::shared::config::Config;
use crate::shared::store::RecordStore;

/// Общее состояние обработчиков: один клиент хранилища на всё приложение
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}
