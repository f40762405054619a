use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::converter::ConverterGateway;
use crate::infrastructure::storage::local::StorageService;
use crate::modules::conversion::repository::JobStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub jobs: JobStore,
    pub storage: StorageService,
    pub converter: Arc<dyn ConverterGateway>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        jobs: JobStore,
        storage: StorageService,
        converter: Arc<dyn ConverterGateway>,
    ) -> Self {
        Self {
            config,
            jobs,
            storage,
            converter,
        }
    }
}
