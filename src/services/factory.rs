//! # Service factory.
//!
//! [`Runtime::initialize`](crate::Runtime::initialize) asks the factory for
//! each collaborator in a fixed order:
//!
//! ```text
//! config ─► log ─► (storage root created, forward proxy derived) ─► events ─► api ─► storage
//! ```
//!
//! Tests and embedding hosts swap single collaborators by implementing
//! [`ServiceFactory`] and delegating the rest to [`DefaultServices`].

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::bus::EventBus;
use crate::services::{
    ApiService, ConfigService, LocalStorage, Logger, MemoryConfig, Request, Response, RouteTable,
    StorageService,
};

/// Config key of the readiness probe path.
pub const API_READY_PATH: &str = "api_ready";
/// Config key of the liveness probe path.
pub const API_HEALTHY_PATH: &str = "api_healthy";

/// Builds the collaborators of a [`Services`](crate::Services) bundle.
pub trait ServiceFactory {
    fn config(&self) -> Arc<dyn ConfigService>;

    fn log(&self, config: &dyn ConfigService) -> Logger;

    /// Called inside the Tokio runtime.
    fn events(&self) -> EventBus {
        EventBus::new()
    }

    fn api(&self, config: &dyn ConfigService, log: &Logger) -> Arc<dyn ApiService>;

    /// `root` already exists when this is called.
    fn storage(&self, root: &Path, log: &Logger) -> Arc<dyn StorageService>;
}

/// Stock collaborators: [`MemoryConfig`], root [`Logger`], [`RouteTable`]
/// with probe routes, [`LocalStorage`].
#[derive(Clone)]
pub struct DefaultServices {
    config: Arc<MemoryConfig>,
}

impl DefaultServices {
    /// Config loaded from the process environment and config file.
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::load())
    }

    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for DefaultServices {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceFactory for DefaultServices {
    fn config(&self) -> Arc<dyn ConfigService> {
        self.config.clone()
    }

    fn log(&self, _config: &dyn ConfigService) -> Logger {
        Logger::new()
    }

    fn api(&self, config: &dyn ConfigService, log: &Logger) -> Arc<dyn ApiService> {
        config.set_default(API_READY_PATH, Value::from("/ready"));
        config.set_default(API_HEALTHY_PATH, Value::from("/healthy"));

        let api = RouteTable::new();
        let log = log.for_module("api");
        for key in [API_READY_PATH, API_HEALTHY_PATH] {
            let path = config.get_string(key);
            if path.is_empty() {
                continue;
            }
            let probe = Arc::new(|_req: &Request| Response::status(200));
            if let Err(err) = api.handle(&path, &["GET"], probe) {
                log.warn(&format!("probe route {key} skipped: {err}"));
            }
        }
        Arc::new(api)
    }

    fn storage(&self, root: &Path, _log: &Logger) -> Arc<dyn StorageService> {
        Arc::new(LocalStorage::new(root))
    }
}
