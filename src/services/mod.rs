//! # Service bundle and collaborators.
//!
//! Plugins reach the host exclusively through [`Services`]:
//!
//! | Accessor      | Collaborator                               |
//! |---------------|--------------------------------------------|
//! | `config()`    | [`ConfigService`] layered key/value config  |
//! | `log()`       | [`Logger`] module-scoped tracing façade     |
//! | `events()`    | [`EventBus`](crate::EventBus)              |
//! | `api()`       | [`ApiService`] in-process route table       |
//! | `storage()`   | [`StorageService`] leased local directories |
//!
//! The runtime builds the bundle once during
//! [`Runtime::initialize`](crate::Runtime::initialize) from a
//! [`ServiceFactory`]; [`DefaultServices`] provides the stock implementations.

mod api;
mod config;
mod factory;
mod log;
mod storage;

pub use api::{ApiService, Handler, Request, Response, RouteTable};
pub use config::{
    CONFIG_FILE_ENV, ConfigService, DEFAULT_CONFIG_FILE, ENV_PREFIX, FWD_PROXY_COMPLETE,
    FWD_PROXY_PASSWD, FWD_PROXY_PORT, FWD_PROXY_PROT, FWD_PROXY_URL, FWD_PROXY_USER,
    LOCAL_STORAGE_PATH, LOCAL_STORAGE_PATH_DEFAULT, LOG_LEVEL, MemoryConfig, apply_forward_proxy,
};
pub use factory::{API_HEALTHY_PATH, API_READY_PATH, DefaultServices, ServiceFactory};
pub use log::{DEFAULT_LOG_LEVEL, Logger, init_tracing};
pub use storage::{LocalStorage, StorageLease, StorageService};

use std::fmt;
use std::sync::Arc;

use crate::bus::EventBus;

/// Handles to every collaborator, shared by the runtime and all plugins.
#[derive(Clone)]
pub struct Services {
    config: Arc<dyn ConfigService>,
    log: Logger,
    events: EventBus,
    api: Arc<dyn ApiService>,
    storage: Arc<dyn StorageService>,
}

impl Services {
    pub(crate) fn new(
        config: Arc<dyn ConfigService>,
        log: Logger,
        events: EventBus,
        api: Arc<dyn ApiService>,
        storage: Arc<dyn StorageService>,
    ) -> Self {
        Self {
            config,
            log,
            events,
            api,
            storage,
        }
    }

    pub fn config(&self) -> &dyn ConfigService {
        self.config.as_ref()
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn api(&self) -> &dyn ApiService {
        self.api.as_ref()
    }

    pub fn storage(&self) -> &dyn StorageService {
        self.storage.as_ref()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("log", &self.log)
            .field("events", &self.events)
            .field("storage_root", &self.storage.root())
            .finish_non_exhaustive()
    }
}
