//! # plughost
//!
//! **plughost** is the runtime core of a plugin-host process: an in-process
//! event bus plus a lifecycle orchestrator that starts, connects and stops
//! mutually independent plugins.
//!
//! Plugins never know about each other. They receive a [`Services`] bundle at
//! init time and talk through the [`EventBus`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   plugin A   │   │   plugin B   │   │   plugin C   │
//!     │ (PluginInit) │   │ (PluginInit) │   │ (PluginInit) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runtime (lifecycle orchestrator)                                 │
//! │  - register_plugin / initialize / initialize_plugins              │
//! │  - shutdown handshake bounded by RuntimeConfig::shutdown_timeout  │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Services: config · log · events · api · storage                  │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBus                                                         │
//! │  emit ──► [admission FIFO] ──► dispatcher ──► snapshot(selector)  │
//! │                                         ┌─────────┼─────────┐     │
//! │                                         ▼         ▼         ▼     │
//! │                                    [queue L1] [queue L2] once-task│
//! │                                         ▼         ▼         ▼     │
//! │                                      worker    worker    handler  │
//! │                                         └──── join acks ───┘      │
//! │                               DeliveryEvent ──► DELIVERED selector │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Uninitialized ─► Initialized ─► PluginsRegistering ─► PluginsInitialized ─► ShuttingDown ─► Terminated
//! ```
//!
//! ## Features
//! | Area           | Description                                                     | Key types / traits                          |
//! |----------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Event bus**  | Selector-keyed pub/sub with per-round completion notifications. | [`EventBus`], [`Delivery`], [`Subscription`] |
//! | **Listeners**  | React to events; failures and panics are contained.             | [`Listener`], [`ListenerFn`], [`LogWriter`] |
//! | **Plugins**    | Init functions and their descriptors.                           | [`PluginInit`], [`PluginFn`], [`PluginData`] |
//! | **Runtime**    | Startup, plugin initialization, bounded shutdown.               | [`Runtime`], [`RuntimeConfig`]              |
//! | **Services**   | Collaborators handed to plugins.                                | [`Services`], [`ServiceFactory`]            |
//! | **Errors**     | Typed errors with stable labels.                                | [`RuntimeError`], [`BusError`]              |
//!
//! ## Example
//! ```rust
//! use plughost::{
//!     ConfigService, DefaultServices, Event, MemoryConfig, PluginData, PluginFn, Runtime,
//!     RuntimeConfig, Selector, Services,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dir = std::env::temp_dir().join("plughost-doc");
//!     let config = MemoryConfig::new();
//!     config.set("local_storage_path", dir.to_string_lossy().into_owned().into());
//!
//!     let mut rt = Runtime::new(RuntimeConfig::default());
//!     rt.register_plugin(
//!         PluginFn::arc("greeter", |s: &Services| {
//!             s.events().listen_fn(Selector::SHUTDOWN, |_ev: Event| async { Ok(()) });
//!             Ok(PluginData::new("greeter", "0.1.0"))
//!         }),
//!         PluginData::new("greeter", "0.1.0"),
//!     )?;
//!
//!     rt.initialize(&DefaultServices::with_config(config)).await?;
//!     let delivered = rt.initialize_plugins("1.0.0")?.await?;
//!     assert_eq!(delivered.selector, Selector::SYSTEM);
//!
//!     rt.shutdown_plugins_and_wait().await?;
//!     Ok(())
//! }
//! ```
mod bus;
mod core;
mod error;
mod events;
mod listeners;
mod plugins;
mod services;

// ---- Public re-exports ----

pub use bus::{BusState, Delivery, EventBus, Subscription};
pub use core::{Runtime, RuntimeConfig, RuntimeState, wait_for_shutdown_signal};
pub use error::{ApiError, BusError, ConfigError, ListenerError, PluginError, RuntimeError, StorageError};
pub use events::{
    DeliveryEvent, Event, PluginsInitializedEvent, Selector, ShutdownEvent, SystemEvent,
};
pub use listeners::{Listener, ListenerFn, ListenerRef, LogWriter};
pub use plugins::{PluginData, PluginFn, PluginInit, PluginRef};
pub use services::{
    API_HEALTHY_PATH, API_READY_PATH, ApiService, CONFIG_FILE_ENV, ConfigService,
    DEFAULT_CONFIG_FILE, DEFAULT_LOG_LEVEL, DefaultServices, ENV_PREFIX, FWD_PROXY_COMPLETE,
    FWD_PROXY_PASSWD, FWD_PROXY_PORT, FWD_PROXY_PROT, FWD_PROXY_URL, FWD_PROXY_USER, Handler,
    LOCAL_STORAGE_PATH, LOCAL_STORAGE_PATH_DEFAULT, LOG_LEVEL, LocalStorage, Logger, MemoryConfig,
    Request, Response, RouteTable, ServiceFactory, Services, StorageLease, StorageService,
    apply_forward_proxy, init_tracing,
};
