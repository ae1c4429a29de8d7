//! # Runtime: plugin lifecycle orchestrator.
//!
//! The [`Runtime`] owns the [`Services`] bundle and drives every registered
//! plugin through startup and the shutdown handshake. It is an explicit
//! context object: several runtimes can coexist in one process.
//!
//! ## Lifecycle
//! ```text
//! register_plugin(p, data) ×N      (before or after initialize)
//!        │
//! initialize(&factory)
//!   config ─► log ─► mkdir local_storage_path (0700) ─► forward proxy ─► events ─► api ─► storage
//!   └─► emit(SYSTEM, SystemEvent::Initialized) and wait for its round
//!        │
//! initialize_plugins(version)
//!   p0.init(&services) ─► p1.init(&services) ─► ...   (registration order, first Err is fatal)
//!   └─► emit(SYSTEM, PluginsInitializedEvent { plugins, runtime_version }) ─► Delivery
//!        │
//! shutdown_plugins_and_wait()
//!   └─► emit(SHUTDOWN, ShutdownEvent) ─► wait ≤ shutdown_timeout
//!          ├─ echoed the same event → Ok
//!          ├─ echoed another event  → WrongEventDelivered
//!          └─ timeout               → ShutdownTimeout
//! ```
//!
//! ## Fatal errors
//! `initialize` and `initialize_plugins` report unrecoverable startup
//! failures as [`RuntimeError`]s with [`is_fatal`](RuntimeError::is_fatal)
//! set. The host is expected to log them and exit.
//!
//! ## Example
//! ```rust,no_run
//! use plughost::{
//!     DefaultServices, PluginData, PluginFn, Runtime, RuntimeConfig, Selector, Services,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), plughost::RuntimeError> {
//!     let mut rt = Runtime::new(RuntimeConfig::default());
//!     rt.register_plugin(
//!         PluginFn::arc("hello", |s: &Services| {
//!             s.events().listen_fn(Selector::SHUTDOWN, |_ev: plughost::Event| async { Ok(()) });
//!             Ok(PluginData::new("hello", "0.1.0"))
//!         }),
//!         PluginData::new("hello", "0.1.0"),
//!     )?;
//!
//!     rt.initialize(&DefaultServices::new()).await?;
//!     rt.initialize_plugins("1.0.0")?.await?;
//!     rt.run_until_signal().await
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};

use crate::bus::{Delivery, EventBus};
use crate::core::{RuntimeConfig, RuntimeState, shutdown};
use crate::error::RuntimeError;
use crate::events::{Event, PluginsInitializedEvent, Selector, ShutdownEvent, SystemEvent};
use crate::listeners::LogWriter;
use crate::plugins::{PluginData, PluginRef};
use crate::services::{LOCAL_STORAGE_PATH, ServiceFactory, Services, apply_forward_proxy};

const SHUTDOWN_DESCRIPTION: &str = "plughost is going to shutdown";

/// Drives plugins through initialization and shutdown.
pub struct Runtime {
    cfg: RuntimeConfig,
    state: Mutex<RuntimeState>,
    pending: Vec<PluginRef>,
    versions: Vec<PluginData>,
    services: Option<Services>,
}

impl Runtime {
    pub fn new(cfg: RuntimeConfig) -> Self {
        Self {
            cfg,
            state: Mutex::new(RuntimeState::Uninitialized),
            pending: Vec::new(),
            versions: Vec::new(),
            services: None,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.cfg
    }

    pub fn state(&self) -> RuntimeState {
        *self.lock_state()
    }

    /// Service bundle, available once `initialize` succeeded.
    pub fn services(&self) -> Option<&Services> {
        self.services.as_ref()
    }

    /// Declared data of every registered plugin, in registration order.
    pub fn plugin_versions(&self) -> &[PluginData] {
        &self.versions
    }

    fn lock_state(&self) -> MutexGuard<'_, RuntimeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn services_or_err(&self) -> Result<&Services, RuntimeError> {
        self.services.as_ref().ok_or(RuntimeError::NotInitialized)
    }

    /// Appends a plugin to the pending list.
    ///
    /// Plugins are not deduplicated: registering one twice runs it twice.
    pub fn register_plugin(&mut self, plugin: PluginRef, data: PluginData) -> Result<(), RuntimeError> {
        let mut state = self.lock_state();
        match *state {
            RuntimeState::Uninitialized | RuntimeState::PluginsRegistering => {}
            RuntimeState::Initialized => *state = RuntimeState::PluginsRegistering,
            RuntimeState::PluginsInitialized => return Err(RuntimeError::PluginsAlreadyInitialized),
            RuntimeState::ShuttingDown | RuntimeState::Terminated => {
                return Err(RuntimeError::AlreadyShutDown);
            }
        }
        drop(state);

        debug!(plugin = plugin.name(), name = %data.name, version = %data.version, "plugin registered");
        self.pending.push(plugin);
        self.versions.push(data);
        Ok(())
    }

    /// Builds the service bundle and publishes the startup event.
    ///
    /// Returns once the startup round has completed, so listeners added
    /// afterwards (e.g. by plugin init functions) never observe it.
    pub async fn initialize<F>(&mut self, factory: &F) -> Result<(), RuntimeError>
    where
        F: ServiceFactory + ?Sized,
    {
        if *self.lock_state() != RuntimeState::Uninitialized {
            return Err(RuntimeError::AlreadyInitialized);
        }

        let config = factory.config();
        let log = factory.log(config.as_ref());

        let root = config.get_string(LOCAL_STORAGE_PATH);
        if let Err(err) = create_storage_root(Path::new(&root)) {
            error!(label = err.as_label(), error = %err, "fatal: storage root");
            return Err(err);
        }
        apply_forward_proxy(config.as_ref());

        let events = factory.events();
        let api = factory.api(config.as_ref(), &log);
        let storage = factory.storage(Path::new(&root), &log);

        if self.cfg.trace_deliveries {
            events.listen(Selector::DELIVERED, Arc::new(LogWriter::new()));
        }

        let services = Services::new(config, log, events, api, storage);
        let bus = services.events().clone();
        self.services = Some(services);
        {
            let mut state = self.lock_state();
            *state = if self.pending.is_empty() {
                RuntimeState::Initialized
            } else {
                RuntimeState::PluginsRegistering
            };
        }

        bus.emit(Selector::SYSTEM, SystemEvent::Initialized).await?;
        debug!(storage_root = %root, "runtime initialized");
        Ok(())
    }

    /// Runs every pending init function in registration order and publishes
    /// the aggregate [`PluginsInitializedEvent`].
    ///
    /// One-shot: the pending list is consumed even if an init function fails.
    /// The returned [`Delivery`] resolves when the aggregate event's round
    /// completes; dropping it does not cancel the round.
    pub fn initialize_plugins(&mut self, version: &str) -> Result<Delivery, RuntimeError> {
        {
            let mut state = self.lock_state();
            match *state {
                RuntimeState::Initialized | RuntimeState::PluginsRegistering => {}
                RuntimeState::Uninitialized => return Err(RuntimeError::NotInitialized),
                RuntimeState::PluginsInitialized => {
                    return Err(RuntimeError::PluginsAlreadyInitialized);
                }
                RuntimeState::ShuttingDown | RuntimeState::Terminated => {
                    return Err(RuntimeError::AlreadyShutDown);
                }
            }
            *state = RuntimeState::PluginsInitialized;
        }

        let plugins = std::mem::take(&mut self.pending);
        let services = self.services_or_err()?;
        debug!(count = plugins.len(), "initializing plugins");

        let mut collected = Vec::with_capacity(plugins.len());
        for plugin in plugins {
            match plugin.init(services) {
                Ok(data) => {
                    debug!(plugin = plugin.name(), version = %data.version, "plugin initialized");
                    collected.push(data);
                }
                Err(source) => {
                    let err = RuntimeError::PluginInit {
                        plugin: plugin.name().to_string(),
                        source,
                    };
                    error!(label = err.as_label(), error = %err, "fatal: plugin init");
                    return Err(err);
                }
            }
        }

        let event = PluginsInitializedEvent {
            description: "plugins initialized".to_string(),
            plugins: collected,
            runtime_version: version.to_string(),
        };
        debug!("done initializing plugins");
        Ok(services.events().emit(Selector::SYSTEM, event))
    }

    /// Publishes the shutdown event and waits, up to
    /// [`RuntimeConfig::shutdown_timeout`], for every shutdown listener.
    ///
    /// Callable once; the runtime ends in `Terminated` whatever the outcome.
    pub async fn shutdown_plugins_and_wait(&self) -> Result<(), RuntimeError> {
        let bus = self.services_or_err()?.events().clone();
        {
            let mut state = self.lock_state();
            if matches!(*state, RuntimeState::ShuttingDown | RuntimeState::Terminated) {
                return Err(RuntimeError::AlreadyShutDown);
            }
            *state = RuntimeState::ShuttingDown;
        }

        let res = self.shutdown_handshake(&bus).await;
        *self.lock_state() = RuntimeState::Terminated;

        match &res {
            Ok(()) => debug!("plugins shut down"),
            Err(err) => warn!(label = err.as_label(), error = %err, "plugin shutdown incomplete"),
        }
        res
    }

    async fn shutdown_handshake(&self, bus: &EventBus) -> Result<(), RuntimeError> {
        let timeout = self.cfg.shutdown_timeout;
        let sent = Event::new(ShutdownEvent::new(SHUTDOWN_DESCRIPTION));
        let delivery = bus.emit_event(Selector::SHUTDOWN, sent.clone());

        match tokio::time::timeout(timeout, delivery).await {
            Ok(Ok(delivered)) => {
                if delivered.selector == Selector::SHUTDOWN && delivered.event.ptr_eq(&sent) {
                    Ok(())
                } else {
                    Err(RuntimeError::WrongEventDelivered {
                        selector: delivered.selector,
                    })
                }
            }
            Ok(Err(bus_err)) => Err(bus_err.into()),
            Err(_) => Err(RuntimeError::ShutdownTimeout { timeout }),
        }
    }

    /// Waits for SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere), then runs
    /// [`shutdown_plugins_and_wait`](Self::shutdown_plugins_and_wait).
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.services_or_err()?;
        shutdown::wait_for_shutdown_signal()
            .await
            .map_err(|source| RuntimeError::Signal { source })?;
        self.shutdown_plugins_and_wait().await
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("cfg", &self.cfg)
            .field("state", &self.state())
            .field("pending", &self.pending.len())
            .field("versions", &self.versions)
            .finish_non_exhaustive()
    }
}

fn create_storage_root(path: &Path) -> Result<(), RuntimeError> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(path)
        .map_err(|source| RuntimeError::StorageRoot {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::Value;

    use crate::error::PluginError;
    use crate::plugins::PluginFn;
    use crate::services::{
        ConfigService, DefaultServices, FWD_PROXY_COMPLETE, FWD_PROXY_PORT, FWD_PROXY_URL,
        MemoryConfig,
    };

    fn factory(root: &Path) -> DefaultServices {
        let config = MemoryConfig::new();
        config.set(LOCAL_STORAGE_PATH, Value::from(root.to_string_lossy().into_owned()));
        DefaultServices::with_config(config)
    }

    fn plugin(name: &'static str) -> (PluginRef, PluginData) {
        let data = PluginData::new(name, "1.0.0");
        let returned = data.clone().with_extra("initialized", true);
        let p: PluginRef = PluginFn::arc(name, move |_s: &Services| Ok(returned.clone()));
        (p, data)
    }

    async fn started(cfg: RuntimeConfig, root: &Path) -> Runtime {
        let mut rt = Runtime::new(cfg);
        rt.initialize(&factory(root)).await.unwrap();
        rt
    }

    #[tokio::test]
    async fn plugins_initialize_in_registration_order() {
        let tmp = tempfile::tempdir().unwrap();
        let mut rt = started(RuntimeConfig::default(), tmp.path()).await;

        let names: Vec<String> = (0..10).map(|i| format!("p{i}")).collect();
        for name in &names {
            let returned = PluginData::new(name.clone(), "2.0.0").with_extra("index", name.clone());
            let p: PluginRef = PluginFn::arc(name.clone(), move |_s: &Services| Ok(returned.clone()));
            rt.register_plugin(p, PluginData::new(name.clone(), "2.0.0")).unwrap();
        }
        assert_eq!(rt.state(), RuntimeState::PluginsRegistering);
        assert_eq!(rt.plugin_versions().len(), 10);

        let delivered = rt.initialize_plugins("9.9.9").unwrap().await.unwrap();
        let event = delivered
            .event
            .downcast_ref::<PluginsInitializedEvent>()
            .expect("aggregate event");

        assert_eq!(event.runtime_version, "9.9.9");
        assert_eq!(event.description, "plugins initialized");
        let got: Vec<&str> = event.plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(got, names.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(event.plugins[3].extra["index"], Value::from("p3"));
        assert_eq!(rt.state(), RuntimeState::PluginsInitialized);
    }

    #[tokio::test]
    async fn failing_plugin_is_fatal_and_stops_the_sequence() {
        let tmp = tempfile::tempdir().unwrap();
        let mut rt = Runtime::new(RuntimeConfig::default());
        let later = Arc::new(AtomicUsize::new(0));

        let (ok, ok_data) = plugin("ok");
        rt.register_plugin(ok, ok_data).unwrap();
        rt.register_plugin(
            PluginFn::arc("broken", |_s: &Services| Err(PluginError::fail("no database"))),
            PluginData::new("broken", "0.0.1"),
        )
        .unwrap();
        let l = Arc::clone(&later);
        rt.register_plugin(
            PluginFn::arc("later", move |_s: &Services| {
                l.fetch_add(1, Ordering::SeqCst);
                Ok(PluginData::new("later", "1"))
            }),
            PluginData::new("later", "1"),
        )
        .unwrap();
        rt.initialize(&factory(tmp.path())).await.unwrap();

        let err = rt.initialize_plugins("1.0.0").unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(&err, RuntimeError::PluginInit { plugin, .. } if plugin == "broken"));
        assert_eq!(later.load(Ordering::SeqCst), 0);
        assert!(matches!(
            rt.initialize_plugins("1.0.0"),
            Err(RuntimeError::PluginsAlreadyInitialized)
        ));
    }

    #[tokio::test]
    async fn storage_root_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nested").join("storage");
        let rt = started(RuntimeConfig::default(), &root).await;

        assert!(root.is_dir());
        assert_eq!(rt.services().unwrap().storage().root(), root.as_path());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&root).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }

    #[tokio::test]
    async fn unusable_storage_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain-file");
        std::fs::write(&file, b"x").unwrap();

        let mut rt = Runtime::new(RuntimeConfig::default());
        let err = rt.initialize(&factory(&file.join("sub"))).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.as_label(), "runtime_storage_root");
        assert_eq!(rt.state(), RuntimeState::Uninitialized);
        assert!(rt.services().is_none());
    }

    #[tokio::test]
    async fn initialize_derives_forward_proxy() {
        let tmp = tempfile::tempdir().unwrap();
        let f = factory(tmp.path());
        f.config().set(FWD_PROXY_URL, Value::from("proxy.local"));
        f.config().set(FWD_PROXY_PORT, Value::from("3128"));

        let mut rt = Runtime::new(RuntimeConfig::default());
        rt.initialize(&f).await.unwrap();
        assert_eq!(
            rt.services().unwrap().config().get_string(FWD_PROXY_COMPLETE),
            "https://proxy.local:3128"
        );
    }

    #[tokio::test]
    async fn startup_event_is_not_seen_by_plugins() {
        let tmp = tempfile::tempdir().unwrap();
        let mut rt = started(RuntimeConfig::default(), tmp.path()).await;
        let system = Arc::new(AtomicUsize::new(0));
        let aggregate = Arc::new(AtomicUsize::new(0));

        let (s, a) = (Arc::clone(&system), Arc::clone(&aggregate));
        rt.register_plugin(
            PluginFn::arc("watcher", move |services: &Services| {
                let (s, a) = (Arc::clone(&s), Arc::clone(&a));
                services.events().listen_fn(Selector::SYSTEM, move |ev: Event| {
                    let (s, a) = (Arc::clone(&s), Arc::clone(&a));
                    async move {
                        if ev.is::<SystemEvent>() {
                            s.fetch_add(1, Ordering::SeqCst);
                        } else if ev.is::<PluginsInitializedEvent>() {
                            a.fetch_add(1, Ordering::SeqCst);
                        }
                        Ok(())
                    }
                });
                Ok(PluginData::new("watcher", "1"))
            }),
            PluginData::new("watcher", "1"),
        )
        .unwrap();

        let delivered = rt.initialize_plugins("1.0.0").unwrap().await.unwrap();
        assert_eq!(delivered.count, 1);
        assert_eq!(system.load(Ordering::SeqCst), 0);
        assert_eq!(aggregate.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_succeeds_when_listeners_respond() {
        let tmp = tempfile::tempdir().unwrap();
        let mut rt = started(RuntimeConfig::default(), tmp.path()).await;
        let closed = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&closed);
        rt.register_plugin(
            PluginFn::arc("db", move |services: &Services| {
                let c = Arc::clone(&c);
                services.events().listen_fn(Selector::SHUTDOWN, move |ev: Event| {
                    let c = Arc::clone(&c);
                    async move {
                        assert_eq!(
                            ev.downcast_ref::<ShutdownEvent>().map(|e| e.description.as_str()),
                            Some(SHUTDOWN_DESCRIPTION)
                        );
                        c.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                });
                Ok(PluginData::new("db", "1"))
            }),
            PluginData::new("db", "1"),
        )
        .unwrap();
        rt.initialize_plugins("1.0.0").unwrap().await.unwrap();

        rt.shutdown_plugins_and_wait().await.unwrap();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(rt.state(), RuntimeState::Terminated);

        assert!(matches!(
            rt.shutdown_plugins_and_wait().await,
            Err(RuntimeError::AlreadyShutDown)
        ));
    }

    #[tokio::test]
    async fn shutdown_times_out_on_stuck_listener() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = RuntimeConfig {
            shutdown_timeout: Duration::from_millis(100),
            ..RuntimeConfig::default()
        };
        let rt = started(cfg, tmp.path()).await;
        rt.services()
            .unwrap()
            .events()
            .listen_fn(Selector::SHUTDOWN, |_ev: Event| async {
                std::future::pending::<()>().await;
                Ok(())
            });

        let err = rt.shutdown_plugins_and_wait().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::ShutdownTimeout { timeout } if timeout == Duration::from_millis(100)
        ));
        assert!(!err.is_fatal());
        assert_eq!(rt.state(), RuntimeState::Terminated);
    }

    #[tokio::test]
    async fn lifecycle_order_is_enforced() {
        let tmp = tempfile::tempdir().unwrap();
        let mut rt = Runtime::new(RuntimeConfig::default());

        assert!(matches!(rt.initialize_plugins("1"), Err(RuntimeError::NotInitialized)));
        assert!(matches!(
            rt.shutdown_plugins_and_wait().await,
            Err(RuntimeError::NotInitialized)
        ));

        rt.initialize(&factory(tmp.path())).await.unwrap();
        assert_eq!(rt.state(), RuntimeState::Initialized);
        assert!(matches!(
            rt.initialize(&factory(tmp.path())).await,
            Err(RuntimeError::AlreadyInitialized)
        ));

        rt.initialize_plugins("1").unwrap();
        let (p, data) = plugin("late");
        assert!(matches!(
            rt.register_plugin(p, data),
            Err(RuntimeError::PluginsAlreadyInitialized)
        ));
    }

    #[tokio::test]
    async fn registration_before_initialize_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let mut rt = Runtime::new(RuntimeConfig::default());
        let (p, data) = plugin("early");
        rt.register_plugin(Arc::clone(&p), data.clone()).unwrap();
        rt.register_plugin(p, data).unwrap();
        assert_eq!(rt.state(), RuntimeState::Uninitialized);

        rt.initialize(&factory(tmp.path())).await.unwrap();
        assert_eq!(rt.state(), RuntimeState::PluginsRegistering);

        let delivered = rt.initialize_plugins("1").unwrap().await.unwrap();
        let event = delivered.event.downcast_ref::<PluginsInitializedEvent>().unwrap();
        assert_eq!(event.plugins.len(), 2);
        assert_eq!(event.plugins[0].extra["initialized"], Value::Bool(true));
    }

    #[tokio::test]
    async fn traced_runtime_attaches_log_writer() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = RuntimeConfig {
            trace_deliveries: true,
            ..RuntimeConfig::default()
        };
        let rt = started(cfg, tmp.path()).await;
        assert_eq!(
            rt.services().unwrap().events().listener_count(Selector::DELIVERED),
            1
        );
    }
}
