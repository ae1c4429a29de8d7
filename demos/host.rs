//! # Example: host
//!
//! A minimal plugin host with two plugins:
//! - `gateway` registers an HTTP route and a shutdown listener;
//! - `archive` leases a storage directory and releases it on shutdown.
//!
//! ## Flow
//! ```text
//! init_tracing(log_level)
//! Runtime::register_plugin(gateway), register_plugin(archive)
//! Runtime::initialize(DefaultServices)      ── fatal error → exit(1)
//! Runtime::initialize_plugins(version)      ── fatal error → exit(1)
//! Runtime::run_until_signal()               ── Ctrl-C → shutdown handshake
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug PLUGHOST_LOCAL_STORAGE_PATH=/tmp/plughost cargo run --example host
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use plughost::{
    ConfigService, DefaultServices, Event, LOG_LEVEL, ListenerError, MemoryConfig, PluginData,
    PluginError, PluginFn, Request, Response, Runtime, RuntimeConfig, RuntimeError, Selector,
    Services, ShutdownEvent, StorageLease, init_tracing,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn gateway(services: &Services) -> Result<PluginData, PluginError> {
    let log = services.log().for_module("gateway");
    services.api().handle(
        "/hello",
        &["GET"],
        Arc::new(|_req: &Request| Response::text(200, "hello from gateway")),
    )?;

    services.events().listen_fn(Selector::SHUTDOWN, move |ev: Event| {
        let log = log.clone();
        async move {
            if let Some(bye) = ev.downcast_ref::<ShutdownEvent>() {
                log.info(&format!("draining connections: {}", bye.description));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        }
    });
    Ok(PluginData::new("gateway", "1.0.0").with_extra("routes", 1))
}

fn archive(services: &Services) -> Result<PluginData, PluginError> {
    let lease = services.storage().acquire("archive", "v1")?;
    let path = lease.path().display().to_string();
    let held: Arc<Mutex<Option<StorageLease>>> = Arc::new(Mutex::new(Some(lease)));

    let storage_services = services.clone();
    services.events().listen_fn(Selector::SHUTDOWN, move |_ev: Event| {
        let held = Arc::clone(&held);
        let services = storage_services.clone();
        async move {
            let lease = held.lock().ok().and_then(|mut l| l.take());
            if let Some(lease) = lease {
                services
                    .storage()
                    .release(lease)
                    .map_err(|e| ListenerError::fail(e.to_string()))?;
            }
            Ok(())
        }
    });
    Ok(PluginData::new("archive", "0.3.0").with_extra("path", path))
}

fn exit_if_fatal(err: RuntimeError) -> RuntimeError {
    if err.is_fatal() {
        tracing::error!(label = err.as_label(), "{}", err.as_message());
        std::process::exit(1);
    }
    err
}

#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    let config = MemoryConfig::load();
    init_tracing(&config.get_string(LOG_LEVEL));

    let mut rt = Runtime::new(RuntimeConfig::default());
    rt.register_plugin(
        PluginFn::arc("gateway", gateway),
        PluginData::new("gateway", "1.0.0"),
    )?;
    rt.register_plugin(
        PluginFn::arc("archive", archive),
        PluginData::new("archive", "0.3.0"),
    )?;

    rt.initialize(&DefaultServices::with_config(config))
        .await
        .map_err(exit_if_fatal)?;
    let delivered = rt.initialize_plugins(VERSION).map_err(exit_if_fatal)?.await?;
    tracing::info!(listeners = delivered.count, "plugins initialized, waiting for a signal");

    rt.run_until_signal().await
}
