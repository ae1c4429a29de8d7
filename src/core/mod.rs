//! Runtime core: plugin lifecycle orchestration.
//!
//! The public API of this module is [`Runtime`], configured by
//! [`RuntimeConfig`] and observable through [`RuntimeState`].
//!
//! Internal modules:
//! - [`runtime`]: initialization, plugin startup and the shutdown handshake;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod config;
mod runtime;
mod shutdown;
mod state;

pub use config::RuntimeConfig;
pub use runtime::Runtime;
pub use shutdown::wait_for_shutdown_signal;
pub use state::RuntimeState;
