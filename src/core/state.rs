/// Lifecycle state of a [`Runtime`](crate::Runtime).
///
/// ```text
/// Uninitialized ─initialize─► Initialized ─register_plugin─► PluginsRegistering
///                                  │                              │
///                                  └──────initialize_plugins──────┴─► PluginsInitialized
///                                                                         │
///                                        shutdown_plugins_and_wait ─► ShuttingDown ─► Terminated
/// ```
///
/// Plugins may also be registered while `Uninitialized`; `initialize` then
/// moves straight to `PluginsRegistering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Uninitialized,
    Initialized,
    PluginsRegistering,
    PluginsInitialized,
    ShuttingDown,
    Terminated,
}

impl RuntimeState {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeState::Uninitialized => "uninitialized",
            RuntimeState::Initialized => "initialized",
            RuntimeState::PluginsRegistering => "plugins_registering",
            RuntimeState::PluginsInitialized => "plugins_initialized",
            RuntimeState::ShuttingDown => "shutting_down",
            RuntimeState::Terminated => "terminated",
        }
    }
}
