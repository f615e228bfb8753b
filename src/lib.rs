//! Toast notification coordinator.
//!
//! Tracks one live toast per alert name, supersedes older toasts with the
//! same name, and tears every toast down when the process shuts down.

pub mod alert;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod listener;
pub mod platform;
pub mod registry;
pub mod shutdown;

pub use alert::{ActionSpec, AlertFields, AlertRequest, AlertSource};
pub use config::CoordinatorConfig;
pub use coordinator::ToastCoordinator;
pub use error::{Result, ToastError};
pub use handler::{HandlerState, ToastHandler};
pub use listener::{AlertEvent, AlertListener, AlertTopic, ChannelListener};
pub use shutdown::ShutdownSignal;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the default tracing subscriber. Does nothing if one is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toast_coordinator=debug,toastctl=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
