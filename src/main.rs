//! `toastctl`: show one toast from a JSON alert and keep it until Ctrl-C.
//!
//! Usage: `toastctl [--render] '<alert json>'`

use anyhow::{Context, Result};
use std::sync::Arc;
use toast_coordinator::platform;
use toast_coordinator::{
    AlertEvent, AlertListener, AlertRequest, CoordinatorConfig, ShutdownSignal, ToastCoordinator,
};

#[tokio::main]
async fn main() -> Result<()> {
    toast_coordinator::init_tracing();

    let mut args = std::env::args().skip(1);
    let (render, json) = match args.next() {
        Some(flag) if flag == "--render" => (true, args.next()),
        other => (false, other),
    };
    let json = json.context("usage: toastctl [--render] '<alert json>'")?;
    let alert: AlertRequest = serde_json::from_str(&json).context("invalid alert JSON")?;

    let config = CoordinatorConfig::from_env();
    let (probe, backend) = platform::default_platform(&config);
    let shutdown = ShutdownSignal::new();
    let coordinator = ToastCoordinator::init(&config, probe.as_ref(), backend, &shutdown)?;

    if render {
        println!("{}", coordinator.render_only(&alert)?);
        return Ok(());
    }

    let listener: Arc<dyn AlertListener> = Arc::new(|event: &AlertEvent| {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!("Failed to encode alert event: {}", e),
        }
    });
    coordinator.show_alert(&alert, Some(listener))?;

    tracing::info!("Showing '{}', press Ctrl-C to exit", alert.name);
    shutdown.fire_on_ctrl_c().await?;

    Ok(())
}
