//! Contracts with the OS notification system, plus the implementations
//! shipped with the crate.
//!
//! This module provides:
//! - Capability probing and application identity lookup
//! - The notification backend that registers toasts with the OS
//! - Toast XML rendering
//! - A headless backend for test harnesses and unsupported platforms

pub mod headless;
pub mod markup;
#[cfg(windows)]
pub mod windows;

use crate::alert::AlertFields;
use crate::config::CoordinatorConfig;
use crate::error::Result;
use crate::handler::ToastHandler;
use std::sync::{Arc, Weak};

/// Default Application User Model ID
pub const DEFAULT_AUMID: &str = "com.toastcoordinator.app";

/// Answers whether native toasts can be used in this process
pub trait PlatformProbe: Send + Sync {
    fn is_platform_supported(&self) -> bool;
    fn application_identity(&self) -> Result<String>;
}

/// The OS notification transport
pub trait NotificationBackend: Send + Sync {
    /// Build the native payload without showing anything
    fn render(&self, alert: &AlertFields, image_url: &str) -> Result<String>;

    /// Show the toast. Called on the background worker; may block.
    fn register(&self, alert: &AlertFields, events: EventSink) -> Result<Box<dyn PlatformRegistration>>;
}

/// A toast the OS knows about
pub trait PlatformRegistration: Send {
    /// Withdraw the toast. Called exactly once per registration.
    fn release(&mut self) -> Result<()>;
}

/// Outcome reported by the OS for a shown toast. All are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    /// Toast body (`None`) or an action button was activated
    Activated { action: Option<String> },
    /// Dismissed by the user, timed out, or hidden by the application
    Dismissed,
    /// The OS reported an error for this toast
    Failed(String),
}

/// Route from the OS back to the handler that owns a registration.
///
/// Holds a weak reference, so a pending OS callback never keeps a handler
/// alive and events for a dropped handler are discarded.
#[derive(Clone)]
pub struct EventSink {
    handler: Weak<ToastHandler>,
}

impl EventSink {
    pub(crate) fn new(handler: Weak<ToastHandler>) -> Self {
        Self { handler }
    }

    /// Deliver an event. Safe to call from any thread.
    pub fn emit(&self, event: PlatformEvent) {
        match self.handler.upgrade() {
            Some(handler) => handler.handle_platform_event(event),
            None => tracing::debug!("Dropping {:?} for a released handler", event),
        }
    }
}

/// Probe and backend for this process.
///
/// Windows gets the native implementation, with the application identity
/// registered first so the probe can find it; elsewhere the headless backend
/// is used, which only passes `init` in test mode.
pub fn default_platform(
    config: &CoordinatorConfig,
) -> (Box<dyn PlatformProbe>, Arc<dyn NotificationBackend>) {
    let aumid = config
        .app_user_model_id
        .clone()
        .unwrap_or_else(|| DEFAULT_AUMID.to_string());

    #[cfg(windows)]
    {
        let icon = config.app_icon_path.as_deref();
        if let Err(e) = windows::ensure_aumid_registered(&aumid, &config.app_display_name, icon) {
            tracing::warn!("AUMID registration failed: {}", e);
        }
        (
            Box::new(windows::WindowsProbe::new(aumid.clone())),
            Arc::new(windows::WindowsToastBackend::new(aumid)),
        )
    }

    #[cfg(not(windows))]
    {
        tracing::debug!("No native toast support, using headless backend for {}", aumid);
        (
            Box::new(headless::HeadlessProbe::unsupported()),
            Arc::new(headless::HeadlessBackend::new()),
        )
    }
}
