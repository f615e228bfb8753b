//! Public entry point: shows, replaces and closes toasts by name.
//!
//! A new alert with a name that is already showing supersedes the old one.
//! The new handler is installed first and the old one is unregistered
//! afterwards, so a name with an outstanding show never maps to nothing.

use crate::alert::{AlertFields, AlertSource};
use crate::config::CoordinatorConfig;
use crate::dispatcher::BackgroundDispatcher;
use crate::error::{Result, ToastError};
use crate::handler::ToastHandler;
use crate::listener::AlertListener;
use crate::platform::{NotificationBackend, PlatformProbe};
use crate::registry::HandlerRegistry;
use crate::shutdown::ShutdownSignal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

struct CoordinatorInner {
    registry: Arc<HandlerRegistry>,
    dispatcher: BackgroundDispatcher,
    backend: Arc<dyn NotificationBackend>,
    /// Drop new alerts while the screen is being shared
    suppress_for_screen_sharing: AtomicBool,
    app_user_model_id: Option<String>,
}

impl CoordinatorInner {
    /// Remove and unregister every handler
    fn drain_handlers(&self) {
        let handlers = self.registry.drain();
        tracing::info!("Draining {} toast handlers", handlers.len());

        for (name, handler) in handlers {
            tracing::debug!(
                "Unregistering '{}' for shutdown (queued {})",
                name,
                handler.created_at().to_rfc3339()
            );
            handler.unregister();
        }
    }
}

#[derive(Clone)]
pub struct ToastCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl ToastCoordinator {
    /// Check platform support, start the background worker and subscribe
    /// to `shutdown`.
    pub fn init(
        config: &CoordinatorConfig,
        probe: &dyn PlatformProbe,
        backend: Arc<dyn NotificationBackend>,
        shutdown: &ShutdownSignal,
    ) -> Result<Self> {
        if !probe.is_platform_supported() {
            if !config.test_mode() {
                return Err(ToastError::UnsupportedPlatform);
            }
            tracing::warn!("Toasts unsupported on this platform, continuing in test mode");
        }

        let app_user_model_id = match probe.application_identity() {
            Ok(aumid) => Some(aumid),
            Err(e) if config.test_mode() => {
                tracing::warn!("No application identity ({}), continuing in test mode", e);
                None
            }
            Err(e @ ToastError::IdentityUnavailable(_)) => return Err(e),
            Err(e) => return Err(ToastError::IdentityUnavailable(e.to_string())),
        };

        let dispatcher = BackgroundDispatcher::spawn(&config.dispatcher_thread_name)?;

        let inner = Arc::new(CoordinatorInner {
            registry: Arc::new(HandlerRegistry::new()),
            dispatcher,
            backend,
            suppress_for_screen_sharing: AtomicBool::new(false),
            app_user_model_id,
        });

        let weak: Weak<CoordinatorInner> = Arc::downgrade(&inner);
        let subscribed = shutdown.subscribe(move || {
            if let Some(inner) = weak.upgrade() {
                inner.drain_handlers();
            }
        });
        if !subscribed {
            tracing::warn!("Shutdown already in progress; handlers will not be drained");
        }

        tracing::info!(
            "Toast coordinator ready (aumid: {})",
            inner.app_user_model_id.as_deref().unwrap_or("<none>")
        );

        Ok(Self { inner })
    }

    pub fn app_user_model_id(&self) -> Option<&str> {
        self.inner.app_user_model_id.as_deref()
    }

    pub fn suppression(&self) -> bool {
        self.inner.suppress_for_screen_sharing.load(Ordering::SeqCst)
    }

    pub fn set_suppression(&self, suppress: bool) {
        self.inner
            .suppress_for_screen_sharing
            .store(suppress, Ordering::SeqCst);
        tracing::info!("Toast suppression {}", if suppress { "on" } else { "off" });
    }

    /// Show `alert`, superseding any toast with the same name.
    ///
    /// Returns once registration has been queued, not once the toast is on
    /// screen.
    pub fn show_alert(
        &self,
        alert: &dyn AlertSource,
        listener: Option<Arc<dyn AlertListener>>,
    ) -> Result<()> {
        if self.suppression() {
            tracing::debug!("Toast suppressed");
            return Ok(());
        }

        let fields = AlertFields::read(alert)?;
        let name = fields.name.clone();

        let inner = &self.inner;
        let handler = ToastHandler::new(
            Arc::downgrade(&inner.registry),
            inner.backend.clone(),
            listener,
            fields,
        );
        let old = inner.registry.insert_or_update(name.clone(), handler.clone());

        if let Err(e) = handler.init_async(&inner.dispatcher) {
            tracing::warn!("Failed to queue toast '{}': {}", name, e);
            inner.registry.restore_if_current(&name, &handler, old);
            handler.unregister();
            return Err(e);
        }

        if let Some(old) = old {
            tracing::debug!(
                "Toast '{}' superseded ({} from {} -> {})",
                name,
                old.id(),
                old.created_at().to_rfc3339(),
                handler.id()
            );
            old.unregister();
        }

        tracing::info!("Toast '{}' queued ({})", name, handler.id());
        Ok(())
    }

    /// Same as [`ToastCoordinator::show_alert`]; `persistent_data` is not used
    pub fn show_persistent_notification(
        &self,
        persistent_data: &str,
        alert: &dyn AlertSource,
        listener: Option<Arc<dyn AlertListener>>,
    ) -> Result<()> {
        tracing::debug!("Ignoring {} bytes of persistent data", persistent_data.len());
        self.show_alert(alert, listener)
    }

    /// Native payload for `alert`, without showing it or touching the registry
    pub fn render_only(&self, alert: &dyn AlertSource) -> Result<String> {
        let fields = AlertFields::read(alert)?;
        let image_url = fields.image_url.clone();

        let handler = ToastHandler::new(Weak::new(), self.inner.backend.clone(), None, fields);
        handler.render_markup(&image_url)
    }

    /// Close the toast named `name`. Unknown names are not an error.
    pub fn close_alert(&self, name: &str) -> Result<()> {
        let Some(handler) = self.inner.registry.remove(name) else {
            tracing::debug!("No toast named '{}' to close", name);
            return Ok(());
        };

        handler.unregister();
        tracing::info!("Toast '{}' closed", name);
        Ok(())
    }

    pub fn manual_do_not_disturb(&self) -> Result<bool> {
        Err(ToastError::NotImplemented("manual do-not-disturb"))
    }

    pub fn set_manual_do_not_disturb(&self, _do_not_disturb: bool) -> Result<()> {
        Err(ToastError::NotImplemented("manual do-not-disturb"))
    }

    /// Whether `handler` is the current handler for `name`
    pub fn is_active_handler(&self, name: &str, handler: &Arc<ToastHandler>) -> bool {
        self.inner.registry.is_current(name, handler)
    }

    /// Remove and unregister `handler` only if it is still current for `name`
    pub fn remove_handler(&self, name: &str, handler: &Arc<ToastHandler>) -> bool {
        self.inner.registry.remove_if_current(name, handler)
    }

    pub fn active_handler(&self, name: &str) -> Option<Arc<ToastHandler>> {
        self.inner.registry.get(name)
    }

    /// Names of all toasts in the registry, sorted
    pub fn active_alerts(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    /// Block until all queued registration work has run
    pub fn flush(&self) -> Result<()> {
        self.inner.dispatcher.flush()
    }
}
