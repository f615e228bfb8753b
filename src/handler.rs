//! A single toast and its platform registration.
//!
//! Lifecycle: `Created -> Initializing -> {Live, InitFailed}`, and from any
//! of those to `Unregistered`, which is terminal. The registration is
//! released exactly once no matter how many paths ask for it.

use crate::alert::AlertFields;
use crate::dispatcher::BackgroundDispatcher;
use crate::error::{Result, ToastError};
use crate::listener::{AlertEvent, AlertListener, AlertTopic};
use crate::platform::{EventSink, NotificationBackend, PlatformEvent, PlatformRegistration};
use crate::registry::HandlerRegistry;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerState {
    Created,
    Initializing,
    Live,
    InitFailed,
    Unregistered,
}

struct HandlerInner {
    state: HandlerState,
    registration: Option<Box<dyn PlatformRegistration>>,
    /// Event the OS delivered before `register` returned
    pending_event: Option<PlatformEvent>,
}

pub struct ToastHandler {
    id: Uuid,
    created_at: DateTime<Utc>,
    fields: AlertFields,
    listener: Option<Arc<dyn AlertListener>>,
    backend: Arc<dyn NotificationBackend>,
    /// Non-owning; the registry owns handlers, not the other way round
    registry: Weak<HandlerRegistry>,
    inner: Mutex<HandlerInner>,
}

impl ToastHandler {
    pub fn new(
        registry: Weak<HandlerRegistry>,
        backend: Arc<dyn NotificationBackend>,
        listener: Option<Arc<dyn AlertListener>>,
        fields: AlertFields,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            fields,
            listener,
            backend,
            registry,
            inner: Mutex::new(HandlerInner {
                state: HandlerState::Created,
                registration: None,
                pending_event: None,
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn fields(&self) -> &AlertFields {
        &self.fields
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> HandlerState {
        self.inner.lock().state
    }

    /// Not yet failed or unregistered
    pub fn is_active(&self) -> bool {
        matches!(
            self.state(),
            HandlerState::Created | HandlerState::Initializing | HandlerState::Live
        )
    }

    /// Submit platform registration to the background worker.
    ///
    /// Returns once the work is queued; the toast appears later.
    pub fn init_async(self: &Arc<Self>, dispatcher: &BackgroundDispatcher) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if inner.state != HandlerState::Created {
                return Err(ToastError::Other(format!(
                    "handler for '{}' already initialized",
                    self.name()
                )));
            }
            inner.state = HandlerState::Initializing;
        }

        let handler = self.clone();
        let submitted = dispatcher.dispatch(Box::new(move || handler.register_with_platform()));

        if submitted.is_err() {
            let mut inner = self.inner.lock();
            if inner.state == HandlerState::Initializing {
                inner.state = HandlerState::InitFailed;
            }
        }
        submitted
    }

    /// Runs on the background worker
    fn register_with_platform(self: Arc<Self>) {
        if self.state() == HandlerState::Unregistered {
            tracing::debug!("Skipping registration of superseded toast '{}'", self.name());
            return;
        }

        let result = self
            .backend
            .register(&self.fields, EventSink::new(Arc::downgrade(&self)));

        match result {
            Ok(registration) => {
                let mut inner = self.inner.lock();
                if inner.state == HandlerState::Unregistered {
                    // Unregistered while the platform call was in flight
                    drop(inner);
                    release_registration(self.name(), registration);
                    return;
                }
                let pending = inner.pending_event.take();
                inner.registration = Some(registration);

                if let Some(PlatformEvent::Failed(reason)) = &pending {
                    inner.state = HandlerState::InitFailed;
                    drop(inner);
                    tracing::warn!("Toast '{}' failed while registering: {}", self.name(), reason);
                    self.remove_self();
                    return;
                }

                inner.state = HandlerState::Live;
                drop(inner);

                tracing::info!("Toast '{}' is live ({})", self.name(), self.id);
                self.notify(AlertTopic::Show, None);

                if let Some(event) = pending {
                    self.handle_platform_event(event);
                }
            }
            Err(e) => {
                tracing::warn!("Platform rejected toast '{}': {}", self.name(), e);
                {
                    let mut inner = self.inner.lock();
                    if inner.state == HandlerState::Unregistered {
                        return;
                    }
                    inner.state = HandlerState::InitFailed;
                }
                self.remove_self();
            }
        }
    }

    /// Handle an OS callback. Every platform event ends the toast.
    ///
    /// Events that arrive before `register` has returned are held and
    /// processed once the registration is stored.
    pub(crate) fn handle_platform_event(self: &Arc<Self>, event: PlatformEvent) {
        {
            let mut inner = self.inner.lock();
            match inner.state {
                HandlerState::Live => {}
                HandlerState::Initializing => {
                    tracing::debug!("Deferring {:?} for toast '{}'", event, self.name());
                    if inner.pending_event.is_none() {
                        inner.pending_event = Some(event);
                    }
                    return;
                }
                _ => {
                    tracing::debug!("Ignoring {:?} for inactive toast '{}'", event, self.name());
                    return;
                }
            }
        }

        match event {
            PlatformEvent::Activated { action: None } => {
                if self.fields.text_clickable {
                    self.notify(AlertTopic::ClickCallback, None);
                }
            }
            PlatformEvent::Activated { action: Some(action) } => {
                self.notify(AlertTopic::ActionCallback, Some(action));
            }
            PlatformEvent::Dismissed => {
                tracing::debug!("Toast '{}' dismissed", self.name());
            }
            PlatformEvent::Failed(reason) => {
                tracing::warn!("Toast '{}' failed: {}", self.name(), reason);
            }
        }

        self.remove_self();
    }

    /// Leave the registry if still current; a superseded handler only
    /// tears itself down and leaves the newer entry alone.
    fn remove_self(self: &Arc<Self>) {
        let removed = self
            .registry
            .upgrade()
            .is_some_and(|registry| registry.remove_if_current(self.name(), self));

        if !removed {
            self.unregister();
        }
    }

    /// Release the platform registration. Idempotent.
    pub fn unregister(&self) {
        let (registration, was_live) = {
            let mut inner = self.inner.lock();
            if inner.state == HandlerState::Unregistered {
                return;
            }
            let was_live = inner.state == HandlerState::Live;
            inner.state = HandlerState::Unregistered;
            (inner.registration.take(), was_live)
        };

        if let Some(registration) = registration {
            release_registration(self.name(), registration);
        }
        tracing::debug!("Toast '{}' unregistered ({})", self.name(), self.id);

        if was_live {
            self.notify(AlertTopic::Finished, None);
        }
    }

    /// Native payload for this alert
    pub fn render_markup(&self, image_url: &str) -> Result<String> {
        self.backend.render(&self.fields, image_url)
    }

    fn notify(&self, topic: AlertTopic, action: Option<String>) {
        if let Some(ref listener) = self.listener {
            listener.observe(&AlertEvent {
                topic,
                cookie: self.fields.cookie.clone(),
                action,
            });
        }
    }
}

fn release_registration(name: &str, mut registration: Box<dyn PlatformRegistration>) {
    if let Err(e) = registration.release() {
        tracing::warn!("Failed to release toast '{}': {}", name, e);
    }
}

impl Drop for ToastHandler {
    fn drop(&mut self) {
        if let Some(registration) = self.inner.get_mut().registration.take() {
            tracing::warn!("Toast '{}' dropped while registered", self.fields.name);
            release_registration(&self.fields.name, registration);
        }
    }
}

impl std::fmt::Debug for ToastHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToastHandler")
            .field("id", &self.id)
            .field("name", &self.fields.name)
            .field("state", &self.state())
            .finish()
    }
}
