//! In-process notification backend.
//!
//! Nothing is shown; registrations are recorded so a test harness can
//! inspect them and inject OS events.

use super::{markup, EventSink, NotificationBackend, PlatformEvent, PlatformProbe, PlatformRegistration};
use crate::alert::AlertFields;
use crate::error::{Result, ToastError};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;

pub struct HeadlessProbe {
    supported: bool,
    identity: Option<String>,
}

impl HeadlessProbe {
    pub fn new(supported: bool, identity: Option<String>) -> Self {
        Self { supported, identity }
    }

    pub fn supported(identity: impl Into<String>) -> Self {
        Self::new(true, Some(identity.into()))
    }

    pub fn unsupported() -> Self {
        Self::new(false, None)
    }
}

impl PlatformProbe for HeadlessProbe {
    fn is_platform_supported(&self) -> bool {
        self.supported
    }

    fn application_identity(&self) -> Result<String> {
        self.identity
            .clone()
            .ok_or_else(|| ToastError::IdentityUnavailable("no application identity".to_string()))
    }
}

/// A toast recorded by [`HeadlessBackend`]
#[derive(Debug, Clone)]
pub struct HeadlessToast {
    pub id: u64,
    pub name: String,
    pub cookie: String,
    pub title: String,
    pub text: String,
    /// Number of times the registration was released
    pub releases: u32,
}

#[derive(Default)]
struct HeadlessState {
    next_id: u64,
    toasts: Vec<HeadlessToast>,
    sinks: HashMap<u64, EventSink>,
    fail_next_register: Option<String>,
    emit_during_register: Option<PlatformEvent>,
}

#[derive(Default)]
pub struct HeadlessBackend {
    state: Arc<Mutex<HeadlessState>>,
    /// While true, `register` blocks
    hold: Arc<(Mutex<bool>, Condvar)>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next registration fail with a platform error
    pub fn fail_next_register(&self, reason: impl Into<String>) {
        self.state.lock().fail_next_register = Some(reason.into());
    }

    /// Deliver `event` from inside the next registration, before it returns,
    /// the way a native callback thread can
    pub fn emit_during_next_register(&self, event: PlatformEvent) {
        self.state.lock().emit_during_register = Some(event);
    }

    /// Block registrations until [`HeadlessBackend::resume`]
    pub fn pause(&self) {
        *self.hold.0.lock() = true;
    }

    pub fn resume(&self) {
        let (lock, cvar) = &*self.hold;
        *lock.lock() = false;
        cvar.notify_all();
    }

    /// Every registration made so far
    pub fn toasts(&self) -> Vec<HeadlessToast> {
        self.state.lock().toasts.clone()
    }

    /// Registrations not yet released
    pub fn live_toasts(&self) -> Vec<HeadlessToast> {
        self.state
            .lock()
            .toasts
            .iter()
            .filter(|t| t.releases == 0)
            .cloned()
            .collect()
    }

    /// Inject an OS event for the newest live toast with this name.
    /// Returns false if there is none.
    pub fn emit(&self, name: &str, event: PlatformEvent) -> bool {
        let sink = {
            let state = self.state.lock();
            state
                .toasts
                .iter()
                .rev()
                .find(|t| t.name == name && t.releases == 0)
                .and_then(|t| state.sinks.get(&t.id).cloned())
        };

        // The handler may release its registration while handling the
        // event, which takes the state lock again.
        match sink {
            Some(sink) => {
                sink.emit(event);
                true
            }
            None => false,
        }
    }

    fn wait_for_resume(&self) {
        let (lock, cvar) = &*self.hold;
        let mut held = lock.lock();
        while *held {
            cvar.wait(&mut held);
        }
    }
}

impl NotificationBackend for HeadlessBackend {
    fn render(&self, alert: &AlertFields, image_url: &str) -> Result<String> {
        Ok(markup::toast_xml(alert, image_url))
    }

    fn register(&self, alert: &AlertFields, events: EventSink) -> Result<Box<dyn PlatformRegistration>> {
        self.wait_for_resume();

        let mut state = self.state.lock();
        if let Some(reason) = state.fail_next_register.take() {
            return Err(ToastError::Platform(reason));
        }

        state.next_id += 1;
        let id = state.next_id;
        state.toasts.push(HeadlessToast {
            id,
            name: alert.name.clone(),
            cookie: alert.cookie.clone(),
            title: alert.title.clone(),
            text: alert.text.clone(),
            releases: 0,
        });
        state.sinks.insert(id, events.clone());
        let early_event = state.emit_during_register.take();
        drop(state);

        tracing::debug!("Headless toast {} registered for '{}'", id, alert.name);

        if let Some(event) = early_event {
            events.emit(event);
        }

        Ok(Box::new(HeadlessRegistration {
            id,
            state: self.state.clone(),
        }))
    }
}

struct HeadlessRegistration {
    id: u64,
    state: Arc<Mutex<HeadlessState>>,
}

impl PlatformRegistration for HeadlessRegistration {
    fn release(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.sinks.remove(&self.id);
        if let Some(toast) = state.toasts.iter_mut().find(|t| t.id == self.id) {
            toast.releases += 1;
        }
        tracing::debug!("Headless toast {} released", self.id);
        Ok(())
    }
}
