//! Name-keyed table of live toast handlers.
//!
//! At most one handler per alert name. Handlers removed from the table are
//! always unregistered after the table lock is released: dropping the last
//! reference to a handler must never happen while the map is being mutated.

use crate::handler::ToastHandler;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<ToastHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToastHandler>> {
        self.handlers.read().get(name).cloned()
    }

    /// Install `handler` under `name`, returning whatever it displaced
    pub fn insert_or_update(&self, name: String, handler: Arc<ToastHandler>) -> Option<Arc<ToastHandler>> {
        self.handlers.write().insert(name, handler)
    }

    /// Whether `handler` is the very handler stored under `name`
    pub fn is_current(&self, name: &str, handler: &Arc<ToastHandler>) -> bool {
        self.handlers
            .read()
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, handler))
    }

    /// Remove the entry for `name` without unregistering it
    pub fn remove(&self, name: &str) -> Option<Arc<ToastHandler>> {
        self.handlers.write().remove(name)
    }

    /// Remove and unregister `handler` if it is still current for `name`.
    /// A superseded handler leaves the table untouched.
    pub fn remove_if_current(&self, name: &str, handler: &Arc<ToastHandler>) -> bool {
        let removed = {
            let mut handlers = self.handlers.write();
            let current = handlers
                .get(name)
                .is_some_and(|entry| Arc::ptr_eq(entry, handler));
            if current {
                handlers.remove(name)
            } else {
                None
            }
        };

        match removed {
            // `removed` keeps the handler alive until unregister returns
            Some(removed) => {
                removed.unregister();
                true
            }
            None => false,
        }
    }

    /// Undo an insert: if `current` is still stored under `name`, put back
    /// `previous` when it is still active, otherwise clear the entry.
    pub fn restore_if_current(
        &self,
        name: &str,
        current: &Arc<ToastHandler>,
        previous: Option<Arc<ToastHandler>>,
    ) -> bool {
        let _displaced = {
            let mut handlers = self.handlers.write();
            if !handlers
                .get(name)
                .is_some_and(|entry| Arc::ptr_eq(entry, current))
            {
                return false;
            }

            match previous.filter(|p| p.is_active()) {
                Some(previous) => handlers.insert(name.to_string(), previous),
                None => handlers.remove(name),
            }
        };
        true
    }

    /// Empty the table, handing back every entry for teardown
    pub fn drain(&self) -> Vec<(String, Arc<ToastHandler>)> {
        std::mem::take(&mut *self.handlers.write()).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Names with a live entry, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertFields, AlertRequest};
    use crate::handler::HandlerState;
    use crate::platform::headless::HeadlessBackend;

    fn handler(registry: &Arc<HandlerRegistry>, name: &str) -> Arc<ToastHandler> {
        ToastHandler::new(
            Arc::downgrade(registry),
            Arc::new(HeadlessBackend::new()),
            None,
            AlertFields::read(&AlertRequest::new(name, "T", "x")).unwrap(),
        )
    }

    #[test]
    fn test_insert_or_update_returns_displaced() {
        let registry = Arc::new(HandlerRegistry::new());
        let h1 = handler(&registry, "a");
        let h2 = handler(&registry, "a");

        assert!(registry.insert_or_update("a".to_string(), h1.clone()).is_none());
        let displaced = registry.insert_or_update("a".to_string(), h2.clone()).unwrap();

        assert!(Arc::ptr_eq(&displaced, &h1));
        assert_eq!(registry.len(), 1);
        assert!(registry.is_current("a", &h2));
        assert!(!registry.is_current("a", &h1));
    }

    #[test]
    fn test_is_current_uses_identity() {
        let registry = Arc::new(HandlerRegistry::new());
        let h1 = handler(&registry, "a");
        let twin = handler(&registry, "a");
        registry.insert_or_update("a".to_string(), h1);

        // Same fields, different handler
        assert!(!registry.is_current("a", &twin));
        assert!(!registry.is_current("b", &twin));
    }

    #[test]
    fn test_remove_if_current_ignores_stale_handler() {
        let registry = Arc::new(HandlerRegistry::new());
        let stale = handler(&registry, "a");
        let fresh = handler(&registry, "a");
        registry.insert_or_update("a".to_string(), stale.clone());
        registry.insert_or_update("a".to_string(), fresh.clone());

        assert!(!registry.remove_if_current("a", &stale));
        assert!(registry.is_current("a", &fresh));
        assert_eq!(fresh.state(), HandlerState::Created);

        assert!(registry.remove_if_current("a", &fresh));
        assert!(registry.is_empty());
        assert_eq!(fresh.state(), HandlerState::Unregistered);
    }

    #[test]
    fn test_remove_if_current_with_last_reference_in_table() {
        let registry = Arc::new(HandlerRegistry::new());
        let h = handler(&registry, "a");
        let weak = Arc::downgrade(&h);
        registry.insert_or_update("a".to_string(), h.clone());

        // Mirrors a self-removal where the table owns the only strong ref
        let h_ref = weak.upgrade().unwrap();
        drop(h);
        assert!(registry.remove_if_current("a", &h_ref));
        drop(h_ref);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_restore_if_current() {
        let registry = Arc::new(HandlerRegistry::new());
        let old = handler(&registry, "a");
        let new = handler(&registry, "a");
        registry.insert_or_update("a".to_string(), old.clone());
        let previous = registry.insert_or_update("a".to_string(), new.clone());

        assert!(registry.restore_if_current("a", &new, previous));
        assert!(registry.is_current("a", &old));

        // A dead previous handler is not brought back
        let newer = handler(&registry, "a");
        let previous = registry.insert_or_update("a".to_string(), newer.clone());
        old.unregister();
        assert!(registry.restore_if_current("a", &newer, previous));
        assert!(registry.get("a").is_none());

        assert!(!registry.restore_if_current("a", &newer, None));
    }

    #[test]
    fn test_drain_empties_table() {
        let registry = Arc::new(HandlerRegistry::new());
        for name in ["a", "b", "c"] {
            registry.insert_or_update(name.to_string(), handler(&registry, name));
        }
        assert_eq!(registry.names(), vec!["a", "b", "c"]);

        let drained = registry.drain();
        assert_eq!(drained.len(), 3);
        assert!(registry.is_empty());
        assert!(registry.drain().is_empty());
    }
}
