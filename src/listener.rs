//! Observers of user interaction with a toast.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Interaction outcome reported to an [`AlertListener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertTopic {
    #[serde(rename = "alertshow")]
    Show,
    #[serde(rename = "alertclickcallback")]
    ClickCallback,
    #[serde(rename = "alertactioncallback")]
    ActionCallback,
    #[serde(rename = "alertfinished")]
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub topic: AlertTopic,
    /// Cookie of the alert the event belongs to
    pub cookie: String,
    /// Activated action, for `ActionCallback`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl AlertEvent {
    pub fn new(topic: AlertTopic, cookie: impl Into<String>) -> Self {
        Self {
            topic,
            cookie: cookie.into(),
            action: None,
        }
    }
}

/// Receives [`AlertEvent`]s. May be called from any thread.
pub trait AlertListener: Send + Sync {
    fn observe(&self, event: &AlertEvent);
}

impl<F> AlertListener for F
where
    F: Fn(&AlertEvent) + Send + Sync,
{
    fn observe(&self, event: &AlertEvent) {
        self(event)
    }
}

/// Forwards events into a tokio channel for async consumers
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<AlertEvent>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AlertEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AlertListener for ChannelListener {
    fn observe(&self, event: &AlertEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::debug!("Alert listener receiver dropped, discarding {:?}", event.topic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_wire_names() {
        assert_eq!(serde_json::to_string(&AlertTopic::Show).unwrap(), "\"alertshow\"");
        assert_eq!(
            serde_json::to_string(&AlertTopic::Finished).unwrap(),
            "\"alertfinished\""
        );
    }

    #[tokio::test]
    async fn test_channel_listener_forwards() {
        let (listener, mut rx) = ChannelListener::new();
        listener.observe(&AlertEvent::new(AlertTopic::ClickCallback, "cookie"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, AlertTopic::ClickCallback);
        assert_eq!(event.cookie, "cookie");
    }
}
