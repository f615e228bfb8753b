//! Alert values supplied by callers.
//!
//! An [`AlertSource`] is read once per show/render call into an
//! [`AlertFields`] snapshot; handlers keep the snapshot, never the source.

use crate::error::{Result, ToastError};
use serde::{Deserialize, Serialize};

/// A button shown on the toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSpec {
    /// Identifier reported back when the button is activated
    pub action: String,
    /// Button label
    pub title: String,
}

impl ActionSpec {
    pub fn new(action: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            title: title.into(),
        }
    }
}

/// Read access to an alert's fields. Every getter may fail.
pub trait AlertSource {
    fn cookie(&self) -> anyhow::Result<String>;
    fn name(&self) -> anyhow::Result<String>;
    fn title(&self) -> anyhow::Result<String>;
    fn text(&self) -> anyhow::Result<String>;
    fn text_clickable(&self) -> anyhow::Result<bool>;
    fn source(&self) -> anyhow::Result<String>;
    fn require_interaction(&self) -> anyhow::Result<bool>;
    fn actions(&self) -> anyhow::Result<Vec<ActionSpec>>;
    fn image_url(&self) -> anyhow::Result<String>;
}

/// Plain alert value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertRequest {
    pub name: String,
    pub cookie: String,
    pub title: String,
    pub text: String,
    /// Host/port or other attribution for the alert origin
    pub source: String,
    pub text_clickable: bool,
    pub require_interaction: bool,
    pub actions: Vec<ActionSpec>,
    pub image_url: String,
}

impl AlertRequest {
    pub fn new(name: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = cookie.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    pub fn with_action(mut self, action: ActionSpec) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_text_clickable(mut self, clickable: bool) -> Self {
        self.text_clickable = clickable;
        self
    }

    pub fn with_require_interaction(mut self, require: bool) -> Self {
        self.require_interaction = require;
        self
    }
}

impl AlertSource for AlertRequest {
    fn cookie(&self) -> anyhow::Result<String> {
        Ok(self.cookie.clone())
    }

    fn name(&self) -> anyhow::Result<String> {
        Ok(self.name.clone())
    }

    fn title(&self) -> anyhow::Result<String> {
        Ok(self.title.clone())
    }

    fn text(&self) -> anyhow::Result<String> {
        Ok(self.text.clone())
    }

    fn text_clickable(&self) -> anyhow::Result<bool> {
        Ok(self.text_clickable)
    }

    fn source(&self) -> anyhow::Result<String> {
        Ok(self.source.clone())
    }

    fn require_interaction(&self) -> anyhow::Result<bool> {
        Ok(self.require_interaction)
    }

    fn actions(&self) -> anyhow::Result<Vec<ActionSpec>> {
        Ok(self.actions.clone())
    }

    fn image_url(&self) -> anyhow::Result<String> {
        Ok(self.image_url.clone())
    }
}

/// Snapshot of everything a handler needs from an alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFields {
    pub cookie: String,
    pub name: String,
    pub title: String,
    pub text: String,
    pub text_clickable: bool,
    pub source: String,
    pub require_interaction: bool,
    pub actions: Vec<ActionSpec>,
    pub image_url: String,
}

impl AlertFields {
    /// Read every field, stopping at the first getter that fails.
    pub fn read(alert: &dyn AlertSource) -> Result<Self> {
        let cookie = alert.cookie().map_err(|e| ToastError::field("cookie", e))?;
        let name = alert.name().map_err(|e| ToastError::field("name", e))?;
        if name.is_empty() {
            return Err(ToastError::InvalidArgument("alert name is empty".to_string()));
        }
        let title = alert.title().map_err(|e| ToastError::field("title", e))?;
        let text = alert.text().map_err(|e| ToastError::field("text", e))?;
        let text_clickable = alert
            .text_clickable()
            .map_err(|e| ToastError::field("textClickable", e))?;
        let source = alert.source().map_err(|e| ToastError::field("source", e))?;
        let require_interaction = alert
            .require_interaction()
            .map_err(|e| ToastError::field("requireInteraction", e))?;
        let actions = alert.actions().map_err(|e| ToastError::field("actions", e))?;
        let image_url = alert
            .image_url()
            .map_err(|e| ToastError::field("imageURL", e))?;

        Ok(Self {
            cookie,
            name,
            title,
            text,
            text_clickable,
            source,
            require_interaction,
            actions,
            image_url,
        })
    }
}
