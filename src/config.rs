//! Coordinator configuration.
//!
//! Settings come from an optional JSON file, then environment overrides
//! (a `.env` file is honoured for development).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Marks the process as a test harness; waives the platform and identity checks.
pub const TEST_PROFILE_ENV: &str = "TOAST_TEST_PROFILE_DIR";

/// Overrides the Application User Model ID used for toasts.
pub const APP_USER_MODEL_ID_ENV: &str = "TOAST_APP_USER_MODEL_ID";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorConfig {
    /// Test profile directory; its presence enables test mode
    #[serde(default)]
    pub test_profile_dir: Option<PathBuf>,
    /// Application identity to use instead of the probed one
    #[serde(default)]
    pub app_user_model_id: Option<String>,
    /// Display name registered for the application identity
    #[serde(default = "default_app_display_name")]
    pub app_display_name: String,
    /// Icon registered for the application identity
    #[serde(default)]
    pub app_icon_path: Option<PathBuf>,
    /// Name of the background worker thread
    #[serde(default = "default_dispatcher_thread_name")]
    pub dispatcher_thread_name: String,
}

fn default_app_display_name() -> String {
    "Toast Coordinator".to_string()
}

fn default_dispatcher_thread_name() -> String {
    "ToastBgThread".to_string()
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            test_profile_dir: None,
            app_user_model_id: None,
            app_display_name: default_app_display_name(),
            app_icon_path: None,
            dispatcher_thread_name: default_dispatcher_thread_name(),
        }
    }
}

impl CoordinatorConfig {
    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load from a JSON file if present, then apply environment overrides
    pub fn load(path: &Path) -> Self {
        let _ = dotenvy::dotenv();

        let mut config = if path.exists() {
            match std::fs::read_to_string(path)
                .map_err(crate::error::ToastError::from)
                .and_then(|s| serde_json::from_str::<Self>(&s).map_err(Into::into))
            {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(TEST_PROFILE_ENV) {
            tracing::info!("Test mode enabled via {}", TEST_PROFILE_ENV);
            self.test_profile_dir = Some(PathBuf::from(dir));
        }

        if let Ok(aumid) = std::env::var(APP_USER_MODEL_ID_ENV) {
            if !aumid.is_empty() {
                tracing::info!("Using {} from environment variable", APP_USER_MODEL_ID_ENV);
                self.app_user_model_id = Some(aumid);
            }
        }
    }

    /// Whether the test-mode escape hatch is present
    pub fn test_mode(&self) -> bool {
        self.test_profile_dir.is_some()
    }

    /// Configuration for test harnesses
    pub fn for_tests() -> Self {
        Self {
            test_profile_dir: Some(std::env::temp_dir()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.dispatcher_thread_name, "ToastBgThread");
        assert_eq!(config.app_display_name, "Toast Coordinator");
        assert!(config.app_icon_path.is_none());
        assert!(!config.test_mode());
        assert!(CoordinatorConfig::for_tests().test_mode());
    }

    #[test]
    fn test_load_json_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("toast.json");
        std::fs::write(
            &path,
            r#"{"appUserModelId": "com.example.toasts", "appDisplayName": "Example", "dispatcherThreadName": "Worker"}"#,
        )
        .unwrap();

        let config = CoordinatorConfig::load(&path);
        assert_eq!(config.dispatcher_thread_name, "Worker");
        assert_eq!(config.app_display_name, "Example");
        assert!(config.app_user_model_id.is_some());
    }

    #[test]
    fn test_load_falls_back_on_garbage() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("toast.json");
        std::fs::write(&path, "not json").unwrap();

        let config = CoordinatorConfig::load(&path);
        assert_eq!(config.dispatcher_thread_name, "ToastBgThread");
    }
}
