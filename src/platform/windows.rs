//! Native Windows toast support.
//!
//! Windows toast notifications require a registered AUMID (Application User
//! Model ID) to display the correct app name and icon.

use super::{markup, EventSink, NotificationBackend, PlatformEvent, PlatformProbe, PlatformRegistration};
use crate::alert::AlertFields;
use crate::error::{Result, ToastError};
use std::path::{Path, PathBuf};
use tauri_winrt_notification::{Duration, IconCrop, Scenario, Toast};
use winreg::enums::*;
use winreg::RegKey;

/// Toasts need Windows 8 (NT 6.2) or later
const MIN_NT_VERSION: (u32, u32) = (6, 2);

fn aumid_key_path(aumid: &str) -> String {
    format!(r"Software\Classes\AppUserModelId\{}", aumid)
}

/// Create or update `HKCU\Software\Classes\AppUserModelId\<aumid>` so
/// the toast shows `display_name` and, if the file exists, `icon`.
pub fn ensure_aumid_registered(aumid: &str, display_name: &str, icon: Option<&Path>) -> Result<()> {
    let path = aumid_key_path(aumid);
    let (key, disposition) = RegKey::predef(HKEY_CURRENT_USER).create_subkey(&path)?;

    key.set_value("DisplayName", &display_name)?;

    match icon {
        Some(icon) if icon.exists() => {
            key.set_value("IconUri", &icon.to_string_lossy().to_string())?;
        }
        Some(icon) => tracing::warn!("AUMID icon not found at {:?}", icon),
        None => {}
    }

    match disposition {
        winreg::enums::RegDisposition::REG_CREATED_NEW_KEY => {
            tracing::info!("Registered application identity {}", aumid)
        }
        winreg::enums::RegDisposition::REG_OPENED_EXISTING_KEY => {
            tracing::debug!("Refreshed application identity {}", aumid)
        }
    }
    Ok(())
}

pub struct WindowsProbe {
    aumid: String,
}

impl WindowsProbe {
    pub fn new(aumid: String) -> Self {
        Self { aumid }
    }

    fn nt_version() -> Option<(u32, u32)> {
        let key = RegKey::predef(HKEY_LOCAL_MACHINE)
            .open_subkey(r"SOFTWARE\Microsoft\Windows NT\CurrentVersion")
            .ok()?;

        // Only present on Windows 10 and later
        if let Ok(major) = key.get_value::<u32, _>("CurrentMajorVersionNumber") {
            let minor = key.get_value::<u32, _>("CurrentMinorVersionNumber").unwrap_or(0);
            return Some((major, minor));
        }

        let version: String = key.get_value("CurrentVersion").ok()?;
        let mut parts = version.split('.').map(|p| p.parse::<u32>().ok());
        Some((parts.next()??, parts.next().flatten().unwrap_or(0)))
    }
}

impl PlatformProbe for WindowsProbe {
    fn is_platform_supported(&self) -> bool {
        match Self::nt_version() {
            Some(version) => {
                tracing::debug!("Windows NT version {}.{}", version.0, version.1);
                version >= MIN_NT_VERSION
            }
            None => {
                tracing::warn!("Could not determine Windows version");
                false
            }
        }
    }

    fn application_identity(&self) -> Result<String> {
        RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey(aumid_key_path(&self.aumid))
            .map(|_| self.aumid.clone())
            .map_err(|e| ToastError::IdentityUnavailable(format!("{}: {}", self.aumid, e)))
    }
}

/// Shows toasts through WinRT
pub struct WindowsToastBackend {
    aumid: String,
}

impl WindowsToastBackend {
    pub fn new(aumid: String) -> Self {
        Self { aumid }
    }

    /// Local file behind an image URL, if it exists
    fn local_image(image_url: &str) -> Option<PathBuf> {
        let path = image_url.strip_prefix("file:///").unwrap_or(image_url);
        let path = PathBuf::from(path);
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }
}

impl NotificationBackend for WindowsToastBackend {
    fn render(&self, alert: &AlertFields, image_url: &str) -> Result<String> {
        // Only images that `register` can attach appear in the payload
        let image_url = match Self::local_image(image_url) {
            Some(_) => image_url,
            None => "",
        };
        Ok(markup::toast_xml(alert, image_url))
    }

    fn register(&self, alert: &AlertFields, events: EventSink) -> Result<Box<dyn PlatformRegistration>> {
        let duration = if alert.require_interaction {
            Duration::Long
        } else {
            Duration::Short
        };

        let mut toast = Toast::new(&self.aumid)
            .title(&alert.title)
            .text1(&alert.text)
            .duration(duration);

        if alert.require_interaction {
            toast = toast.scenario(Scenario::Reminder);
        }

        if let Some(line) = markup::attribution(alert) {
            toast = toast.text2(&line);
        }

        if let Some(icon) = Self::local_image(&alert.image_url) {
            toast = toast.icon(&icon, IconCrop::Circular, &alert.source);
        }

        for action in &alert.actions {
            toast = toast.add_button(&action.title, &action.action);
        }

        let activated = events.clone();
        toast = toast
            .on_activated(move |action| {
                activated.emit(PlatformEvent::Activated {
                    action: action.filter(|a| !a.is_empty()),
                });
                Ok(())
            })
            .on_dismissed(move |_reason| {
                events.emit(PlatformEvent::Dismissed);
                Ok(())
            });

        toast.show().map_err(|e| ToastError::Platform(e.to_string()))?;
        tracing::info!("Toast shown for '{}'", alert.name);

        Ok(Box::new(WinRtRegistration {
            name: alert.name.clone(),
        }))
    }
}

struct WinRtRegistration {
    name: String,
}

impl PlatformRegistration for WinRtRegistration {
    fn release(&mut self) -> Result<()> {
        // Shown toasts stay in the Action Center until the user clears them
        tracing::debug!("Released toast registration for '{}'", self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aumid_key_path() {
        assert_eq!(
            aumid_key_path("com.example.app"),
            r"Software\Classes\AppUserModelId\com.example.app"
        );
    }

    #[test]
    fn test_registered_aumid_is_probed() {
        let aumid = format!("com.toastcoordinator.test.{}", uuid::Uuid::new_v4());
        let probe = WindowsProbe::new(aumid.clone());
        assert!(matches!(
            probe.application_identity(),
            Err(ToastError::IdentityUnavailable(_))
        ));

        ensure_aumid_registered(&aumid, "Toast Test", None).unwrap();
        assert_eq!(probe.application_identity().unwrap(), aumid);

        RegKey::predef(HKEY_CURRENT_USER)
            .delete_subkey_all(aumid_key_path(&aumid))
            .unwrap();
    }
}
