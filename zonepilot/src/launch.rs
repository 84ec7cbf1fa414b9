use crate::platforms::AccessibilityEngine;
use crate::timezone::TimeZoneOption;
use crate::AutomationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// A way into the settings app
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryPoint {
    /// Explicit activity component
    Component { package: String, class_name: String },
    /// Implicit intent action
    Action { action: String },
}

impl EntryPoint {
    pub fn component(package: &str, class_name: &str) -> Self {
        EntryPoint::Component {
            package: package.to_string(),
            class_name: class_name.to_string(),
        }
    }

    pub fn action(action: &str) -> Self {
        EntryPoint::Action {
            action: action.to_string(),
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::Component {
                package,
                class_name,
            } => write!(f, "{package}/{class_name}"),
            EntryPoint::Action { action } => write!(f, "action {action}"),
        }
    }
}

/// Zone pickers first, then legacy screens, then the generic date settings
pub fn default_entry_points() -> Vec<EntryPoint> {
    vec![
        // Zone pickers
        EntryPoint::component(
            "com.android.settings",
            "com.android.settings.datetime.timezone.TimeZoneSettingsActivity",
        ),
        EntryPoint::component(
            "com.android.settings",
            "com.android.settings.Settings$ZonePickerActivity",
        ),
        EntryPoint::action("com.android.settings.action.TIME_ZONE_SETTINGS"),
        EntryPoint::component(
            "com.samsung.android.settings",
            "com.samsung.android.settings.datetime.timezone.TimeZoneSettingsActivity",
        ),
        EntryPoint::component(
            "com.samsung.android.settings",
            "com.samsung.android.settings.datetime.timezone.ZonePickerActivity",
        ),
        // Legacy direct screens
        EntryPoint::component(
            "com.android.settings",
            "com.android.settings.Settings$TimeZoneSettingsActivity",
        ),
        EntryPoint::component(
            "com.android.settings",
            "com.android.settings.Settings$DateTimeSettingsActivity",
        ),
        EntryPoint::action("android.settings.DATE_SETTINGS"),
    ]
}

/// Tries entry points in order until one launches
#[derive(Debug, Clone)]
pub struct LaunchStrategy {
    entries: Vec<EntryPoint>,
}

impl Default for LaunchStrategy {
    fn default() -> Self {
        Self::new(default_entry_points())
    }
}

impl LaunchStrategy {
    pub fn new(entries: Vec<EntryPoint>) -> Self {
        Self { entries }
    }

    /// Returns the entry point that launched.
    ///
    /// Success only means the launch call went through; nothing confirms the
    /// expected screen is the one now showing.
    #[instrument(level = "debug", skip(self, engine, option), fields(zone = %option.zone_id))]
    pub fn launch(
        &self,
        engine: &dyn AccessibilityEngine,
        option: &TimeZoneOption,
    ) -> Result<EntryPoint, AutomationError> {
        for entry in &self.entries {
            match engine.launch(entry) {
                Ok(()) => {
                    info!(%entry, "Opened settings");
                    return Ok(entry.clone());
                }
                Err(e) => debug!(%entry, "Launch failed: {}", e),
            }
        }
        warn!(
            attempts = self.entries.len(),
            "No settings entry point could be launched"
        );
        Err(AutomationError::LaunchFailure(format!(
            "none of {} entry points launched for {}",
            self.entries.len(),
            option.zone_id
        )))
    }
}
