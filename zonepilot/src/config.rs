//! Tunables and vendor tables
//!
//! Every vendor-specific phrase, widget class and view id the stage handlers
//! look for lives here, so a new settings-app shape is a configuration change.
//! All sections default, so a JSON file only needs the fields it overrides.

use crate::launch::{default_entry_points, EntryPoint};
use crate::selector::Selector;
use crate::service::ServiceComponent;
use crate::AutomationError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Shared default configuration
pub static DEFAULT_CONFIG: Lazy<AutomationConfig> = Lazy::new(AutomationConfig::default);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Package prefixes of the settings apps we drive, matched case-sensitively
    pub settings_packages: Vec<String>,
    pub timing: TimingConfig,
    pub disable_auto: DisableAutoProfile,
    pub time_zone_list: TimeZoneListProfile,
    pub search_field: SearchFieldProfile,
    pub search_affordance: SearchAffordanceProfile,
    /// Identity of the hosting accessibility service
    pub service: ServiceComponent,
    /// Tried in order by the launch strategy
    pub entry_points: Vec<EntryPoint>,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            settings_packages: vec![
                "com.android.settings".to_string(),
                "com.samsung.android.settings".to_string(),
            ],
            timing: TimingConfig::default(),
            disable_auto: DisableAutoProfile::default(),
            time_zone_list: TimeZoneListProfile::default(),
            search_field: SearchFieldProfile::default(),
            search_affordance: SearchAffordanceProfile::default(),
            service: ServiceComponent::new(
                "dev.zonepilot.app",
                "dev.zonepilot.app.timezone.TimeZoneAutomationService",
            ),
            entry_points: default_entry_points(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Requests older than this are abandoned with a failure notice
    pub request_timeout_ms: u64,
    /// Age after which the "open the list manually" hint may show
    pub manual_zone_hint_after_ms: u64,
    /// Misses in the disable stage before giving up on the toggle
    pub disable_attempt_threshold: u32,
    /// Delay before typing into a field we just focused
    pub focus_recheck_delay_ms: u64,
    /// Delay before looking for the search field after tapping the search icon
    pub search_retry_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 15_000,
            manual_zone_hint_after_ms: 4_000,
            disable_attempt_threshold: 3,
            focus_recheck_delay_ms: 200,
            search_retry_delay_ms: 300,
        }
    }
}

impl TimingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn manual_zone_hint_after(&self) -> Duration {
        Duration::from_millis(self.manual_zone_hint_after_ms)
    }

    pub fn focus_recheck_delay(&self) -> Duration {
        Duration::from_millis(self.focus_recheck_delay_ms)
    }

    pub fn search_retry_delay(&self) -> Duration {
        Duration::from_millis(self.search_retry_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisableAutoProfile {
    /// Phrases of the "automatic time zone" toggle, any language
    pub keywords: Vec<String>,
    /// Toggle widget classes across vendors
    pub toggle_classes: Vec<String>,
}

impl Default for DisableAutoProfile {
    fn default() -> Self {
        Self {
            keywords: vec!["автомат".to_string(), "automatic".to_string()],
            toggle_classes: vec![
                "android.widget.Switch".to_string(),
                "androidx.appcompat.widget.SwitchCompat".to_string(),
            ],
        }
    }
}

impl DisableAutoProfile {
    pub fn selector(&self) -> Selector {
        Selector::And(vec![
            Selector::TextContains(self.keywords.clone()),
            Selector::ClassIn(self.toggle_classes.clone()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeZoneListProfile {
    /// Tried group by group; inside a group, keyword by keyword
    pub keyword_groups: Vec<Vec<String>>,
}

impl Default for TimeZoneListProfile {
    fn default() -> Self {
        Self {
            keyword_groups: vec![
                vec![
                    "часовой пояс".to_string(),
                    "часовые пояса".to_string(),
                    "time zone".to_string(),
                ],
                vec!["регион".to_string(), "region".to_string()],
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFieldProfile {
    /// Matches the zone picker's editable search field
    pub selector: Selector,
}

impl Default for SearchFieldProfile {
    fn default() -> Self {
        Self {
            selector: Selector::Or(vec![
                Selector::ClassIn(vec!["android.widget.EditText".to_string()]),
                Selector::ClassContains(vec!["EditText".to_string(), "SemEditText".to_string()]),
                Selector::ViewIdIn(vec!["android:id/search_src_text".to_string()]),
                Selector::ViewIdContains(vec!["search".to_string(), "edit".to_string()]),
                Selector::And(vec![
                    Selector::Editable(true),
                    Selector::ClassContains(vec!["Text".to_string()]),
                ]),
            ]),
        }
    }
}

impl SearchFieldProfile {
    /// The field after focus moved into it
    pub fn focused_selector(&self) -> Selector {
        Selector::And(vec![Selector::Focused(true), Selector::Editable(true)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchAffordanceProfile {
    /// Description or text of the search icon
    pub keywords: Vec<String>,
}

impl Default for SearchAffordanceProfile {
    fn default() -> Self {
        Self {
            keywords: vec!["поиск".to_string(), "search".to_string()],
        }
    }
}

impl SearchAffordanceProfile {
    pub fn selector(&self) -> Selector {
        Selector::TextContains(self.keywords.clone())
    }
}

impl AutomationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AutomationError> {
        let config: AutomationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading automation config");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, AutomationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), AutomationError> {
        if self.settings_packages.iter().all(|p| p.trim().is_empty()) {
            return Err(AutomationError::Config(
                "settings_packages must name at least one package prefix".to_string(),
            ));
        }
        if self.timing.disable_attempt_threshold == 0 {
            return Err(AutomationError::Config(
                "timing.disable_attempt_threshold must be at least 1".to_string(),
            ));
        }
        if self.time_zone_list.keyword_groups.iter().all(Vec::is_empty) {
            return Err(AutomationError::Config(
                "time_zone_list.keyword_groups has no keywords".to_string(),
            ));
        }
        if !self.search_field.selector.is_valid() {
            return Err(AutomationError::Config(format!(
                "search_field.selector is invalid: {}",
                self.search_field.selector
            )));
        }
        if self.entry_points.is_empty() {
            return Err(AutomationError::Config(
                "entry_points must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `package` belongs to one of the settings-app families
    pub fn is_settings_package(&self, package: &str) -> bool {
        self.settings_packages
            .iter()
            .any(|prefix| !prefix.is_empty() && package.starts_with(prefix.as_str()))
    }
}
