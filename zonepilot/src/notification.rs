//! User-visible notices emitted while automation runs
//!
//! Each notice has a stable key so a host can map it to a localized string;
//! the `Display` text is the English fallback.

use crate::utils::lock;
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "key", rename_all = "snake_case")]
pub enum Notification {
    /// A request was submitted and the settings app is being opened
    AutomationRunning,
    /// No entry point into the settings app could be launched
    OpenSettingsFailed,
    DisabledAutomatically,
    AlreadyDisabled,
    /// One-shot: the automatic-timezone toggle was not found, check it by hand
    VerifyManualToggle,
    OpenedTimeZone,
    /// One-shot: the zone list did not open by itself, open it by hand
    OpenedManually,
    /// The search query is in place; the user picks the result
    SelectResult { city: String, offset: String },
    /// The request expired before completing
    AutomationFailed,
}

impl Notification {
    pub fn key(&self) -> &'static str {
        match self {
            Notification::AutomationRunning => "automation_running",
            Notification::OpenSettingsFailed => "open_settings_failed",
            Notification::DisabledAutomatically => "disabled_automatically",
            Notification::AlreadyDisabled => "already_disabled",
            Notification::VerifyManualToggle => "verify_manual_toggle",
            Notification::OpenedTimeZone => "opened_time_zone",
            Notification::OpenedManually => "opened_manually",
            Notification::SelectResult { .. } => "select_result",
            Notification::AutomationFailed => "automation_failed",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::AutomationRunning => {
                write!(f, "Opening date & time settings to change the time zone")
            }
            Notification::OpenSettingsFailed => write!(f, "Could not open date & time settings"),
            Notification::DisabledAutomatically => {
                write!(f, "Automatic time zone turned off")
            }
            Notification::AlreadyDisabled => write!(f, "Automatic time zone is already off"),
            Notification::VerifyManualToggle => write!(
                f,
                "Make sure automatic time zone is turned off, then continue"
            ),
            Notification::OpenedTimeZone => write!(f, "Opened the time zone list"),
            Notification::OpenedManually => write!(f, "Open the time zone list manually"),
            Notification::SelectResult { city, offset } => {
                write!(f, "Select \"{city}\" (UTC{offset}) in the results")
            }
            Notification::AutomationFailed => write!(
                f,
                "Could not finish automatically. Change the time zone manually"
            ),
        }
    }
}

/// Sink for notices
///
/// Implementations own any thread affinity: on a device `notify` posts to the
/// main looper before showing anything.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Logs every notice through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        info!(key = notification.key(), "{}", notification);
    }
}

/// Keeps every notice in order, for tests and replays
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.received).clone()
    }

    /// Drain everything received so far
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *lock(&self.received))
    }

    pub fn count(&self, key: &str) -> usize {
        lock(&self.received)
            .iter()
            .filter(|n| n.key() == key)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        info!(key = notification.key(), "{}", notification);
        lock(&self.received).push(notification);
    }
}
