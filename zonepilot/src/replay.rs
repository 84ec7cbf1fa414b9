//! Replays recorded UI-change events against the synthetic engine
//!
//! A script names the zone to automate and lists the windows the settings app
//! showed, each delivered after a delay. The result captures every event
//! outcome, notice and node action, which is how new vendor tree shapes are
//! checked before they reach a device.

use crate::config::AutomationConfig;
use crate::controller::{AutomationEvent, EventOutcome};
use crate::element::SerializableNode;
use crate::launch::EntryPoint;
use crate::notification::{Notification, RecordingNotifier};
use crate::platforms::synthetic::{PerformedAction, SyntheticEngine};
use crate::request::Stage;
use crate::timeout::TokioClock;
use crate::timezone::TimeZoneOption;
use crate::{AutomationError, ZonePilot};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Zone to automate: a built-in zone id or a full option
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoneChoice {
    Id(String),
    Option(TimeZoneOption),
}

impl ZoneChoice {
    pub fn resolve(&self) -> Result<TimeZoneOption, AutomationError> {
        match self {
            ZoneChoice::Id(zone_id) => TimeZoneOption::find(zone_id).ok_or_else(|| {
                AutomationError::InvalidArgument(format!("Unknown zone id: {zone_id}"))
            }),
            ZoneChoice::Option(option) => Ok(option.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayEvent {
    /// Delay since the previous event
    #[serde(default)]
    pub after_ms: u64,
    pub package: String,
    /// The window as seen by the event; `None` replays an event without a tree
    #[serde(default)]
    pub window: Option<SerializableNode>,
    /// When false the window only becomes the active one, with no event
    /// delivered. Deferred checks read it from there.
    #[serde(default = "default_deliver")]
    pub deliver: bool,
}

fn default_deliver() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    pub zone: ZoneChoice,
    /// Overrides the default configuration
    #[serde(default)]
    pub config: Option<AutomationConfig>,
    /// Entry points that fail to launch
    #[serde(default)]
    pub rejected_launches: Vec<EntryPoint>,
    pub events: Vec<ReplayEvent>,
    /// How long to wait after the last event for deferred checks
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_settle_ms() -> u64 {
    500
}

impl ReplayScript {
    pub fn from_json_str(json: &str) -> Result<Self, AutomationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayStep {
    /// Script time at which the event was delivered
    pub at_ms: u64,
    pub package: String,
    pub outcome: EventOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub zone_id: String,
    /// `None` when no entry point launched
    pub entry_point: Option<EntryPoint>,
    pub steps: Vec<ReplayStep>,
    pub notifications: Vec<Notification>,
    pub actions: Vec<PerformedAction>,
    /// Stage of the request still active at the end, if any
    pub pending_stage: Option<Stage>,
}

impl ReplayReport {
    /// The search query made it into a field
    pub fn completed(&self) -> bool {
        self.notifications
            .iter()
            .any(|n| matches!(n, Notification::SelectResult { .. }))
    }

    /// Why the request ended early, if an event ended it
    pub fn failure(&self) -> Option<AutomationError> {
        self.steps.iter().find_map(|step| step.outcome.into_error())
    }
}

/// Run the script on the current tokio runtime.
///
/// Request ages are read from tokio's clock, so deferred checks that fire
/// while the replay sleeps see the same time the events do.
#[instrument(skip(script), fields(events = script.events.len()))]
pub async fn run(script: &ReplayScript) -> Result<ReplayReport, AutomationError> {
    let option = script.zone.resolve()?;
    let config = script.config.clone().unwrap_or_default();
    let engine = Arc::new(SyntheticEngine::new());
    for entry in &script.rejected_launches {
        engine.reject_launch(entry.clone());
    }
    let notifier = Arc::new(RecordingNotifier::new());
    let pilot = ZonePilot::with_config(engine.clone(), notifier.clone(), config, Arc::new(TokioClock))?;

    let zone_id = option.zone_id.clone();
    let entry_point = match pilot.submit(option) {
        Ok(entry) => Some(entry),
        Err(e) => {
            info!("Replay stopped before the first event: {}", e);
            None
        }
    };

    let mut steps = Vec::new();
    let mut elapsed_ms = 0;
    if entry_point.is_some() {
        for event in &script.events {
            wait(event.after_ms).await;
            elapsed_ms += event.after_ms;

            let root = match &event.window {
                Some(window) => Some(engine.show(window)),
                None => {
                    engine.hide();
                    None
                }
            };
            if !event.deliver {
                debug!(at_ms = elapsed_ms, "Window changed without an event");
                continue;
            }
            let outcome = pilot.handle_event(AutomationEvent::new(event.package.clone(), root));
            debug!(at_ms = elapsed_ms, ?outcome, "Replayed event");
            steps.push(ReplayStep {
                at_ms: elapsed_ms,
                package: event.package.clone(),
                outcome,
            });
        }
        wait(script.settle_ms).await;
    }

    Ok(ReplayReport {
        zone_id,
        entry_point,
        steps,
        notifications: notifier.notifications(),
        actions: engine.actions(),
        pending_stage: pilot.active_request().map(|r| r.stage()),
    })
}

async fn wait(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
