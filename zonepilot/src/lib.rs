//! Time zone selection through the settings app's accessibility tree
//!
//! The user picks a zone; we open the system settings, switch off automatic
//! time zone, open the zone list and type the zone's search query, then leave
//! the final tap to the user. Progress is driven entirely by UI-change events
//! fed to [`ZonePilot::handle_event`].

use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{info, instrument, warn};

pub mod config;
pub mod controller;
pub mod element;
pub mod errors;
pub mod launch;
pub mod locator;
pub mod notification;
pub mod platforms;
pub mod replay;
pub mod request;
pub mod selector;
pub mod service;
pub mod stages;
#[cfg(test)]
mod tests;
pub mod timeout;
pub mod timezone;
pub mod tree_search;
pub(crate) mod utils;

pub use config::{AutomationConfig, DEFAULT_CONFIG};
pub use controller::{AutomationController, AutomationEvent, EventOutcome};
pub use element::{Node, NodeAttributes, NodeImpl, SerializableNode};
pub use errors::AutomationError;
pub use launch::{EntryPoint, LaunchStrategy};
pub use locator::Locator;
pub use notification::{Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use platforms::AccessibilityEngine;
pub use request::{AutomationRequest, AutomationRequestStore, RequestId, Stage};
pub use selector::Selector;
pub use service::ServiceComponent;
pub use timeout::{Clock, ManualClock, SystemClock, TimeoutSupervisor, TokioClock};
pub use timezone::{format_offset, TimeZoneOption};

/// The main entry point for time zone automation
///
/// Owns the single request slot and wires the launch strategy, the
/// controller and the notifier to one accessibility engine.
pub struct ZonePilot {
    engine: Arc<dyn AccessibilityEngine>,
    notifier: Arc<dyn Notifier>,
    config: Arc<AutomationConfig>,
    store: Arc<AutomationRequestStore>,
    launcher: LaunchStrategy,
    controller: AutomationController,
}

impl ZonePilot {
    /// Default configuration and the system clock.
    ///
    /// Must be called from within a tokio runtime; deferred re-checks are
    /// spawned on it.
    pub fn new(
        engine: Arc<dyn AccessibilityEngine>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AutomationError> {
        Self::with_config(engine, notifier, DEFAULT_CONFIG.clone(), Arc::new(SystemClock))
    }

    #[instrument(level = "debug", skip_all)]
    pub fn with_config(
        engine: Arc<dyn AccessibilityEngine>,
        notifier: Arc<dyn Notifier>,
        config: AutomationConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AutomationError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| {
            AutomationError::PlatformError(format!("No tokio runtime available: {e}"))
        })?;
        let config = Arc::new(config);
        let store = Arc::new(AutomationRequestStore::new(clock));
        let launcher = LaunchStrategy::new(config.entry_points.clone());
        let controller = AutomationController::new(
            Arc::clone(&store),
            Arc::clone(&engine),
            Arc::clone(&notifier),
            Arc::clone(&config),
            runtime,
        );
        Ok(Self {
            engine,
            notifier,
            config,
            store,
            launcher,
            controller,
        })
    }

    /// Start automating `option`, replacing any request in flight.
    ///
    /// Returns the settings entry point that launched. If none did, the
    /// request is withdrawn and `OpenSettingsFailed` is shown.
    #[instrument(skip(self, option), fields(zone = %option.zone_id))]
    pub fn submit(&self, option: TimeZoneOption) -> Result<EntryPoint, AutomationError> {
        let request = self.store.submit(option);
        info!(request = %request.id(), "Time zone automation requested");
        self.notifier.notify(Notification::AutomationRunning);

        match self.launcher.launch(self.engine.as_ref(), request.option()) {
            Ok(entry) => Ok(entry),
            Err(e) => {
                if self.store.finish(request.id()) {
                    warn!(request = %request.id(), "Withdrawing request, settings did not open");
                }
                self.notifier.notify(Notification::OpenSettingsFailed);
                Err(e)
            }
        }
    }

    /// Drop the active request, if any
    pub fn cancel(&self) -> bool {
        self.store.clear()
    }

    pub fn handle_event(&self, event: AutomationEvent) -> EventOutcome {
        self.controller.handle_event(event)
    }

    /// Whether the hosting accessibility service is switched on
    pub fn is_automation_enabled(&self) -> bool {
        service::is_automation_enabled(self.engine.as_ref(), &self.config.service)
    }

    pub fn active_request(&self) -> Option<AutomationRequest> {
        self.store.get()
    }

    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }
}
