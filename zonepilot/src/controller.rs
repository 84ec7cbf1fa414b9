//! Event-driven orchestration of the stage handlers
//!
//! Every UI-change event goes through the same gate: no request means no
//! work, leaving the settings app drops the request silently, an expired
//! request is dropped with a failure notice, and only then does the current
//! stage's handler see the tree.

use crate::config::AutomationConfig;
use crate::element::Node;
use crate::errors::AutomationError;
use crate::notification::{Notification, Notifier};
use crate::platforms::AccessibilityEngine;
use crate::request::{AutomationRequest, AutomationRequestStore, RequestId, Stage};
use crate::stages::{self, StageContext, StageOutcome, StageReport};
use crate::timeout::TimeoutSupervisor;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, info, instrument, warn};

/// The foreground UI changed
#[derive(Debug, Clone)]
pub struct AutomationEvent {
    /// Package of the app that produced the event
    pub package: String,
    /// Root of the new tree, if the window could be read
    pub root: Option<Node>,
}

impl AutomationEvent {
    pub fn new(package: impl Into<String>, root: Option<Node>) -> Self {
        Self {
            package: package.into(),
            root,
        }
    }
}

/// What one event (or one deferred re-check) did to the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    /// No request was active
    Idle,
    /// The event came from outside the settings app; request dropped silently
    Abandoned,
    /// The request outlived its timeout; dropped with a failure notice
    Expired,
    /// The event carried no tree to look at
    NoTree,
    Advanced { from: Stage, to: Stage },
    Waiting { stage: Stage },
    /// Search query entered; request cleared
    Completed,
    /// Follow-up work was scheduled after `delay_ms`
    Scheduled { stage: Stage, delay_ms: u64 },
    /// The request was replaced or cleared while this event was handled
    Stale,
}

impl EventOutcome {
    /// The terminal failure this outcome stands for, if any
    pub fn into_error(self) -> Option<AutomationError> {
        match self {
            EventOutcome::Expired => Some(AutomationError::ExpiredRequest(
                "request outlived its timeout".to_string(),
            )),
            EventOutcome::Abandoned => Some(AutomationError::AbandonedNavigation(
                "left the settings app".to_string(),
            )),
            _ => None,
        }
    }
}

/// Drives the active request forward from UI-change events
#[derive(Clone)]
pub struct AutomationController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    store: Arc<AutomationRequestStore>,
    engine: Arc<dyn AccessibilityEngine>,
    notifier: Arc<dyn Notifier>,
    config: Arc<AutomationConfig>,
    supervisor: TimeoutSupervisor,
    runtime: Handle,
}

impl AutomationController {
    /// Deferred re-checks are spawned on `runtime`
    pub fn new(
        store: Arc<AutomationRequestStore>,
        engine: Arc<dyn AccessibilityEngine>,
        notifier: Arc<dyn Notifier>,
        config: Arc<AutomationConfig>,
        runtime: Handle,
    ) -> Self {
        let supervisor = TimeoutSupervisor::new(&config.timing);
        Self {
            inner: Arc::new(ControllerInner {
                store,
                engine,
                notifier,
                config,
                supervisor,
                runtime,
            }),
        }
    }

    #[instrument(level = "debug", skip(self, event), fields(package = %event.package))]
    pub fn handle_event(&self, event: AutomationEvent) -> EventOutcome {
        self.inner.handle_event(event)
    }
}

impl ControllerInner {
    fn handle_event(self: &Arc<Self>, event: AutomationEvent) -> EventOutcome {
        let Some(mut request) = self.store.get() else {
            return EventOutcome::Idle;
        };

        if !self.config.is_settings_package(&event.package) {
            if self.store.finish(request.id()) {
                info!(request = %request.id(), package = %event.package, "User left settings, dropping request");
            }
            return EventOutcome::Abandoned;
        }

        let now = self.store.clock().now();
        if self.supervisor.is_expired(&request, now) {
            self.expire(&request);
            return EventOutcome::Expired;
        }

        let Some(root) = event.root else {
            debug!(request = %request.id(), "Event without a tree");
            return EventOutcome::NoTree;
        };

        let ctx = self.context(now);
        let report = stages::handle_stage(&mut request, &root, &ctx);
        self.apply(request, report)
    }

    fn context(&self, now: Instant) -> StageContext<'_> {
        StageContext {
            config: &self.config,
            supervisor: &self.supervisor,
            now,
        }
    }

    fn expire(&self, request: &AutomationRequest) {
        if self.store.finish(request.id()) {
            warn!(request = %request.id(), stage = %request.stage(), "Automation request expired");
            self.notifier.notify(Notification::AutomationFailed);
        }
    }

    /// Write the handler's result back and emit its notices, unless the
    /// request stopped being the active one in the meantime.
    fn apply(self: &Arc<Self>, request: AutomationRequest, report: StageReport) -> EventOutcome {
        let id = request.id();
        let applied = match report.outcome {
            StageOutcome::Completed => self.store.finish(id),
            _ => self.store.commit(&request),
        };
        if !applied {
            debug!(request = %id, "Request changed while handling, discarding result");
            return EventOutcome::Stale;
        }

        for notice in report.notices {
            self.notifier.notify(notice);
        }

        let stage = request.stage();
        match report.outcome {
            StageOutcome::Completed => {
                info!(request = %id, zone = %request.option().zone_id, "Search query entered, handing over to the user");
                EventOutcome::Completed
            }
            StageOutcome::Advanced { from, to } => EventOutcome::Advanced { from, to },
            StageOutcome::Waiting => EventOutcome::Waiting { stage },
            StageOutcome::FocusRequested => {
                let delay = self.config.timing.focus_recheck_delay();
                self.schedule(id, delay, DeferredCheck::FocusedField);
                EventOutcome::Scheduled {
                    stage,
                    delay_ms: delay.as_millis() as u64,
                }
            }
            StageOutcome::SearchOpened => {
                let delay = self.config.timing.search_retry_delay();
                self.schedule(id, delay, DeferredCheck::SearchField);
                EventOutcome::Scheduled {
                    stage,
                    delay_ms: delay.as_millis() as u64,
                }
            }
        }
    }

    fn schedule(self: &Arc<Self>, id: RequestId, delay: Duration, check: DeferredCheck) {
        debug!(request = %id, ?check, ?delay, "Scheduling deferred check");
        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            inner.run_deferred(id, check);
        });
    }

    /// Deferred checks never trust what they closed over: the slot is re-read
    /// and the tree comes from the live window.
    fn run_deferred(self: &Arc<Self>, id: RequestId, check: DeferredCheck) -> EventOutcome {
        let Some(mut request) = self.store.get().filter(|r| r.id() == id) else {
            debug!(request = %id, ?check, "Request gone before deferred check fired");
            return EventOutcome::Stale;
        };
        let now = self.store.clock().now();
        if self.supervisor.is_expired(&request, now) {
            self.expire(&request);
            return EventOutcome::Expired;
        }
        if request.stage() != Stage::EnterSearch {
            return EventOutcome::Stale;
        }
        let Some(root) = self.engine.active_root() else {
            debug!(request = %id, ?check, "No active window for deferred check");
            return EventOutcome::NoTree;
        };

        let ctx = self.context(now);
        match check {
            DeferredCheck::FocusedField => match stages::type_into_focused_field(&request, &root, &ctx) {
                Some(report) => self.apply(request, report),
                None => {
                    debug!(request = %id, "No focused search field after delay");
                    EventOutcome::Waiting {
                        stage: request.stage(),
                    }
                }
            },
            DeferredCheck::SearchField => {
                let report = stages::enter_search(&mut request, &root, &ctx);
                self.apply(request, report)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredCheck {
    /// Type into the field we asked to focus
    FocusedField,
    /// Re-run the search-field logic after tapping the search icon
    SearchField,
}
