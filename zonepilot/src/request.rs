//! The in-flight automation request and its single-slot store

use crate::timeout::Clock;
use crate::timezone::TimeZoneOption;
use crate::utils::lock;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Steps of the automation, strictly forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DisableAuto,
    OpenTimeZoneList,
    EnterSearch,
    /// Never entered by the normal flow: success clears the request instead
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::DisableAuto => "disable_auto",
            Stage::OpenTimeZoneList => "open_time_zone_list",
            Stage::EnterSearch => "enter_search",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct AutomationRequest {
    id: RequestId,
    option: TimeZoneOption,
    stage: Stage,
    created_at: Instant,
    disable_attempts: u32,
    manual_zone_hint_shown: bool,
    manual_disable_hint_shown: bool,
}

impl AutomationRequest {
    pub fn new(option: TimeZoneOption, created_at: Instant) -> Self {
        Self {
            id: RequestId::new(),
            option,
            stage: Stage::DisableAuto,
            created_at,
            disable_attempts: 0,
            manual_zone_hint_shown: false,
            manual_disable_hint_shown: false,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn option(&self) -> &TimeZoneOption {
        &self.option
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    pub fn disable_attempts(&self) -> u32 {
        self.disable_attempts
    }

    pub fn manual_zone_hint_shown(&self) -> bool {
        self.manual_zone_hint_shown
    }

    pub fn manual_disable_hint_shown(&self) -> bool {
        self.manual_disable_hint_shown
    }

    /// Move to a later stage. Returns false, leaving the request untouched,
    /// if `next` is not after the current stage.
    pub fn advance(&mut self, next: Stage) -> bool {
        if next <= self.stage {
            warn!(request = %self.id, from = %self.stage, to = %next, "Refusing to move stage backwards");
            return false;
        }
        debug!(request = %self.id, from = %self.stage, to = %next, "Stage advanced");
        self.stage = next;
        self.disable_attempts = 0;
        true
    }

    pub fn record_disable_attempt(&mut self) -> u32 {
        self.disable_attempts += 1;
        self.disable_attempts
    }

    pub fn mark_manual_zone_hint_shown(&mut self) {
        self.manual_zone_hint_shown = true;
    }

    pub fn mark_manual_disable_hint_shown(&mut self) {
        self.manual_disable_hint_shown = true;
    }
}

/// Holds at most one request
///
/// Handlers work on snapshots returned by [`get`](Self::get) and write them
/// back with [`commit`](Self::commit), which refuses if the slot was cleared
/// or replaced meanwhile. Terminal paths go through [`finish`](Self::finish),
/// so exactly one caller observes the clear.
#[derive(Debug)]
pub struct AutomationRequestStore {
    slot: Mutex<Option<AutomationRequest>>,
    clock: Arc<dyn Clock>,
}

impl AutomationRequestStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(None),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Replace whatever is in the slot with a fresh request
    pub fn submit(&self, option: TimeZoneOption) -> AutomationRequest {
        let request = AutomationRequest::new(option, self.clock.now());
        let previous = lock(&self.slot).replace(request.clone());
        if let Some(previous) = previous {
            debug!(replaced = %previous.id, request = %request.id, "Replaced pending request");
        }
        request
    }

    pub fn get(&self) -> Option<AutomationRequest> {
        lock(&self.slot).clone()
    }

    /// Empty the slot. Returns whether a request was present.
    pub fn clear(&self) -> bool {
        lock(&self.slot).take().is_some()
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        lock(&self.slot).as_ref().is_some_and(|r| r.id == id)
    }

    /// Write back a mutated snapshot if it is still the active request
    pub fn commit(&self, request: &AutomationRequest) -> bool {
        let mut slot = lock(&self.slot);
        match slot.as_mut() {
            Some(current) if current.id == request.id => {
                *current = request.clone();
                true
            }
            _ => false,
        }
    }

    /// Clear the slot if it still holds `id`. Returns true for the one caller that cleared it.
    pub fn finish(&self, id: RequestId) -> bool {
        let mut slot = lock(&self.slot);
        if slot.as_ref().is_some_and(|r| r.id == id) {
            *slot = None;
            true
        } else {
            false
        }
    }
}
