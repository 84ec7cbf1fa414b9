//! Per-stage navigation logic
//!
//! Handlers look at one tree snapshot, perform at most a couple of node
//! actions, and mutate the request snapshot they were given. They never touch
//! the store and never emit notices themselves: the controller applies the
//! returned [`StageReport`] only if the request is still the active one.

use crate::config::AutomationConfig;
use crate::element::Node;
use crate::notification::Notification;
use crate::request::{AutomationRequest, Stage};
use crate::selector::Selector;
use crate::timeout::TimeoutSupervisor;
use crate::timezone::{format_offset, TimeZoneOption};
use crate::tree_search::{find_first_matching, nearest_clickable_ancestor};
use std::time::Instant;
use tracing::debug;

/// Shared inputs of one handler invocation
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub config: &'a AutomationConfig,
    pub supervisor: &'a TimeoutSupervisor,
    pub now: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Advanced { from: Stage, to: Stage },
    /// Nothing actionable in this tree; stay and wait for the next event
    Waiting,
    /// The search query is in the field. Terminal success.
    Completed,
    /// Focus was requested on the search field; type into it after a delay.
    ///
    /// The request stays in the store until the delayed check runs. That check
    /// only types into a request that is still current, so clearing the slot
    /// here would leave it nothing to act on. It emits the hint and finishes
    /// the request itself.
    FocusRequested,
    /// The search icon was tapped; look for the field again after a delay
    SearchOpened,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub outcome: StageOutcome,
    pub notices: Vec<Notification>,
}

impl StageReport {
    fn waiting() -> Self {
        Self {
            outcome: StageOutcome::Waiting,
            notices: Vec::new(),
        }
    }

    fn waiting_with(notice: Notification) -> Self {
        Self {
            outcome: StageOutcome::Waiting,
            notices: vec![notice],
        }
    }

    fn advanced(request: &mut AutomationRequest, to: Stage, notice: Notification) -> Self {
        let from = request.stage();
        if request.advance(to) {
            Self {
                outcome: StageOutcome::Advanced { from, to },
                notices: vec![notice],
            }
        } else {
            Self::waiting()
        }
    }

    fn completed(option: &TimeZoneOption) -> Self {
        Self {
            outcome: StageOutcome::Completed,
            notices: vec![select_result_hint(option)],
        }
    }

    fn pending(outcome: StageOutcome) -> Self {
        Self {
            outcome,
            notices: Vec::new(),
        }
    }
}

/// The parameterized hint shown once the search query is in place
pub fn select_result_hint(option: &TimeZoneOption) -> Notification {
    Notification::SelectResult {
        city: option.city_name.clone(),
        offset: format_offset(option.offset_hours),
    }
}

/// Run the handler for the request's current stage
pub fn handle_stage(request: &mut AutomationRequest, root: &Node, ctx: &StageContext<'_>) -> StageReport {
    match request.stage() {
        Stage::DisableAuto => disable_auto(request, root, ctx),
        Stage::OpenTimeZoneList => open_time_zone_list(request, root, ctx),
        Stage::EnterSearch => enter_search(request, root, ctx),
        Stage::Done => StageReport::waiting(),
    }
}

fn disable_auto(request: &mut AutomationRequest, root: &Node, ctx: &StageContext<'_>) -> StageReport {
    let toggle = root.locator(ctx.config.disable_auto.selector()).first();
    match toggle {
        Ok(toggle) if toggle.attributes().checkable && toggle.is_checked() => {
            match toggle.click() {
                Ok(()) => {
                    return StageReport::advanced(
                        request,
                        Stage::OpenTimeZoneList,
                        Notification::DisabledAutomatically,
                    );
                }
                // A failed toggle counts as a miss
                Err(e) => debug!(request = %request.id(), "Toggle click failed: {}", e),
            }
        }
        Ok(_) => {
            return StageReport::advanced(
                request,
                Stage::OpenTimeZoneList,
                Notification::AlreadyDisabled,
            );
        }
        Err(e) => debug!(request = %request.id(), "{}", e),
    }

    let attempts = request.record_disable_attempt();
    if ctx.supervisor.should_show_manual_disable_hint(request) {
        request.mark_manual_disable_hint_shown();
        debug!(request = %request.id(), attempts, "Giving up on the toggle, moving on");
        return StageReport::advanced(
            request,
            Stage::OpenTimeZoneList,
            Notification::VerifyManualToggle,
        );
    }
    debug!(request = %request.id(), attempts, "Automatic time zone toggle not found");
    StageReport::waiting()
}

fn open_time_zone_list(request: &mut AutomationRequest, root: &Node, ctx: &StageContext<'_>) -> StageReport {
    for group in &ctx.config.time_zone_list.keyword_groups {
        // First keyword of the group with any match decides the group
        let target = group
            .iter()
            .find_map(|keyword| find_first_matching(root, &Selector::text_contains([keyword.as_str()])));
        let Some(target) = target else {
            continue;
        };
        let clicked = nearest_clickable_ancestor(&target)
            .map(|clickable| clickable.click())
            .transpose();
        match clicked {
            Ok(Some(())) => {
                return StageReport::advanced(request, Stage::EnterSearch, Notification::OpenedTimeZone);
            }
            Ok(None) => debug!(
                request = %request.id(),
                label = ?target.attributes().label(),
                "Matched row has no clickable ancestor"
            ),
            Err(e) => debug!(request = %request.id(), "Row click failed: {}", e),
        }
    }

    if ctx.supervisor.should_show_manual_zone_hint(request, ctx.now) {
        request.mark_manual_zone_hint_shown();
        return StageReport::waiting_with(Notification::OpenedManually);
    }
    StageReport::waiting()
}

/// Search-field logic, also re-run by the deferred retry after tapping the search icon
pub fn enter_search(request: &mut AutomationRequest, root: &Node, ctx: &StageContext<'_>) -> StageReport {
    let query = request.option().search_query.clone();
    match root.locator(ctx.config.search_field.selector.clone()).first() {
        Ok(field) if field.is_focused() => match field.set_text(&query) {
            Ok(()) => StageReport::completed(request.option()),
            Err(e) => {
                debug!(request = %request.id(), "Setting search text failed: {}", e);
                StageReport::waiting()
            }
        },
        Ok(field) => match field.focus() {
            Ok(()) => StageReport::pending(StageOutcome::FocusRequested),
            Err(e) => {
                debug!(request = %request.id(), "Focusing search field failed: {}", e);
                StageReport::waiting()
            }
        },
        Err(_) => open_search(request, root, ctx),
    }
}

fn open_search(request: &AutomationRequest, root: &Node, ctx: &StageContext<'_>) -> StageReport {
    let clicked = find_first_matching(root, &ctx.config.search_affordance.selector())
        .and_then(|icon| nearest_clickable_ancestor(&icon))
        .map(|clickable| clickable.click());
    match clicked {
        Some(Ok(())) => StageReport::pending(StageOutcome::SearchOpened),
        Some(Err(e)) => {
            debug!(request = %request.id(), "Search icon click failed: {}", e);
            StageReport::waiting()
        }
        None => {
            debug!(request = %request.id(), "No search field or search icon in this tree");
            StageReport::waiting()
        }
    }
}

/// Type the search query into whichever editable field now has focus.
///
/// Returns the completion report, or `None` if no focused field accepted the text.
pub fn type_into_focused_field(
    request: &AutomationRequest,
    root: &Node,
    ctx: &StageContext<'_>,
) -> Option<StageReport> {
    let field = find_first_matching(root, &ctx.config.search_field.focused_selector())?;
    match field.set_text(&request.option().search_query) {
        Ok(()) => Some(StageReport::completed(request.option())),
        Err(e) => {
            debug!(request = %request.id(), "Setting search text failed: {}", e);
            None
        }
    }
}
