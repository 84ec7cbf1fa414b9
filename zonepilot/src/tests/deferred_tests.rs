use super::*;
use crate::platforms::synthetic::ActionKind;
use crate::Stage;
use std::time::Duration;

fn set_text_count(h: &Harness) -> usize {
    h.engine
        .actions()
        .iter()
        .filter(|a| matches!(a.action, ActionKind::SetText(_)))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_focus_then_type_after_delay() {
    let h = Harness::new();
    reach_search_stage(&h, tokyo());

    assert_eq!(
        h.event(&picker_screen(false)),
        EventOutcome::Scheduled {
            stage: Stage::EnterSearch,
            delay_ms: 200
        }
    );
    assert_eq!(h.engine.actions().last().unwrap().action, ActionKind::Focus);
    // Still pending until the re-check runs
    assert!(h.pilot.active_request().is_some());

    // Focus landed by the time the re-check reads the live window
    h.engine.show(&picker_screen(true));
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(
        h.engine.actions().last().unwrap().action,
        ActionKind::SetText("Tokyo".to_string())
    );
    assert!(h.pilot.active_request().is_none());
    assert_eq!(h.notifier.count("select_result"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_focus_recheck_does_not_fire_early() {
    let h = Harness::new();
    reach_search_stage(&h, tokyo());
    h.event(&picker_screen(false));
    h.engine.show(&picker_screen(true));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(set_text_count(&h), 0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(set_text_count(&h), 1);
}

#[tokio::test(start_paused = true)]
async fn test_replaced_request_makes_recheck_a_no_op() {
    let h = Harness::new();
    reach_search_stage(&h, tokyo());
    h.event(&picker_screen(false));

    h.pilot.submit(kolkata()).unwrap();
    h.engine.show(&picker_screen(true));
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(set_text_count(&h), 0);
    assert_eq!(h.notifier.count("select_result"), 0);
    let request = h.pilot.active_request().unwrap();
    assert_eq!(request.option().zone_id, "Asia/Kolkata");
    assert_eq!(request.stage(), Stage::DisableAuto);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_request_makes_recheck_a_no_op() {
    let h = Harness::new();
    reach_search_stage(&h, tokyo());
    h.event(&picker_screen(false));
    h.pilot.cancel();

    h.engine.show(&picker_screen(true));
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(set_text_count(&h), 0);
    assert_eq!(h.notifier.count("select_result"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_recheck_without_focused_field_keeps_waiting() {
    let h = Harness::new();
    reach_search_stage(&h, tokyo());
    h.event(&picker_screen(false));

    // Focus never moved
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(set_text_count(&h), 0);
    assert_eq!(h.pilot.active_request().unwrap().stage(), Stage::EnterSearch);

    // A later event still completes the request
    assert_eq!(h.event(&picker_screen(true)), EventOutcome::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_recheck_after_expiry_fails_request() {
    let h = Harness::new();
    reach_search_stage(&h, tokyo());
    h.event(&picker_screen(false));

    h.clock.advance(Duration::from_millis(15_001));
    h.engine.show(&picker_screen(true));
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(set_text_count(&h), 0);
    assert!(h.pilot.active_request().is_none());
    assert_eq!(h.notifier.count("automation_failed"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_search_icon_then_retry_types_query() {
    let h = Harness::new();
    reach_search_stage(&h, tokyo());

    assert_eq!(
        h.event(&search_icon_screen()),
        EventOutcome::Scheduled {
            stage: Stage::EnterSearch,
            delay_ms: 300
        }
    );
    let click = h.engine.actions().last().unwrap().clone();
    assert_eq!(click.target, "Search");
    assert_eq!(click.action, ActionKind::Click);
    assert!(h.pilot.active_request().is_some());

    h.engine.show(&picker_screen(true));
    tokio::time::sleep(Duration::from_millis(350)).await;

    assert_eq!(set_text_count(&h), 1);
    assert!(h.pilot.active_request().is_none());
    assert_eq!(h.notifier.count("select_result"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_search_retry_chains_into_focus_recheck() {
    let h = Harness::new();
    reach_search_stage(&h, tokyo());
    h.event(&search_icon_screen());

    // The field appeared but is not focused yet
    h.engine.show(&picker_screen(false));
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(h.engine.actions().last().unwrap().action, ActionKind::Focus);
    assert!(h.pilot.active_request().is_some());

    h.engine.show(&picker_screen(true));
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(set_text_count(&h), 1);
    assert!(h.pilot.active_request().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_icon_click_schedules_nothing() {
    let h = Harness::new();
    reach_search_stage(&h, tokyo());
    h.engine.fail_actions(true);
    assert_eq!(
        h.event(&search_icon_screen()),
        EventOutcome::Waiting {
            stage: Stage::EnterSearch
        }
    );
    h.engine.fail_actions(false);
    h.engine.show(&picker_screen(true));
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(set_text_count(&h), 0);
    assert!(h.pilot.active_request().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_completion_notice_emitted_once_with_racing_event() {
    let h = Harness::new();
    reach_search_stage(&h, tokyo());
    h.event(&picker_screen(false));

    // An event completes the request before the re-check fires
    assert_eq!(h.event(&picker_screen(true)), EventOutcome::Completed);
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(set_text_count(&h), 1);
    assert_eq!(h.notifier.count("select_result"), 1);
}
