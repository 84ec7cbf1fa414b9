use super::*;
use crate::platforms::synthetic::ActionKind;
use crate::{AutomationError, EntryPoint, Notification, Stage};
use std::time::Duration;

#[tokio::test]
async fn test_event_without_request_is_idle() {
    let h = Harness::new();
    assert_eq!(h.event(&date_time_screen(true)), EventOutcome::Idle);
    assert!(h.engine.actions().is_empty());
    assert!(h.notifier.notifications().is_empty());
}

#[tokio::test]
async fn test_submit_opens_first_entry_point() {
    let h = Harness::new();
    let entry = h.pilot.submit(tokyo()).unwrap();
    assert_eq!(
        entry,
        EntryPoint::component(
            "com.android.settings",
            "com.android.settings.datetime.timezone.TimeZoneSettingsActivity"
        )
    );
    assert_eq!(h.keys(), vec!["automation_running"]);
    assert_eq!(h.engine.launch_attempts().len(), 1);
    assert_eq!(h.pilot.active_request().unwrap().stage(), Stage::DisableAuto);
}

#[tokio::test]
async fn test_submit_falls_back_to_next_entry_point() {
    let h = Harness::new();
    let first = h.pilot.config().entry_points[0].clone();
    let second = h.pilot.config().entry_points[1].clone();
    h.engine.reject_launch(first);
    assert_eq!(h.pilot.submit(tokyo()).unwrap(), second);
    assert!(h.pilot.active_request().is_some());
}

#[tokio::test]
async fn test_launch_failure_withdraws_request() {
    let h = Harness::new();
    h.engine.reject_all_launches(true);
    let err = h.pilot.submit(tokyo()).unwrap_err();
    assert!(matches!(err, AutomationError::LaunchFailure(_)));
    assert!(h.pilot.active_request().is_none());
    assert_eq!(h.keys(), vec!["automation_running", "open_settings_failed"]);
    assert_eq!(h.engine.launch_attempts().len(), h.pilot.config().entry_points.len());
}

#[tokio::test]
async fn test_checked_toggle_is_clicked() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    let outcome = h.event(&date_time_screen(true));
    assert_eq!(
        outcome,
        EventOutcome::Advanced {
            from: Stage::DisableAuto,
            to: Stage::OpenTimeZoneList
        }
    );
    let actions = h.engine.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].target, "Automatic");
    assert_eq!(actions[0].action, ActionKind::Click);
    assert_eq!(h.notifier.count("disabled_automatically"), 1);
}

#[tokio::test]
async fn test_unchecked_toggle_advances_without_click() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    h.event(&date_time_screen(false));
    assert!(h.engine.actions().is_empty());
    assert_eq!(h.notifier.count("already_disabled"), 1);
    assert_eq!(h.pilot.active_request().unwrap().stage(), Stage::OpenTimeZoneList);
}

#[tokio::test]
async fn test_full_cooperative_sequence() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();

    h.event(&date_time_screen(true));
    let outcome = h.event(&date_time_screen(false));
    assert_eq!(
        outcome,
        EventOutcome::Advanced {
            from: Stage::OpenTimeZoneList,
            to: Stage::EnterSearch
        }
    );
    // The row, not its label, receives the click
    assert_eq!(h.engine.actions()[1].target, "android.widget.LinearLayout");

    assert_eq!(h.event(&picker_screen(true)), EventOutcome::Completed);
    assert!(h.pilot.active_request().is_none());
    assert_eq!(
        h.engine.actions().last().unwrap().action,
        ActionKind::SetText("Tokyo".to_string())
    );
    assert_eq!(
        h.keys(),
        vec![
            "automation_running",
            "disabled_automatically",
            "opened_time_zone",
            "select_result"
        ]
    );
    assert_eq!(
        h.notifier.notifications().last(),
        Some(&Notification::SelectResult {
            city: "Tokyo".to_string(),
            offset: "+09:00".to_string()
        })
    );

    // Nothing left to drive
    assert_eq!(h.event(&picker_screen(true)), EventOutcome::Idle);
}

#[tokio::test]
async fn test_three_misses_show_manual_toggle_hint_once() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();

    for expected_attempts in 1..=2 {
        assert_eq!(
            h.event(&blank_screen()),
            EventOutcome::Waiting {
                stage: Stage::DisableAuto
            }
        );
        assert_eq!(
            h.pilot.active_request().unwrap().disable_attempts(),
            expected_attempts
        );
    }
    assert_eq!(
        h.event(&blank_screen()),
        EventOutcome::Advanced {
            from: Stage::DisableAuto,
            to: Stage::OpenTimeZoneList
        }
    );
    let request = h.pilot.active_request().unwrap();
    assert!(request.manual_disable_hint_shown());
    assert_eq!(request.disable_attempts(), 0);

    h.event(&blank_screen());
    assert_eq!(h.notifier.count("verify_manual_toggle"), 1);
}

#[tokio::test]
async fn test_failed_toggle_click_counts_as_miss() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    h.engine.fail_actions(true);
    assert_eq!(
        h.event(&date_time_screen(true)),
        EventOutcome::Waiting {
            stage: Stage::DisableAuto
        }
    );
    assert_eq!(h.pilot.active_request().unwrap().disable_attempts(), 1);
    assert_eq!(h.notifier.count("disabled_automatically"), 0);
}

#[tokio::test]
async fn test_manual_zone_hint_after_four_seconds_once() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    h.event(&date_time_screen(false));

    h.event(&blank_screen());
    assert_eq!(h.notifier.count("opened_manually"), 0);

    h.clock.advance(Duration::from_millis(4_001));
    assert_eq!(
        h.event(&blank_screen()),
        EventOutcome::Waiting {
            stage: Stage::OpenTimeZoneList
        }
    );
    h.event(&blank_screen());
    assert_eq!(h.notifier.count("opened_manually"), 1);
    assert!(h.pilot.active_request().unwrap().manual_zone_hint_shown());
}

#[tokio::test]
async fn test_region_keyword_group_is_fallback() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    h.event(&date_time_screen(false));

    let screen = SerializableNode::new("android.widget.FrameLayout").child(
        SerializableNode::new("android.widget.LinearLayout")
            .clickable()
            .child(SerializableNode::new("android.widget.TextView").text("Region")),
    );
    assert_eq!(
        h.event(&screen),
        EventOutcome::Advanced {
            from: Stage::OpenTimeZoneList,
            to: Stage::EnterSearch
        }
    );
}

#[tokio::test]
async fn test_expired_request_fails_even_with_matching_tree() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    h.clock.advance(Duration::from_millis(15_001));

    let outcome = h.event(&date_time_screen(true));
    assert_eq!(outcome, EventOutcome::Expired);
    assert!(matches!(outcome.into_error(), Some(AutomationError::ExpiredRequest(_))));
    assert!(h.engine.actions().is_empty());
    assert!(h.pilot.active_request().is_none());
    assert_eq!(h.notifier.count("automation_failed"), 1);

    assert_eq!(h.event(&date_time_screen(true)), EventOutcome::Idle);
    assert_eq!(h.notifier.count("automation_failed"), 1);
}

#[tokio::test]
async fn test_request_at_timeout_boundary_still_runs() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    h.clock.advance(Duration::from_millis(15_000));
    assert_eq!(
        h.event(&date_time_screen(true)),
        EventOutcome::Advanced {
            from: Stage::DisableAuto,
            to: Stage::OpenTimeZoneList
        }
    );
}

#[tokio::test]
async fn test_leaving_settings_abandons_silently() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    let root = h.engine.show(&date_time_screen(true));
    let outcome = h
        .pilot
        .handle_event(AutomationEvent::new("com.google.android.apps.nexuslauncher", Some(root)));
    assert_eq!(outcome, EventOutcome::Abandoned);
    assert!(matches!(outcome.into_error(), Some(AutomationError::AbandonedNavigation(_))));
    assert!(h.pilot.active_request().is_none());
    assert!(h.engine.actions().is_empty());
    assert_eq!(h.keys(), vec!["automation_running"]);
}

#[tokio::test]
async fn test_abandonment_wins_over_expiry() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    h.clock.advance(Duration::from_secs(60));
    let outcome = h
        .pilot
        .handle_event(AutomationEvent::new("com.android.chrome", None));
    assert_eq!(outcome, EventOutcome::Abandoned);
    assert_eq!(h.notifier.count("automation_failed"), 0);
}

#[tokio::test]
async fn test_vendor_settings_package_is_accepted() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    let root = h.engine.show(&date_time_screen(true));
    let outcome = h.pilot.handle_event(AutomationEvent::new(
        "com.samsung.android.settings.datetime",
        Some(root),
    ));
    assert!(matches!(outcome, EventOutcome::Advanced { .. }));
}

#[tokio::test]
async fn test_event_without_tree_keeps_request() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    assert_eq!(
        h.pilot.handle_event(AutomationEvent::new(SETTINGS, None)),
        EventOutcome::NoTree
    );
    assert_eq!(h.pilot.active_request().unwrap().stage(), Stage::DisableAuto);
}

#[tokio::test]
async fn test_resubmit_restarts_from_first_stage() {
    let h = Harness::new();
    reach_search_stage(&h, tokyo());
    h.pilot.submit(kolkata()).unwrap();
    let request = h.pilot.active_request().unwrap();
    assert_eq!(request.stage(), Stage::DisableAuto);
    assert_eq!(request.option().zone_id, "Asia/Kolkata");
}

#[tokio::test]
async fn test_cancel_stops_automation() {
    let h = Harness::new();
    h.pilot.submit(tokyo()).unwrap();
    assert!(h.pilot.cancel());
    assert!(!h.pilot.cancel());
    assert_eq!(h.event(&date_time_screen(true)), EventOutcome::Idle);
}

#[tokio::test]
async fn test_automation_enabled_from_secure_setting() {
    let h = Harness::new();
    assert!(!h.pilot.is_automation_enabled());
    h.engine.set_enabled_services_setting(Some(
        "com.other.app/com.other.app.Service:dev.zonepilot.app/TimeZoneAutomationService",
    ));
    h.engine.set_accessibility_enabled(true);
    assert!(h.pilot.is_automation_enabled());
}
