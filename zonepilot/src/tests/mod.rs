mod controller_tests;
mod deferred_tests;

use crate::platforms::synthetic::SyntheticEngine;
use crate::{
    AutomationConfig, AutomationEvent, EventOutcome, ManualClock, RecordingNotifier,
    SerializableNode, TimeZoneOption, ZonePilot,
};
use std::sync::Arc;

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_test_writer()
        .try_init();
}

pub const SETTINGS: &str = "com.android.settings";

pub struct Harness {
    pub engine: Arc<SyntheticEngine>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub pilot: ZonePilot,
}

impl Harness {
    /// Must run inside a tokio runtime
    pub fn new() -> Self {
        init_tracing();
        let engine = Arc::new(SyntheticEngine::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::new());
        let pilot = ZonePilot::with_config(
            engine.clone(),
            notifier.clone(),
            AutomationConfig::default(),
            clock.clone(),
        )
        .unwrap();
        Self {
            engine,
            notifier,
            clock,
            pilot,
        }
    }

    /// Make `screen` the active window and deliver it as a settings event
    pub fn event(&self, screen: &SerializableNode) -> EventOutcome {
        let root = self.engine.show(screen);
        self.pilot
            .handle_event(AutomationEvent::new(SETTINGS, Some(root)))
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.notifier
            .notifications()
            .iter()
            .map(|n| n.key())
            .collect()
    }
}

pub fn tokyo() -> TimeZoneOption {
    TimeZoneOption::new(9.0, "Asia/Tokyo", "Tokyo", "Tokyo")
}

pub fn kolkata() -> TimeZoneOption {
    TimeZoneOption::new(5.5, "Asia/Kolkata", "Kolkata", "India")
}

/// Date & time screen with the automatic toggle and the time zone row
pub fn date_time_screen(automatic: bool) -> SerializableNode {
    SerializableNode::new("android.widget.FrameLayout").child(
        SerializableNode::new("androidx.recyclerview.widget.RecyclerView")
            .child(
                SerializableNode::new("android.widget.Switch")
                    .text("Automatic")
                    .clickable()
                    .checked(automatic),
            )
            .child(
                SerializableNode::new("android.widget.LinearLayout")
                    .clickable()
                    .child(SerializableNode::new("android.widget.TextView").text("Time zone"))
                    .child(SerializableNode::new("android.widget.TextView").text("GMT+03:00 Moscow")),
            ),
    )
}

/// Zone picker whose search field is already on screen
pub fn picker_screen(focused: bool) -> SerializableNode {
    let mut field = SerializableNode::new("android.widget.EditText")
        .view_id("android:id/search_src_text")
        .editable();
    if focused {
        field = field.focused();
    }
    SerializableNode::new("android.widget.FrameLayout")
        .child(field)
        .child(
            SerializableNode::new("android.widget.ListView")
                .child(SerializableNode::new("android.widget.TextView").text("Europe/London")),
        )
}

/// Zone picker that only shows a search icon in its toolbar
pub fn search_icon_screen() -> SerializableNode {
    SerializableNode::new("android.widget.FrameLayout")
        .child(
            SerializableNode::new("android.widget.ImageButton")
                .description("Search")
                .clickable(),
        )
        .child(
            SerializableNode::new("android.widget.ListView")
                .child(SerializableNode::new("android.widget.TextView").text("Europe/London")),
        )
}

pub fn blank_screen() -> SerializableNode {
    SerializableNode::new("android.widget.FrameLayout")
        .child(SerializableNode::new("android.widget.ProgressBar"))
}

/// Submit and walk a request up to the search stage
pub fn reach_search_stage(h: &Harness, option: TimeZoneOption) {
    h.pilot.submit(option).unwrap();
    h.event(&date_time_screen(false));
    h.event(&date_time_screen(false));
    assert_eq!(
        h.pilot.active_request().map(|r| r.stage()),
        Some(crate::Stage::EnterSearch)
    );
}
