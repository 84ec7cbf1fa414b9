use crate::config::TimingConfig;
use crate::request::AutomationRequest;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of "now" for request ages
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Reads tokio's clock, so request ages follow paused or auto-advanced time
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed_ms: AtomicU64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

/// Age-based policy: expiry and when the one-shot hints may show
#[derive(Debug, Clone)]
pub struct TimeoutSupervisor {
    request_timeout: Duration,
    manual_zone_hint_after: Duration,
    disable_attempt_threshold: u32,
}

impl Default for TimeoutSupervisor {
    fn default() -> Self {
        Self::new(&TimingConfig::default())
    }
}

impl TimeoutSupervisor {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            request_timeout: timing.request_timeout(),
            manual_zone_hint_after: timing.manual_zone_hint_after(),
            disable_attempt_threshold: timing.disable_attempt_threshold,
        }
    }

    /// Strictly older than the timeout; a request exactly at the limit is still live.
    pub fn is_expired(&self, request: &AutomationRequest, now: Instant) -> bool {
        request.age(now) > self.request_timeout
    }

    pub fn should_show_manual_zone_hint(&self, request: &AutomationRequest, now: Instant) -> bool {
        !request.manual_zone_hint_shown() && request.age(now) > self.manual_zone_hint_after
    }

    pub fn should_show_manual_disable_hint(&self, request: &AutomationRequest) -> bool {
        !request.manual_disable_hint_shown()
            && request.disable_attempts() >= self.disable_attempt_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timezone::TimeZoneOption;

    fn request(clock: &ManualClock) -> AutomationRequest {
        AutomationRequest::new(
            TimeZoneOption::new(5.5, "Asia/Kolkata", "Индия", "Индия"),
            clock.now(),
        )
    }

    #[test]
    fn test_expiry_is_strict() {
        let clock = ManualClock::new();
        let supervisor = TimeoutSupervisor::default();
        let request = request(&clock);

        clock.advance(Duration::from_millis(15_000));
        assert!(!supervisor.is_expired(&request, clock.now()));
        clock.advance(Duration::from_millis(1));
        assert!(supervisor.is_expired(&request, clock.now()));
    }

    #[test]
    fn test_manual_zone_hint_after_four_seconds_once() {
        let clock = ManualClock::new();
        let supervisor = TimeoutSupervisor::default();
        let mut request = request(&clock);

        clock.advance(Duration::from_millis(4_000));
        assert!(!supervisor.should_show_manual_zone_hint(&request, clock.now()));
        clock.advance(Duration::from_millis(1));
        assert!(supervisor.should_show_manual_zone_hint(&request, clock.now()));

        request.mark_manual_zone_hint_shown();
        assert!(!supervisor.should_show_manual_zone_hint(&request, clock.now()));
    }

    #[test]
    fn test_manual_disable_hint_threshold() {
        let clock = ManualClock::new();
        let supervisor = TimeoutSupervisor::default();
        let mut request = request(&clock);

        request.record_disable_attempt();
        request.record_disable_attempt();
        assert!(!supervisor.should_show_manual_disable_hint(&request));
        request.record_disable_attempt();
        assert!(supervisor.should_show_manual_disable_hint(&request));

        request.mark_manual_disable_hint_shown();
        request.record_disable_attempt();
        assert!(!supervisor.should_show_manual_disable_hint(&request));
    }
}
