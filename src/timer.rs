use tracing::warn;

/// Something the engine reports to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started { goal_time: i64 },
    Tick { remaining: i64 },
    Alarm,
    Stopped,
}

pub trait TimerSink {
    fn emit(&mut self, event: TimerEvent);
}

impl TimerSink for Vec<TimerEvent> {
    fn emit(&mut self, event: TimerEvent) {
        self.push(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStatus {
    pub running: bool,
    pub remaining: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    goal_time: Option<i64>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn goal_time(&self) -> Option<i64> {
        self.goal_time
    }

    pub fn is_running(&self) -> bool {
        self.goal_time.is_some()
    }

    /// Replaces any running countdown with one ending `duration_ms` from `now`.
    pub fn start(&mut self, duration_ms: i64, now: i64, sink: &mut impl TimerSink) {
        let goal_time = now.saturating_add(duration_ms);
        self.goal_time = Some(goal_time);
        sink.emit(TimerEvent::Started { goal_time });
    }

    pub fn poll(&mut self, now: i64, sink: &mut impl TimerSink) {
        let Some(goal_time) = self.goal_time else {
            return;
        };

        if now < goal_time {
            sink.emit(TimerEvent::Tick {
                remaining: goal_time.saturating_sub(now),
            });
        } else {
            self.goal_time = None;
            sink.emit(TimerEvent::Alarm);
        }
    }

    /// Safe from any state; an idle engine still reports the final tick.
    pub fn stop(&mut self, sink: &mut impl TimerSink) {
        self.goal_time = None;
        sink.emit(TimerEvent::Tick { remaining: 0 });
        sink.emit(TimerEvent::Stopped);
    }

    pub fn status(&self, now: i64) -> TimerStatus {
        match self.goal_time {
            Some(goal_time) => TimerStatus {
                running: true,
                remaining: goal_time.saturating_sub(now),
            },
            None => TimerStatus {
                running: false,
                remaining: 0,
            },
        }
    }
}

/// Converts a wire duration (a JSON number) into whole milliseconds.
///
/// Non-finite values are clamped to zero so they fire on the first poll.
pub fn duration_from_wire(duration: f64) -> i64 {
    if !duration.is_finite() {
        warn!("non-finite timer duration {duration}, using 0");
        return 0;
    }
    // `as` truncates toward zero and saturates at the i64 bounds.
    duration as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_then_poll_counts_down_then_alarms_once() {
        let mut countdown = Countdown::new();
        let mut events = Vec::new();
        countdown.start(5_000, 0, &mut events);
        assert_eq!(events, vec![TimerEvent::Started { goal_time: 5_000 }]);

        let mut last = i64::MAX;
        for now in (0..5_000).step_by(16) {
            events.clear();
            countdown.poll(now, &mut events);
            let TimerEvent::Tick { remaining } = events[0] else {
                panic!("expected tick, got {events:?}");
            };
            assert!(remaining <= last);
            last = remaining;
        }

        events.clear();
        countdown.poll(5_001, &mut events);
        assert_eq!(events, vec![TimerEvent::Alarm]);
        assert!(!countdown.is_running());

        events.clear();
        countdown.poll(5_100, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn scenario_five_seconds() {
        let mut countdown = Countdown::new();
        let mut events = Vec::new();
        countdown.start(5_000, 0, &mut events);

        assert_eq!(
            countdown.status(2_000),
            TimerStatus {
                running: true,
                remaining: 3_000
            }
        );

        countdown.poll(5_001, &mut events);
        assert_eq!(events.last(), Some(&TimerEvent::Alarm));
        assert_eq!(
            countdown.status(5_001),
            TimerStatus {
                running: false,
                remaining: 0
            }
        );
    }

    #[test]
    fn zero_duration_alarms_on_first_poll_without_positive_tick() {
        let mut countdown = Countdown::new();
        let mut events = Vec::new();
        countdown.start(0, 1_000, &mut events);
        countdown.poll(1_000, &mut events);
        assert_eq!(
            events,
            vec![TimerEvent::Started { goal_time: 1_000 }, TimerEvent::Alarm]
        );
    }

    #[test]
    fn negative_duration_alarms_on_first_poll() {
        let mut countdown = Countdown::new();
        let mut events = Vec::new();
        countdown.start(-300, 1_000, &mut events);
        countdown.poll(1_000, &mut events);
        assert_eq!(events.last(), Some(&TimerEvent::Alarm));
    }

    #[test]
    fn huge_negative_wire_duration_reports_overdue_then_alarms() {
        let mut countdown = Countdown::new();
        let mut events = Vec::new();
        countdown.start(duration_from_wire(-1e300), 1_000, &mut events);

        let status = countdown.status(2_000);
        assert!(status.running);
        assert_eq!(status.remaining, i64::MIN);

        events.clear();
        countdown.poll(2_000, &mut events);
        assert_eq!(events, vec![TimerEvent::Alarm]);
        assert_eq!(countdown.status(3_000).remaining, 0);
    }

    #[test]
    fn stop_is_identical_from_idle_and_running() {
        let mut idle = Countdown::new();
        let mut idle_events = Vec::new();
        idle.stop(&mut idle_events);

        let mut running = Countdown::new();
        let mut running_events = Vec::new();
        running.start(60_000, 0, &mut Vec::new());
        running.stop(&mut running_events);

        let expected = vec![TimerEvent::Tick { remaining: 0 }, TimerEvent::Stopped];
        assert_eq!(idle_events, expected);
        assert_eq!(running_events, expected);
        assert_eq!(idle, Countdown::new());
        assert_eq!(running, Countdown::new());
    }

    #[test]
    fn restart_replaces_previous_goal() {
        let mut countdown = Countdown::new();
        let mut events = Vec::new();
        countdown.start(1_000, 0, &mut events);
        countdown.start(10_000, 500, &mut events);

        events.clear();
        countdown.poll(1_500, &mut events);
        assert_eq!(events, vec![TimerEvent::Tick { remaining: 9_000 }]);
    }

    #[test]
    fn status_idle_is_zero() {
        let countdown = Countdown::new();
        let status = countdown.status(123_456);
        assert!(!status.running);
        assert_eq!(status.remaining, 0);
    }

    #[test]
    fn overdue_status_is_negative_until_polled() {
        let mut countdown = Countdown::new();
        countdown.start(100, 0, &mut Vec::new());
        assert_eq!(countdown.status(150).remaining, -50);
    }

    #[test]
    fn start_saturates_near_i64_max() {
        let mut countdown = Countdown::new();
        countdown.start(i64::MAX, 10, &mut Vec::new());
        assert_eq!(countdown.goal_time(), Some(i64::MAX));
    }

    #[test]
    fn wire_durations_are_clamped_and_truncated() {
        assert_eq!(duration_from_wire(f64::NAN), 0);
        assert_eq!(duration_from_wire(f64::NEG_INFINITY), 0);
        assert_eq!(duration_from_wire(f64::INFINITY), 0);
        assert_eq!(duration_from_wire(2_999.9), 2_999);
        assert_eq!(duration_from_wire(-12.7), -12);
        assert_eq!(duration_from_wire(1e30), i64::MAX);
    }
}
