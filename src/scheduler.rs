/// Heartbeat period in milliseconds. The heartbeat is the only timer in the
/// process; the user-facing poll interval is just an elapsed-time comparison
/// made on each beat, which is what lets it change at runtime without
/// restarting anything.
pub const HEARTBEAT_MS: u64 = 1000;

/// Decides, on each heartbeat, whether a fetch cycle is due.
///
/// At most one cycle is in flight at a time: while `in_flight` is set,
/// heartbeats never start a second cycle, they only feed the countdown
/// display. A cycle that outlives the interval therefore delays the next
/// one rather than overlapping it.
#[derive(Debug)]
pub struct PollScheduler {
    interval_ms: i64,
    last_start_ms: Option<i64>,
    in_flight: bool,
}

impl PollScheduler {
    pub fn new(interval_ms: i64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            last_start_ms: None,
            in_flight: false,
        }
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    /// Takes effect on the next heartbeat's elapsed-time comparison.
    pub fn set_interval(&mut self, interval_ms: i64) {
        self.interval_ms = interval_ms.max(1);
    }

    /// Should this heartbeat start a cycle?
    pub fn should_start(&self, now_ms: i64) -> bool {
        if self.in_flight {
            return false;
        }
        match self.last_start_ms {
            None => true,
            Some(start) => now_ms - start >= self.interval_ms,
        }
    }

    pub fn begin_cycle(&mut self, now_ms: i64) {
        self.in_flight = true;
        self.last_start_ms = Some(now_ms);
    }

    pub fn finish_cycle(&mut self) {
        self.in_flight = false;
    }

    /// Whole seconds until the next cycle is due. Display only; never used
    /// in the trigger decision.
    pub fn seconds_left(&self, now_ms: i64) -> i64 {
        match self.last_start_ms {
            None => 0,
            Some(start) => {
                let remaining = start + self.interval_ms - now_ms;
                (remaining.max(0) + 999) / 1000
            }
        }
    }

    /// Fraction of the current interval already elapsed, clamped to 0..=1.
    /// Drives progress-ring style UI.
    pub fn progress(&self, now_ms: i64) -> f64 {
        match self.last_start_ms {
            None => 0.0,
            Some(start) => {
                let elapsed = (now_ms - start) as f64 / self.interval_ms as f64;
                elapsed.clamp(0.0, 1.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_heartbeat_fires() {
        let sched = PollScheduler::new(10_000);
        assert!(sched.should_start(0));
    }

    #[test]
    fn test_waits_out_the_interval() {
        let mut sched = PollScheduler::new(10_000);
        sched.begin_cycle(0);
        sched.finish_cycle();

        assert!(!sched.should_start(5_000));
        assert!(!sched.should_start(9_999));
        assert!(sched.should_start(10_000));
    }

    #[test]
    fn test_no_overlap_while_in_flight() {
        let mut sched = PollScheduler::new(10_000);
        sched.begin_cycle(0);

        // Several intervals elapse mid-cycle; none of these may fire
        assert!(!sched.should_start(10_000));
        assert!(!sched.should_start(25_000));
        assert!(!sched.should_start(60_000));

        // Once the slow cycle completes, the next beat fires
        sched.finish_cycle();
        assert!(sched.should_start(60_000));
    }

    #[test]
    fn test_interval_change_applies_without_restart() {
        let mut sched = PollScheduler::new(10_000);
        sched.begin_cycle(0);
        sched.finish_cycle();

        assert!(!sched.should_start(5_000));
        sched.set_interval(4_000);
        assert!(sched.should_start(5_000));

        sched.set_interval(30_000);
        assert!(!sched.should_start(20_000));
    }

    #[test]
    fn test_countdown_projection() {
        let mut sched = PollScheduler::new(10_000);
        assert_eq!(sched.seconds_left(0), 0);

        sched.begin_cycle(0);
        sched.finish_cycle();
        assert_eq!(sched.seconds_left(0), 10);
        assert_eq!(sched.seconds_left(3_000), 7);
        assert_eq!(sched.seconds_left(9_001), 1);
        assert_eq!(sched.seconds_left(12_000), 0);
    }

    #[test]
    fn test_progress_projection() {
        let mut sched = PollScheduler::new(10_000);
        assert_eq!(sched.progress(0), 0.0);

        sched.begin_cycle(0);
        sched.finish_cycle();
        assert_eq!(sched.progress(0), 0.0);
        assert_eq!(sched.progress(5_000), 0.5);
        assert_eq!(sched.progress(10_000), 1.0);
        // Overdue (cycle delayed) stays clamped
        assert_eq!(sched.progress(50_000), 1.0);
    }

    #[test]
    fn test_nonpositive_interval_is_clamped() {
        let sched = PollScheduler::new(0);
        assert_eq!(sched.interval_ms(), 1);
    }
}
