//! Work-session counting within a pomodoro cycle.

/// Counts completed work sessions and decides when a long break is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleCounter {
    completed: u32,
}

impl CycleCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of work sessions completed since the last session reset.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Position within the current cycle, used for "k of N" displays.
    pub fn position_in_cycle(&self, cycle_length: u32) -> u32 {
        self.completed % cycle_length.max(1)
    }

    /// Records a completed work session. Returns true when the following
    /// break is the long one; the check runs after incrementing.
    pub fn record_completion(&mut self, cycle_length: u32) -> bool {
        self.completed = self.completed.saturating_add(1);
        self.completed % cycle_length.max(1) == 0
    }

    /// Whether completing the session in progress would earn a long break.
    /// Does not change the count.
    pub fn next_break_is_long(&self, cycle_length: u32) -> bool {
        self.completed.saturating_add(1) % cycle_length.max(1) == 0
    }

    /// Starts a new session.
    pub fn reset(&mut self) {
        self.completed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_break_every_nth_completion() {
        for cycle_length in 1..=10 {
            let mut counter = CycleCounter::new();
            for n in 1..=(cycle_length * 3) {
                let long = counter.record_completion(cycle_length);
                assert_eq!(long, n % cycle_length == 0, "n={n} c={cycle_length}");
            }
        }
    }

    #[test]
    fn test_position_in_cycle() {
        let mut counter = CycleCounter::new();
        assert_eq!(counter.position_in_cycle(4), 0);
        counter.record_completion(4);
        counter.record_completion(4);
        assert_eq!(counter.position_in_cycle(4), 2);
        counter.record_completion(4);
        counter.record_completion(4);
        assert_eq!(counter.completed(), 4);
        assert_eq!(counter.position_in_cycle(4), 0);
    }

    #[test]
    fn test_next_break_preview_does_not_count() {
        let mut counter = CycleCounter::new();
        for _ in 0..3 {
            counter.record_completion(4);
        }
        assert!(counter.next_break_is_long(4));
        assert_eq!(counter.completed(), 3);
        assert!(!CycleCounter::new().next_break_is_long(4));
    }

    #[test]
    fn test_reset() {
        let mut counter = CycleCounter::new();
        counter.record_completion(4);
        counter.reset();
        assert_eq!(counter.completed(), 0);
    }
}
