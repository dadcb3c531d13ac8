//! Trailing debounce driven by explicit clock readings.

use std::time::{Duration, Instant};

/// Fires once after `quiet` has elapsed since the most recent [`Debouncer::schedule`].
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    due: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, due: None }
    }

    /// (Re)start the quiet period from `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.due = Some(now + self.quiet);
    }

    /// Drop the pending firing, if any.
    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.due
    }

    /// Consume the pending firing when its deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if due <= now => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restarts_on_every_schedule() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.schedule(start);
        debouncer.schedule(start + Duration::from_millis(400));
        assert!(!debouncer.fire(start + Duration::from_millis(500)));
        assert!(debouncer.fire(start + Duration::from_millis(900)));
        assert!(!debouncer.fire(start + Duration::from_millis(2000)));
    }

    #[test]
    fn cancel_is_idempotent() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.cancel();
        debouncer.schedule(start);
        debouncer.cancel();
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert!(!debouncer.fire(start + Duration::from_secs(1)));
    }
}
