//! Push-or-replace decision for history writes

use std::time::{Duration, Instant};

/// How a URL is written to the history store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Push,
    Replace,
}

/// Dwell-time policy
///
/// Navigations that follow the previous history write within the dwell
/// time replace the current entry instead of pushing a new one, so bursts
/// of redirects or rapid clicks leave a single entry behind.
#[derive(Debug, Clone)]
pub struct DwellPolicy {
    dwell: Duration,
    last_write: Option<Instant>,
}

impl DwellPolicy {
    pub fn new(dwell: Duration) -> Self {
        Self {
            dwell,
            last_write: None,
        }
    }

    /// Decides the mode for a write happening at `now` and records it
    pub fn decide(&mut self, now: Instant) -> HistoryMode {
        let mode = match self.last_write {
            Some(previous) if now.saturating_duration_since(previous) < self.dwell => {
                HistoryMode::Replace
            }
            _ => HistoryMode::Push,
        };
        self.last_write = Some(now);
        mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_write_pushes() {
        let mut policy = DwellPolicy::new(Duration::from_millis(200));
        assert_eq!(policy.decide(Instant::now()), HistoryMode::Push);
    }

    #[test]
    fn test_quick_successive_write_replaces() {
        let mut policy = DwellPolicy::new(Duration::from_millis(200));
        let start = Instant::now();
        policy.decide(start);
        assert_eq!(policy.decide(start + Duration::from_millis(50)), HistoryMode::Replace);
    }

    #[test]
    fn test_write_after_dwell_pushes() {
        let mut policy = DwellPolicy::new(Duration::from_millis(200));
        let start = Instant::now();
        policy.decide(start);
        assert_eq!(policy.decide(start + Duration::from_millis(250)), HistoryMode::Push);
    }

    #[test]
    fn test_zero_dwell_always_pushes() {
        let mut policy = DwellPolicy::new(Duration::ZERO);
        let now = Instant::now();
        policy.decide(now);
        assert_eq!(policy.decide(now), HistoryMode::Push);
    }
}
