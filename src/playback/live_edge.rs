use std::time::Duration;

/// Tracks whether playback sits within `threshold` of the live edge
#[derive(Debug, Clone)]
pub struct LiveEdgeTracker {
    threshold: Duration,
    at_live_edge: bool,
}

impl LiveEdgeTracker {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            at_live_edge: false,
        }
    }

    /// Recompute from the engine's live edge and current position, in seconds.
    /// A stream without a live edge is never at it.
    pub fn update(&mut self, live_edge: Option<f64>, current_time: f64) -> bool {
        self.at_live_edge = match live_edge {
            Some(edge) => edge - current_time < self.threshold.as_secs_f64(),
            None => false,
        };
        self.at_live_edge
    }

    pub fn at_live_edge(&self) -> bool {
        self.at_live_edge
    }

    pub fn reset(&mut self) {
        self.at_live_edge = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        let mut tracker = LiveEdgeTracker::new(Duration::from_secs(15));
        assert!(tracker.update(Some(100.0), 88.0));
        assert!(!tracker.update(Some(100.0), 80.0));
        assert!(!tracker.update(Some(100.0), 85.0));
        assert!(tracker.update(Some(100.0), 85.5));
    }

    #[test]
    fn test_no_live_edge() {
        let mut tracker = LiveEdgeTracker::new(Duration::from_secs(15));
        tracker.update(Some(10.0), 9.0);
        assert!(!tracker.update(None, 9.0));
        assert!(!tracker.at_live_edge());
    }
}
