//! Click classification.
//!
//! A press is a double click when the previous press landed on the same
//! target less than the double-click interval earlier. Timestamps come from
//! the host, so classification is a pure comparison with no timers involved.

use std::time::Duration;

/// Default double-click interval in milliseconds.
pub const DEFAULT_DOUBLE_CLICK_TIME_MS: u64 = 500;

/// Whether a press starts a new click sequence or completes a double click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
}

#[derive(Debug, Clone, Copy)]
struct ClickState {
    target: usize,
    time: Duration,
}

/// Remembers the last press to classify the next one.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    last_click: Option<ClickState>,
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ClickTracker {
    pub fn new() -> Self {
        Self { last_click: None }
    }

    /// Classify a press on `target` at `time`.
    ///
    /// A double click consumes the recorded press, so a third press in quick
    /// succession starts a new sequence instead of counting as another double.
    pub fn press(&mut self, target: usize, time: Duration, interval: Duration) -> ClickKind {
        let is_double = self.last_click.is_some_and(|last| {
            last.target == target
                && time
                    .checked_sub(last.time)
                    .is_some_and(|elapsed| elapsed < interval)
        });

        if is_double {
            self.last_click = None;
            ClickKind::Double
        } else {
            self.last_click = Some(ClickState { target, time });
            ClickKind::Single
        }
    }

    pub fn reset(&mut self) {
        self.last_click = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(DEFAULT_DOUBLE_CLICK_TIME_MS);

    #[test]
    fn test_double_click_boundary() {
        let t = Duration::from_secs(10);
        let one = Duration::from_millis(1);

        let mut clicks = ClickTracker::new();
        assert_eq!(clicks.press(3, t, INTERVAL), ClickKind::Single);
        assert_eq!(clicks.press(3, t + INTERVAL - one, INTERVAL), ClickKind::Double);

        let mut clicks = ClickTracker::new();
        clicks.press(3, t, INTERVAL);
        assert_eq!(clicks.press(3, t + INTERVAL + one, INTERVAL), ClickKind::Single);

        let mut clicks = ClickTracker::new();
        clicks.press(3, t, INTERVAL);
        assert_eq!(clicks.press(3, t + INTERVAL, INTERVAL), ClickKind::Single);
    }

    #[test]
    fn test_different_target_is_single() {
        let t = Duration::from_secs(1);
        let mut clicks = ClickTracker::new();
        clicks.press(1, t, INTERVAL);
        assert_eq!(clicks.press(2, t, INTERVAL), ClickKind::Single);
        // The press on 2 replaced the one on 1.
        assert_eq!(clicks.press(2, t, INTERVAL), ClickKind::Double);
        assert_eq!(clicks.press(2, t, INTERVAL), ClickKind::Single);
    }
}
