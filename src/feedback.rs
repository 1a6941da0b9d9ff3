use std::io::Write;

use tracing::debug;

use crate::gesture::CounterSignal;

/// Physical acknowledgement of a count. Terminals have no vibration motor,
/// so the default implementation rings the bell.
pub trait Feedback {
    fn on_count(&mut self);
    fn on_target_reached(&mut self);

    /// Route controller signals, honouring the user's haptic preference
    fn deliver(&mut self, signals: &[CounterSignal], enabled: bool) {
        if !enabled {
            return;
        }
        for signal in signals {
            match signal {
                CounterSignal::Count => self.on_count(),
                CounterSignal::TargetReached => self.on_target_reached(),
            }
        }
    }
}

/// Rings the terminal bell; a double ring marks a finished round
pub struct BellFeedback<W: Write> {
    out: W,
}

impl<W: Write> BellFeedback<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn ring(&mut self, times: usize) {
        let bells = "\x07".repeat(times);
        if let Err(e) = self.out.write_all(bells.as_bytes()).and_then(|_| self.out.flush()) {
            debug!(error = %e, "bell write failed");
        }
    }
}

impl<W: Write> Feedback for BellFeedback<W> {
    fn on_count(&mut self) {
        self.ring(1);
    }

    fn on_target_reached(&mut self) {
        self.ring(2);
    }
}

/// Records what would have been played
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingFeedback {
    pub counts: usize,
    pub targets: usize,
}

impl Feedback for RecordingFeedback {
    fn on_count(&mut self) {
        self.counts += 1;
    }

    fn on_target_reached(&mut self) {
        self.targets += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_feedback_is_silent() {
        let mut fb = RecordingFeedback::default();
        fb.deliver(&[CounterSignal::Count, CounterSignal::TargetReached], false);
        assert_eq!(fb, RecordingFeedback::default());
    }

    #[test]
    fn test_signals_routed() {
        let mut fb = RecordingFeedback::default();
        fb.deliver(&[CounterSignal::Count, CounterSignal::TargetReached], true);
        fb.deliver(&[CounterSignal::Count], true);
        assert_eq!(fb.counts, 2);
        assert_eq!(fb.targets, 1);
    }

    #[test]
    fn test_bell_writes_bel_bytes() {
        let mut fb = BellFeedback::new(Vec::new());
        fb.deliver(&[CounterSignal::Count, CounterSignal::TargetReached], true);
        assert_eq!(fb.out, b"\x07\x07\x07".to_vec());
    }
}
