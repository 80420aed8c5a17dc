//! Feedback interface
//!
//! The simulation never renders. Each running tick it hands a read-only
//! snapshot to its sinks, and lifecycle changes go out as discrete events.
//! Audio filters, waveforms, flashes and fades all live on the other side
//! of `FeedbackSink`.

use serde::{Deserialize, Serialize};

use crate::sim::{Phase, Side};

/// Read-only view of a tick for renderers and audio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningSnapshot {
    pub left_sync: f32,
    pub right_sync: f32,
    pub total_sync: f32,
    pub stability: f32,
    pub left_in_hazard: bool,
    pub right_in_hazard: bool,
    /// overheat_timer / threshold, 0-1
    pub overheat_ratio: f32,
    pub left_locked: bool,
    pub right_locked: bool,
    pub phase: Phase,
}

/// Discrete lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TuningEvent {
    /// A stage was loaded and play (re)started
    Initialized,
    /// A side's sync entered the lock range
    TargetLocked(Side),
    /// Stability reached 1.0; fired once per session
    Success,
    /// Overheat reached; fired once per attempt
    GameOver,
    /// Restart delay elapsed; screen should fade to black
    FadeOutStarted { duration: f32 },
    /// Fade finished; the stage is reinitialized right after this
    FadeOutCompleted,
    /// New layout is live; screen should fade back in
    FadeInStarted { duration: f32 },
}

/// Consumer of snapshots and events
///
/// Both methods default to no-ops so a sink only implements what it uses.
pub trait FeedbackSink {
    fn on_snapshot(&mut self, _snapshot: &TuningSnapshot) {}
    fn on_event(&mut self, _event: &TuningEvent) {}
}

/// Records everything it receives
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<TuningEvent>,
    pub snapshots: Vec<TuningSnapshot>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, event: &TuningEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

impl FeedbackSink for EventLog {
    fn on_snapshot(&mut self, snapshot: &TuningSnapshot) {
        self.snapshots.push(*snapshot);
    }

    fn on_event(&mut self, event: &TuningEvent) {
        self.events.push(*event);
    }
}

/// Writes events through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl FeedbackSink for LogSink {
    fn on_snapshot(&mut self, snapshot: &TuningSnapshot) {
        log::trace!(
            "sync L={:.2} R={:.2} total={:.2} stability={:.2} overheat={:.2}",
            snapshot.left_sync,
            snapshot.right_sync,
            snapshot.total_sync,
            snapshot.stability,
            snapshot.overheat_ratio
        );
    }

    // Lifecycle changes are already reported at info by the controller
    fn on_event(&mut self, event: &TuningEvent) {
        match event {
            TuningEvent::TargetLocked(side) => log::debug!("{} target locked", side.as_str()),
            other => log::debug!("Tuning event: {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_counts_matching_events() {
        let mut log = EventLog::new();
        log.on_event(&TuningEvent::Initialized);
        log.on_event(&TuningEvent::TargetLocked(Side::Left));
        log.on_event(&TuningEvent::TargetLocked(Side::Right));
        log.on_event(&TuningEvent::TargetLocked(Side::Left));
        assert_eq!(log.count(&TuningEvent::TargetLocked(Side::Left)), 2);
        assert_eq!(log.count(&TuningEvent::Success), 0);
        assert!(log.snapshots.is_empty());
    }

    #[test]
    fn test_default_sink_ignores_everything() {
        struct Mute;
        impl FeedbackSink for Mute {}

        let mut sink = Mute;
        sink.on_event(&TuningEvent::GameOver);
    }

    #[test]
    fn test_log_sink_stays_below_info() {
        use crate::test_log;
        use log::Level;

        test_log::capture();
        let mut sink = LogSink;
        sink.on_event(&TuningEvent::Success);
        sink.on_event(&TuningEvent::GameOver);
        sink.on_event(&TuningEvent::FadeOutStarted { duration: 0.5 });
        sink.on_event(&TuningEvent::TargetLocked(Side::Right));

        assert!(test_log::at_level(Level::Info).is_empty());
        assert_eq!(test_log::at_level(Level::Debug).len(), 4);
    }
}
