//! Lost Tuning - simulation core of the Tuning minigame
//!
//! Two control points, one per panel, each chasing its own target while the
//! player's inputs bleed into each other. Holding both on target fills the
//! stability gauge; lingering in hazards overheats the system.
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, scoring, zones, lifecycle)
//! - `stage`: Per-chapter stage configuration
//! - `feedback`: Snapshot/event interface for renderers and audio
//! - `error`: Setup errors

pub mod error;
pub mod feedback;
pub mod sim;
pub mod stage;

#[cfg(test)]
mod test_log;

pub use error::TuningError;
pub use feedback::{EventLog, FeedbackSink, LogSink, TuningEvent, TuningSnapshot};
pub use sim::{Phase, RawInput, Side, TuningController};
pub use stage::{SideConfig, StageConfig, StageTable};

/// Simulation constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Distance units per unit of stage tolerance
    pub const TOLERANCE_SCALE: f32 = 100.0;
    /// Sync above which a side counts as locked on target
    pub const TARGET_LOCK_SYNC: f32 = 0.9;
    /// Overheat cools at this fraction of its accumulation rate
    pub const OVERHEAT_COOLDOWN_RATIO: f32 = 0.5;

    /// Hold on the failure state before fading out (seconds)
    pub const RESTART_DELAY: f32 = 1.0;
    pub const FADE_OUT_DURATION: f32 = 0.5;
    pub const FADE_IN_DURATION: f32 = 0.5;
}
