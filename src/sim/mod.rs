//! Tuning simulation module
//!
//! All minigame logic lives here. This module must stay pure:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering, audio or input-device dependencies

pub mod autopilot;
pub mod bounds;
pub mod controller;
pub mod input;
pub mod state;
pub mod tick;
pub mod zones;

pub use bounds::Bounds;
pub use controller::{TickReport, TuningController};
pub use input::{AxisKeys, ControlInput, InputSampler, RawInput};
pub use state::{
    ControlPoint, HazardZone, Phase, RestartStage, Side, SideState, TargetZone, TuningState,
};
pub use tick::{StepOutcome, side_sync, step};
pub use zones::{MAX_PLACEMENT_ATTEMPTS, place_hazard, place_target, try_place_hazard};
