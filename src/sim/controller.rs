//! Session controller
//!
//! Owns the simulation state, the active stage and the RNG. Drives the
//! lifecycle: Inactive -> Running -> Succeeded, or Running -> GameOver ->
//! Restarting -> Running with a fresh layout.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::input::{InputSampler, RawInput};
use super::state::{ControlPoint, Phase, RestartStage, Side, SideState, TuningState};
use super::tick::{StepOutcome, step};
use super::zones::{LayoutSpec, place_layout};
use crate::consts::*;
use crate::error::{Result, TuningError};
use crate::feedback::{FeedbackSink, TuningEvent, TuningSnapshot};
use crate::stage::{StageConfig, StageTable};

/// What a tick produced
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub snapshot: TuningSnapshot,
    /// Events raised since the previous tick, in order
    pub events: Vec<TuningEvent>,
}

/// Orchestrates a tuning session
pub struct TuningController {
    state: TuningState,
    config: Option<StageConfig>,
    sampler: InputSampler,
    sinks: Vec<Box<dyn FeedbackSink>>,
    rng: Pcg32,
    pending: Vec<TuningEvent>,
}

impl TuningController {
    /// Create an inactive controller; `seed` drives every zone layout
    pub fn new(seed: u64) -> Self {
        Self {
            state: TuningState::new(),
            config: None,
            sampler: InputSampler::default(),
            sinks: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            pending: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn FeedbackSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn FeedbackSink>) {
        self.sinks.push(sink);
    }

    pub fn state(&self) -> &TuningState {
        &self.state
    }

    pub fn config(&self) -> Option<&StageConfig> {
        self.config.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Load a stage and start (or hard-reset) the session
    ///
    /// Pre-empts any restart in progress. An invalid stage is logged and
    /// rejected; the controller keeps its previous state.
    pub fn initialize(&mut self, config: StageConfig) -> Result<()> {
        if let Err(e) = config.validate() {
            log::error!("Tuning stage rejected: {}", e);
            return Err(e);
        }
        self.config = Some(config);
        self.reset_session()
    }

    /// Pick the stage for a 1-based chapter and initialize with it
    pub fn initialize_chapter(&mut self, table: &StageTable, chapter: u32) -> Result<()> {
        let Some(config) = table.for_chapter(chapter) else {
            let err = TuningError::ConfigurationMissing { chapter };
            log::error!("{}", err);
            return Err(err);
        };
        self.initialize(config.clone())?;
        log::info!("Tuning initialized for chapter {}", chapter);
        Ok(())
    }

    /// Hard reset with the current stage and a new layout
    pub fn restart(&mut self) -> Result<()> {
        self.reset_session()
    }

    /// Reset all state, place zones and enter Running
    fn reset_session(&mut self) -> Result<()> {
        let Some(config) = self.config.as_ref() else {
            let err = TuningError::NotInitialized;
            log::error!("{}", err);
            return Err(err);
        };

        let target_size = Vec2::splat(config.target_tolerance * TOLERANCE_SCALE * 2.0);
        let [left, right] = Side::BOTH.map(|side| {
            let side_cfg = config.side(side);
            let start = side_cfg.bounds.clamp(side_cfg.start);
            let spec = LayoutSpec {
                bounds: side_cfg.bounds,
                start,
                fixed_target: side_cfg.target_position.map(|p| side_cfg.bounds.clamp(p)),
                target_size,
                target_padding: config.target_padding,
                hazard_size: config.hazard_size,
                hazard_count: side_cfg.hazard_count,
                safe_margin: config.safe_margin,
            };
            let (target, hazards) = place_layout(&spec, &mut self.rng);
            SideState {
                point: ControlPoint::at(start),
                target: Some(target),
                hazards,
                ..SideState::default()
            }
        });

        self.state = TuningState {
            phase: Phase::Running,
            left,
            right,
            inertia: config.base_inertia,
            ..TuningState::new()
        };
        self.sampler.configure(
            config.left.inverted,
            config.right.inverted,
            config.interference_strength,
        );

        log::info!(
            "Tuning layout: left target ({:.0}, {:.0}) with {} hazards, right target ({:.0}, {:.0}) with {} hazards",
            self.state.left.target.map_or(0.0, |t| t.base.x),
            self.state.left.target.map_or(0.0, |t| t.base.y),
            self.state.left.hazards.len(),
            self.state.right.target.map_or(0.0, |t| t.base.x),
            self.state.right.target.map_or(0.0, |t| t.base.y),
            self.state.right.hazards.len(),
        );
        self.emit(TuningEvent::Initialized);
        Ok(())
    }

    /// Current read-only view
    pub fn snapshot(&self) -> TuningSnapshot {
        let overheat_ratio = self
            .config
            .as_ref()
            .map_or(0.0, |c| (self.state.overheat_timer / c.overheat_threshold).clamp(0.0, 1.0));
        TuningSnapshot {
            left_sync: self.state.left.sync,
            right_sync: self.state.right.sync,
            total_sync: self.state.total_sync,
            stability: self.state.stability,
            left_in_hazard: self.state.left.in_hazard,
            right_in_hazard: self.state.right.in_hazard,
            overheat_ratio,
            left_locked: self.state.left.locked,
            right_locked: self.state.right.locked,
            phase: self.state.phase,
        }
    }

    /// Take events raised outside a tick (e.g. by `initialize`)
    pub fn drain_events(&mut self) -> Vec<TuningEvent> {
        std::mem::take(&mut self.pending)
    }

    fn emit(&mut self, event: TuningEvent) {
        for sink in &mut self.sinks {
            sink.on_event(&event);
        }
        self.pending.push(event);
    }

    /// Advance by one fixed step
    pub fn tick(&mut self, raw: &RawInput, dt: f32) -> TickReport {
        if dt.is_finite() && dt > 0.0 {
            match self.state.phase {
                Phase::Inactive | Phase::Succeeded => {}
                Phase::Running => self.run_step(raw, dt),
                Phase::GameOver => {
                    self.state.phase = Phase::Restarting {
                        stage: RestartStage::Delay,
                        elapsed: 0.0,
                    };
                    self.advance_restart(dt);
                }
                Phase::Restarting { .. } => self.advance_restart(dt),
            }
        }

        TickReport {
            snapshot: self.snapshot(),
            events: self.drain_events(),
        }
    }

    fn run_step(&mut self, raw: &RawInput, dt: f32) {
        let Some(config) = self.config.as_ref() else {
            return;
        };
        let control = self.sampler.sample(raw);
        let (outcome, report) = step(&mut self.state, config, &control, dt);

        for (side, locked) in Side::BOTH.into_iter().zip(report.newly_locked) {
            if locked {
                self.emit(TuningEvent::TargetLocked(side));
            }
        }

        match outcome {
            StepOutcome::Continue => {}
            StepOutcome::Success => {
                self.state.phase = Phase::Succeeded;
                log::info!("Tuning success");
                self.emit(TuningEvent::Success);
            }
            StepOutcome::Overheat => {
                self.state.phase = Phase::GameOver;
                log::info!("Tuning game over - overheat");
                self.emit(TuningEvent::GameOver);
            }
        }

        let snapshot = self.snapshot();
        for sink in &mut self.sinks {
            sink.on_snapshot(&snapshot);
        }
    }

    /// Delay, fade out, reinitialize, fade in
    fn advance_restart(&mut self, dt: f32) {
        let Phase::Restarting { stage, elapsed } = self.state.phase else {
            return;
        };
        let elapsed = elapsed + dt;

        match stage {
            RestartStage::Delay if elapsed >= RESTART_DELAY => {
                log::debug!("Restart delay elapsed, fading out");
                self.state.phase = Phase::Restarting {
                    stage: RestartStage::FadingOut,
                    elapsed: 0.0,
                };
                self.emit(TuningEvent::FadeOutStarted {
                    duration: FADE_OUT_DURATION,
                });
            }
            RestartStage::FadingOut if elapsed >= FADE_OUT_DURATION => {
                self.emit(TuningEvent::FadeOutCompleted);
                if self.reset_session().is_err() {
                    self.state.phase = Phase::Inactive;
                    return;
                }
                log::debug!("Restarted with a new layout, fading in");
                self.emit(TuningEvent::FadeInStarted {
                    duration: FADE_IN_DURATION,
                });
            }
            _ => self.state.phase = Phase::Restarting { stage, elapsed },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{EventLog, LogSink};
    use crate::test_log;
    use log::Level;
    use crate::sim::state::HazardZone;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Sink that shares its log with the test
    struct SharedLog(Rc<RefCell<EventLog>>);

    impl FeedbackSink for SharedLog {
        fn on_snapshot(&mut self, snapshot: &TuningSnapshot) {
            self.0.borrow_mut().on_snapshot(snapshot);
        }

        fn on_event(&mut self, event: &TuningEvent) {
            self.0.borrow_mut().on_event(event);
        }
    }

    fn quiet_stage() -> StageConfig {
        let mut config = StageConfig::default();
        config.left.hazard_count = 0;
        config.right.hazard_count = 0;
        config
    }

    fn controller_with_log(seed: u64) -> (TuningController, Rc<RefCell<EventLog>>) {
        let log = Rc::new(RefCell::new(EventLog::new()));
        let ctl = TuningController::new(seed).with_sink(Box::new(SharedLog(log.clone())));
        (ctl, log)
    }

    /// Park both points on their targets
    fn align(ctl: &mut TuningController) {
        for side in Side::BOTH {
            let s = ctl.state.side_mut(side);
            if let Some(target) = s.target {
                s.point.pos = target.center;
                s.point.vel = Vec2::ZERO;
            }
        }
    }

    #[test]
    fn test_tick_before_initialize_is_noop() {
        let (mut ctl, log) = controller_with_log(1);
        let report = ctl.tick(&RawInput::new(Vec2::X, Vec2::Y), SIM_DT);
        assert_eq!(report.snapshot.phase, Phase::Inactive);
        assert!(report.events.is_empty());
        assert!(log.borrow().snapshots.is_empty());
        assert_eq!(ctl.state().left.point.pos, Vec2::ZERO);
    }

    #[test]
    fn test_missing_chapter_keeps_inactive() {
        let mut ctl = TuningController::new(1);
        let err = ctl.initialize_chapter(&StageTable::default(), 2).unwrap_err();
        assert!(matches!(err, TuningError::ConfigurationMissing { chapter: 2 }));
        assert_eq!(ctl.phase(), Phase::Inactive);
        assert!(matches!(ctl.restart(), Err(TuningError::NotInitialized)));
    }

    #[test]
    fn test_setup_errors_logged_once() {
        test_log::capture();
        let mut ctl = TuningController::new(1);
        assert!(ctl.initialize_chapter(&StageTable::default(), 1).is_err());
        assert_eq!(test_log::at_level(Level::Error).len(), 1);

        test_log::capture();
        let config = StageConfig {
            overheat_threshold: -1.0,
            ..StageConfig::default()
        };
        assert!(ctl.initialize_chapter(&StageTable::new(vec![config]), 1).is_err());
        assert_eq!(test_log::at_level(Level::Error).len(), 1);
    }

    #[test]
    fn test_invalid_stage_is_rejected() {
        let mut ctl = TuningController::new(1);
        let config = StageConfig {
            target_tolerance: 0.0,
            ..StageConfig::default()
        };
        assert!(ctl.initialize(config).is_err());
        assert_eq!(ctl.phase(), Phase::Inactive);
        assert!(ctl.config().is_none());
    }

    #[test]
    fn test_nan_stage_never_reaches_the_sim() {
        let mut ctl = TuningController::new(1);
        let config = StageConfig {
            target_tolerance: f32::NAN,
            ..StageConfig::default()
        };
        assert!(matches!(ctl.initialize(config), Err(TuningError::InvalidConfig(_))));

        let report = ctl.tick(&RawInput::new(Vec2::X, Vec2::Y), SIM_DT);
        assert_eq!(report.snapshot.phase, Phase::Inactive);
        assert!((0.0..=1.0).contains(&report.snapshot.left_sync));
        assert!((0.0..=1.0).contains(&report.snapshot.total_sync));
    }

    #[test]
    fn test_initialize_resets_and_places_zones() {
        let (mut ctl, log) = controller_with_log(42);
        let mut config = StageConfig::default();
        config.left.start = Vec2::new(-150.0, -150.0);
        config.right.hazard_count = 2;
        ctl.initialize(config.clone()).unwrap();

        let state = ctl.state();
        assert_eq!(state.phase, Phase::Running);
        assert_eq!(state.left.point.pos, Vec2::new(-150.0, -150.0));
        assert_eq!(state.inertia, config.base_inertia);
        assert_eq!(state.stability, 0.0);
        assert_eq!(state.overheat_timer, 0.0);
        assert_eq!(state.left.hazards.len(), 1);
        assert_eq!(state.right.hazards.len(), 2);
        assert!(state.left.target.is_some() && state.right.target.is_some());
        assert_eq!(log.borrow().count(&TuningEvent::Initialized), 1);

        let report = ctl.tick(&RawInput::default(), SIM_DT);
        assert_eq!(report.events, vec![TuningEvent::Initialized]);
    }

    #[test]
    fn test_success_fires_once() {
        let (mut ctl, log) = controller_with_log(7);
        ctl.initialize(quiet_stage()).unwrap();
        align(&mut ctl);

        let mut ticks = 0;
        while ctl.phase() == Phase::Running {
            ctl.tick(&RawInput::default(), SIM_DT);
            ticks += 1;
            assert!(ticks < 1000, "never succeeded");
        }
        assert_eq!(ctl.phase(), Phase::Succeeded);
        assert_eq!(ctl.state().stability, 1.0);

        for _ in 0..300 {
            let report = ctl.tick(&RawInput::new(Vec2::X, Vec2::X), SIM_DT);
            assert!(!report.events.contains(&TuningEvent::Success));
        }
        assert_eq!(log.borrow().count(&TuningEvent::Success), 1);
        assert_eq!(ctl.phase(), Phase::Succeeded);
    }

    #[test]
    fn test_success_logged_once_with_log_sink() {
        test_log::capture();
        let mut ctl = TuningController::new(7).with_sink(Box::new(LogSink));
        ctl.initialize(quiet_stage()).unwrap();
        align(&mut ctl);
        for _ in 0..1000 {
            ctl.tick(&RawInput::default(), SIM_DT);
        }
        assert_eq!(ctl.phase(), Phase::Succeeded);
        let info = test_log::at_level(Level::Info);
        assert_eq!(info.iter().filter(|m| m.contains("success")).count(), 1);
    }

    #[test]
    fn test_overheat_restarts_with_fresh_state() {
        let (mut ctl, log) = controller_with_log(11);
        ctl.initialize(quiet_stage()).unwrap();
        let first_layout = ctl.state().left.target;

        // trap the left point in a hazard covering its start
        let pos = ctl.state().left.point.pos;
        ctl.state.left.hazards.push(HazardZone::new(pos, Vec2::splat(40.0)));

        let mut ticks = 0;
        while ctl.phase() == Phase::Running {
            ctl.tick(&RawInput::default(), SIM_DT);
            ticks += 1;
            assert!(ticks < 2000, "never overheated");
        }
        assert_eq!(ctl.phase(), Phase::GameOver);
        assert_eq!(ctl.snapshot().overheat_ratio, 1.0);

        while ctl.phase() != Phase::Running {
            ctl.tick(&RawInput::default(), SIM_DT);
            ticks += 1;
            assert!(ticks < 4000, "restart never completed");
        }

        let state = ctl.state();
        assert_eq!(state.stability, 0.0);
        assert_eq!(state.overheat_timer, 0.0);
        assert!(state.left.hazards.is_empty());
        assert_ne!(state.left.target, first_layout);

        let log = log.borrow();
        assert_eq!(log.count(&TuningEvent::GameOver), 1);
        let tail: Vec<_> = log
            .events
            .iter()
            .skip_while(|e| **e != TuningEvent::GameOver)
            .copied()
            .collect();
        assert_eq!(
            tail,
            vec![
                TuningEvent::GameOver,
                TuningEvent::FadeOutStarted {
                    duration: FADE_OUT_DURATION
                },
                TuningEvent::FadeOutCompleted,
                TuningEvent::Initialized,
                TuningEvent::FadeInStarted {
                    duration: FADE_IN_DURATION
                },
            ]
        );
    }

    #[test]
    fn test_restart_timing() {
        let mut ctl = TuningController::new(3);
        ctl.initialize(quiet_stage()).unwrap();
        ctl.drain_events();
        ctl.state.phase = Phase::GameOver;

        // 1/8 s steps keep the arithmetic exact
        let dt = 0.125;
        let delay_ticks = (RESTART_DELAY / dt) as usize;
        for _ in 0..delay_ticks - 1 {
            let report = ctl.tick(&RawInput::default(), dt);
            assert!(report.events.is_empty());
        }
        let report = ctl.tick(&RawInput::default(), dt);
        assert_eq!(
            report.events,
            vec![TuningEvent::FadeOutStarted {
                duration: FADE_OUT_DURATION
            }]
        );

        let fade_ticks = (FADE_OUT_DURATION / dt) as usize;
        for _ in 0..fade_ticks - 1 {
            ctl.tick(&RawInput::default(), dt);
            assert!(matches!(ctl.phase(), Phase::Restarting { .. }));
        }
        ctl.tick(&RawInput::default(), dt);
        assert_eq!(ctl.phase(), Phase::Running);
    }

    #[test]
    fn test_initialize_preempts_restart() {
        let mut ctl = TuningController::new(5);
        ctl.initialize(quiet_stage()).unwrap();
        ctl.state.phase = Phase::Restarting {
            stage: RestartStage::FadingOut,
            elapsed: 0.1,
        };
        ctl.drain_events();
        ctl.restart().unwrap();
        assert_eq!(ctl.phase(), Phase::Running);
        let report = ctl.tick(&RawInput::default(), SIM_DT);
        assert_eq!(report.events, vec![TuningEvent::Initialized]);
    }

    #[test]
    fn test_snapshot_reaches_sinks_only_while_running() {
        let (mut ctl, log) = controller_with_log(9);
        ctl.initialize(quiet_stage()).unwrap();
        for _ in 0..10 {
            ctl.tick(&RawInput::default(), SIM_DT);
        }
        assert_eq!(log.borrow().snapshots.len(), 10);

        ctl.state.phase = Phase::Succeeded;
        ctl.tick(&RawInput::default(), SIM_DT);
        assert_eq!(log.borrow().snapshots.len(), 10);
    }

    #[test]
    fn test_interference_moves_idle_side() {
        let mut ctl = TuningController::new(13);
        let config = StageConfig {
            interference_strength: 0.5,
            ..quiet_stage()
        };
        ctl.initialize(config).unwrap();
        for _ in 0..60 {
            ctl.tick(&RawInput::new(Vec2::X, Vec2::ZERO), SIM_DT);
        }
        let state = ctl.state();
        assert!(state.left.point.pos.x > 0.0);
        assert!(state.right.point.pos.x < 0.0);
        assert!(state.right.point.pos.x > -state.left.point.pos.x);
    }

    #[test]
    fn test_same_seed_same_session() {
        let run = |seed| {
            let mut ctl = TuningController::new(seed);
            ctl.initialize(StageTable::builtin().stages[2].clone()).unwrap();
            for i in 0..240 {
                let dir = if i % 60 < 30 { Vec2::X } else { Vec2::Y };
                ctl.tick(&RawInput::new(dir, -dir), SIM_DT);
            }
            ctl.state().clone()
        };
        let a = run(77);
        let b = run(77);
        assert_eq!(a.left.point, b.left.point);
        assert_eq!(a.right.hazards, b.right.hazards);
        assert_eq!(a.stability, b.stability);
    }
}
