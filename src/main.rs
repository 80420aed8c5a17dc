//! Lost Tuning headless runner
//!
//! Loads a stage table, plays one chapter with the autopilot on a fixed
//! timestep and logs what happens. Useful for balancing stages without the
//! game client.
//!
//! Usage: lost-tuning [--chapter N] [--seed S] [--stages FILE] [--seconds T] [--dump-stages]

use std::process::ExitCode;

use lost_tuning::consts::*;
use lost_tuning::sim::autopilot;
use lost_tuning::{LogSink, Phase, StageTable, TuningController, TuningError, TuningEvent};

/// Render frame length the runner pretends to have
const FRAME_DT: f32 = 1.0 / 60.0;

struct Options {
    chapter: u32,
    seed: u64,
    stages: Option<String>,
    seconds: f32,
    dump_stages: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            chapter: 1,
            seed: 0x5EED,
            stages: None,
            seconds: 120.0,
            dump_stages: false,
        }
    }
}

fn parse_args() -> Result<Options, String> {
    let mut opts = Options::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |name: &str| args.next().ok_or_else(|| format!("{name} needs a value"));
        match arg.as_str() {
            "--chapter" => {
                opts.chapter = value("--chapter")?
                    .parse()
                    .map_err(|e| format!("bad chapter: {e}"))?
            }
            "--seed" => {
                opts.seed = value("--seed")?
                    .parse()
                    .map_err(|e| format!("bad seed: {e}"))?
            }
            "--seconds" => {
                opts.seconds = value("--seconds")?
                    .parse()
                    .map_err(|e| format!("bad seconds: {e}"))?
            }
            "--stages" => opts.stages = Some(value("--stages")?),
            "--dump-stages" => opts.dump_stages = true,
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(opts)
}

fn run(opts: &Options) -> Result<(), TuningError> {
    let table = match &opts.stages {
        Some(path) => StageTable::load(path)?,
        None => StageTable::builtin(),
    };

    if opts.dump_stages {
        println!("{}", table.to_json()?);
        return Ok(());
    }

    let mut controller = TuningController::new(opts.seed).with_sink(Box::new(LogSink));
    controller.initialize_chapter(&table, opts.chapter)?;
    controller.drain_events();
    let Some(config) = controller.config().cloned() else {
        return Err(TuningError::NotInitialized);
    };
    log::info!("Game initialized with seed: {}", opts.seed);

    let mut accumulator = 0.0;
    let mut sim_time = 0.0;
    let mut attempts = 1;
    'frames: while sim_time < opts.seconds {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = autopilot::steer(controller.state(), &config);
            let report = controller.tick(&input, SIM_DT);
            accumulator -= SIM_DT;
            sim_time += SIM_DT;
            substeps += 1;

            if report.events.contains(&TuningEvent::GameOver) {
                attempts += 1;
            }
            if report.snapshot.phase == Phase::Succeeded {
                break 'frames;
            }
        }
    }

    let snapshot = controller.snapshot();
    match snapshot.phase {
        Phase::Succeeded => println!(
            "chapter {}: tuned after {:.1}s ({} attempt{})",
            opts.chapter,
            sim_time,
            attempts,
            if attempts == 1 { "" } else { "s" }
        ),
        phase => println!(
            "chapter {}: not tuned after {:.1}s (phase {:?}, stability {:.2}, sync {:.2})",
            opts.chapter, sim_time, phase, snapshot.stability, snapshot.total_sync
        ),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Lost Tuning (headless) starting...");

    let opts = match parse_args() {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!(
                "usage: lost-tuning [--chapter N] [--seed S] [--stages FILE] [--seconds T] [--dump-stages]"
            );
            return ExitCode::from(2);
        }
    };

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // the controller has already logged its own setup errors
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
