//! Pitch Drill entry point
//!
//! Runs a full session headlessly against a simulated participant and
//! writes the trial summary as CSV.
//!
//! Usage: `pitch-drill [settings.json] [out.csv]`

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use pitch_drill::audio::{HeadStillCue, LogCuePlayer};
use pitch_drill::consts::*;
use pitch_drill::display::LogDisplay;
use pitch_drill::results::CsvSink;
use pitch_drill::sim::{
    Clock, Contact, EntityHandle, PostureSample, SessionPhase, StanceRequirement, TickInput,
    TrialOrchestrator,
};
use pitch_drill::DrillSettings;

/// Simulated frame time (headset compositor at 72 Hz)
const FRAME_DT: f32 = 1.0 / 72.0;
/// Give up if a session runs longer than this
const MAX_SESSION_SECONDS: f32 = 3600.0;
/// The bot swings once the object is this close to the plate
const SWING_RADIUS: f32 = 1.0;
/// Chance the bot connects with a pitch
const BOT_HIT_CHANCE: f64 = 0.7;
/// Speed of the bot's swing (m/s)
const BOT_SWING_SPEED: f32 = 4.0;
/// Seconds the bot takes to settle into a requested stance
const STANCE_SETTLE: f32 = 0.4;
const AUDIO_SOURCES: usize = 4;

/// Scripted participant standing at the plate
struct Participant {
    rng: Pcg32,
    stance: StanceRequirement,
    /// Trial the bot already decided on, and whether it will connect
    plan: Option<(EntityHandle, bool)>,
}

impl Participant {
    fn new(seed: u64, stance: StanceRequirement) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed ^ 0xba77),
            stance,
            plan: None,
        }
    }

    fn posture(&self, settled: bool) -> PostureSample {
        let stance = if settled { self.stance } else { StanceRequirement::None };
        let (left, right) = match stance {
            // Hands wide apart and level: matches nothing
            StanceRequirement::None => (Vec3::new(-0.6, 1.0, 0.0), Vec3::new(0.6, 1.0, 0.0)),
            StanceRequirement::FeetTogether => {
                (Vec3::new(-0.1, 1.0, 0.0), Vec3::new(0.1, 1.0, 0.0))
            }
            StanceRequirement::ShoulderWidth => {
                (Vec3::new(-0.3, 1.0, 0.0), Vec3::new(0.3, 1.0, 0.0))
            }
            StanceRequirement::Staggered => {
                (Vec3::new(-0.2, 1.0, 0.2), Vec3::new(0.2, 1.0, -0.2))
            }
        };
        PostureSample {
            head: Vec3::new(0.0, 1.7, 0.0),
            head_forward: Vec3::Z,
            left_hand: left,
            right_hand: right,
        }
    }

    /// Build this tick's input from what the session is showing
    fn react(
        &mut self,
        orch: &TrialOrchestrator<CsvSink<Box<dyn Write>>, LogDisplay>,
        plate: Vec3,
        now: f32,
    ) -> TickInput {
        let settled = match orch.phase() {
            SessionPhase::StanceWait(wait) => now - wait.started >= STANCE_SETTLE,
            _ => true,
        };
        let mut input = TickInput {
            posture: Some(self.posture(settled)),
            contacts: Vec::new(),
        };

        let SessionPhase::AwaitingOutcome { handle, .. } = orch.phase() else {
            return input;
        };

        let will_hit = match self.plan {
            Some((planned, will_hit)) if planned == handle => will_hit,
            _ => {
                let will_hit = self.rng.random_bool(BOT_HIT_CHANCE);
                self.plan = Some((handle, will_hit));
                will_hit
            }
        };

        if will_hit {
            let close = orch
                .pool()
                .get(handle)
                .is_some_and(|e| e.is_in_flight() && e.position.distance(plate) < SWING_RADIUS);
            if close {
                input.contacts.push(Contact::swing(handle, BOT_SWING_SPEED));
            }
        }
        input
    }
}

fn main() -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Pitch Drill (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => DrillSettings::load(&path)
            .with_context(|| format!("failed to load settings from {path}"))?,
        None => {
            log::info!("No settings file given, using defaults");
            DrillSettings::default()
        }
    };

    let out: Box<dyn Write> = match args.next() {
        Some(path) => Box::new(BufWriter::new(
            File::create(&path).with_context(|| format!("failed to create {path}"))?,
        )),
        None => Box::new(std::io::stdout()),
    };

    let range = &settings.range;
    let plate = range
        .target
        .or_else(|| range.origin.map(|o| o + range.forward * range.forward_distance))
        .unwrap_or(Vec3::ZERO);
    let mut participant = Participant::new(settings.seed, settings.required_stance);

    let wants_audio = settings.audio_cue_chance > 0.0;
    let seed = settings.seed;
    let mut orch = TrialOrchestrator::new(settings, CsvSink::new(out), LogDisplay::new());
    if wants_audio {
        let cue = HeadStillCue::new(LogCuePlayer, AUDIO_SOURCES, None, Pcg32::seed_from_u64(seed));
        orch = orch.with_audio_cue(Box::new(cue));
    }

    let mut clock = Clock::new(0.0, SIM_DT);
    orch.start_run(clock).context("could not start the session")?;

    // Fixed timestep accumulator, driven by simulated frames
    let mut accumulator = 0.0;
    while orch.is_running() {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = participant.react(&orch, plate, clock.now);
            clock = clock.advance();
            orch.tick(&input, clock);
            accumulator -= SIM_DT;
            substeps += 1;
        }

        if clock.now > MAX_SESSION_SECONDS {
            log::warn!("Session exceeded {MAX_SESSION_SECONDS}s, stopping");
            orch.stop();
        }
    }

    let records = orch.records();
    let hits: Vec<f32> = records
        .iter()
        .filter(|r| r.hit)
        .map(|r| r.reaction_time)
        .collect();
    let mean_rt = if hits.is_empty() {
        0.0
    } else {
        hits.iter().sum::<f32>() / hits.len() as f32
    };
    log::info!(
        "Finished: {} trials, {} hits, {} skipped, mean RT {:.3}s",
        records.len(),
        hits.len(),
        orch.skipped_trials(),
        mean_rt
    );

    let (sink, _) = orch.into_parts();
    sink.into_inner().flush().context("failed to flush results")?;
    Ok(())
}
