//! Trial session state machine
//!
//! Sequences countdown -> stance wait -> (audio cue) -> dispatch -> outcome
//! race -> logging -> inter-trial delay, one trial at a time. Driven by one
//! `tick` call per simulation step; all waiting is elapsed-time comparison
//! against the injected clock.

use rand_pcg::Pcg32;

use super::dispatch::{RangeReferences, ThrowDispatcher};
use super::flight::{FlightMessage, FlightOutcome, MotionEngine};
use super::pool::{EntityHandle, ObjectPool};
use super::stance::{StanceGate, StanceWait, StanceWaitOutcome};
use super::state::{Clock, PostureSample, RngState, StanceRequirement, ThrowConfig, TickInput};
use super::trial::{TrialPlan, TrialRecord, generate_trials};
use crate::audio::AudioCue;
use crate::display::FeedbackDisplay;
use crate::error::DrillError;
use crate::results::ResultSink;
use crate::settings::DrillSettings;

/// Upper bound on instantaneous transitions within one tick
const MAX_TRANSITIONS_PER_TICK: usize = 16;

/// Where the session currently is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionPhase {
    /// No run started
    Idle,
    /// Showing count `remaining` until `until`
    Countdown { remaining: u32, until: f32 },
    /// "Go!" flash
    Go { until: f32 },
    /// Waiting for the required stance
    StanceWait(StanceWait),
    /// Audio cue check running
    AudioCue,
    /// Racing the entity's hit message against the deadline
    AwaitingOutcome {
        handle: EntityHandle,
        spawn_time: f32,
        /// Seconds after spawn before the trial is a miss
        deadline: f32,
    },
    InterTrialDelay { until: f32 },
    /// Stopped externally
    Stopped,
    SessionComplete,
}

/// Trial being administered
#[derive(Debug, Clone)]
struct ActiveTrial {
    index: usize,
    plan: TrialPlan,
    audio_used: bool,
}

pub struct TrialOrchestrator<S: ResultSink, D: FeedbackDisplay> {
    settings: DrillSettings,
    /// Validated prototypes
    catalog: Vec<ThrowConfig>,
    trials: Vec<TrialPlan>,
    rng: Pcg32,
    pool: ObjectPool,
    engine: MotionEngine,
    dispatcher: ThrowDispatcher,
    stance: StanceGate,
    audio: Option<Box<dyn AudioCue>>,
    sink: S,
    display: D,
    phase: SessionPhase,
    active: Option<ActiveTrial>,
    next_index: usize,
    records: Vec<TrialRecord>,
    skipped: usize,
    latest_posture: Option<PostureSample>,
}

impl<S: ResultSink, D: FeedbackDisplay> TrialOrchestrator<S, D> {
    pub fn new(settings: DrillSettings, sink: S, display: D) -> Self {
        let rng_state = RngState::new(settings.seed);
        let catalog = settings.valid_catalog();
        if catalog.is_empty() {
            log::warn!("Pitch catalog is empty - no pitches available");
        }

        Self {
            catalog,
            trials: Vec::new(),
            rng: rng_state.fork(0),
            pool: ObjectPool::new(settings.pool.initial_size, settings.pool.max_size),
            engine: MotionEngine::new(settings.engine.clone(), rng_state.fork(1)),
            dispatcher: ThrowDispatcher::new(settings.range.clone()),
            stance: StanceGate::new(settings.stance_thresholds.clone()),
            audio: None,
            sink,
            display,
            phase: SessionPhase::Idle,
            active: None,
            next_index: 0,
            records: Vec::new(),
            skipped: 0,
            latest_posture: None,
            settings,
        }
    }

    /// Attach the audio cue collaborator
    pub fn with_audio_cue(mut self, cue: Box<dyn AudioCue>) -> Self {
        self.audio = Some(cue);
        self
    }

    pub fn is_running(&self) -> bool {
        !matches!(
            self.phase,
            SessionPhase::Idle | SessionPhase::Stopped | SessionPhase::SessionComplete
        )
    }

    /// Build a fresh randomized trial list from the catalog
    pub fn generate_trials(&mut self) -> Result<usize, DrillError> {
        if self.is_running() {
            return Err(DrillError::RunActive);
        }
        if self.catalog.is_empty() {
            self.trials.clear();
            log::warn!("Cannot generate trials: pitch catalog is empty");
            return Err(DrillError::ConfigurationMissing("pitch catalog"));
        }

        self.trials = generate_trials(
            &self.catalog,
            self.settings.total_pitches,
            self.settings.audio_cue_chance,
            &mut self.rng,
        );
        log::info!(
            "Generated randomized trial sequence with {} pitches",
            self.trials.len()
        );
        Ok(self.trials.len())
    }

    /// Append a copy of a config to the trial list
    pub fn add_trial(&mut self, config: &ThrowConfig) -> Result<(), DrillError> {
        if self.is_running() {
            return Err(DrillError::RunActive);
        }
        self.trials.push(TrialPlan::new(config.clone()));
        Ok(())
    }

    pub fn set_references(&mut self, references: RangeReferences) {
        self.dispatcher.set_references(references);
    }

    /// Start administering the trial list (no-op while already running)
    pub fn start_run(&mut self, clock: Clock) -> Result<(), DrillError> {
        if self.is_running() {
            log::debug!("start_run ignored: run already active");
            return Ok(());
        }
        if self.trials.is_empty() {
            log::warn!("Trial sequence is empty, generating trials now");
            self.generate_trials()?;
        }
        if self.trials.is_empty() {
            log::warn!("Trial sequence is still empty - nothing to run");
            return Err(DrillError::ConfigurationMissing("trial list"));
        }

        if let Err(e) = self.sink.start_session(&self.settings.player_label) {
            log::warn!("Result sink failed to start session: {}", e);
        }
        self.records.clear();
        self.skipped = 0;
        self.next_index = 0;
        self.active = None;

        log::info!("Run started with {} trials", self.trials.len());
        self.display.show_message("Get Ready...");
        self.phase = if self.settings.countdown_counts > 0 {
            self.display
                .show_message(&self.settings.countdown_counts.to_string());
            SessionPhase::Countdown {
                remaining: self.settings.countdown_counts,
                until: clock.now + self.settings.countdown_step,
            }
        } else {
            self.display.show_message("Go!");
            SessionPhase::Go {
                until: clock.now + self.settings.go_flash,
            }
        };
        Ok(())
    }

    /// Stop the run; flights already launched still expire and return to the pool
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        if let Some(active) = self.active.take() {
            log::info!("Trial {} abandoned by stop", active.index);
        }
        if let Err(e) = self.sink.finalize() {
            log::warn!("Result sink failed to finalize: {}", e);
        }
        log::info!("Run stopped after {} recorded trials", self.records.len());
        self.phase = SessionPhase::Stopped;
    }

    /// Advance one simulation tick
    pub fn tick(&mut self, input: &TickInput, clock: Clock) {
        self.stance.observe(input.posture);
        self.latest_posture = input.posture;

        self.engine
            .apply_contacts(&mut self.pool, &input.contacts, clock.now);
        self.engine.step(&mut self.pool, clock);
        let messages = self.engine.drain_messages();

        self.advance(&messages, clock);
    }

    /// Run phase transitions until the phase settles for this tick
    fn advance(&mut self, messages: &[FlightMessage], clock: Clock) {
        for _ in 0..MAX_TRANSITIONS_PER_TICK {
            let before = self.phase;
            self.advance_once(messages, clock);
            if self.phase == before {
                break;
            }
        }
    }

    fn advance_once(&mut self, messages: &[FlightMessage], clock: Clock) {
        let now = clock.now;
        match self.phase {
            SessionPhase::Idle | SessionPhase::Stopped | SessionPhase::SessionComplete => {}

            SessionPhase::Countdown { remaining, until } => {
                if now >= until {
                    if remaining > 1 {
                        self.display.show_message(&(remaining - 1).to_string());
                        self.phase = SessionPhase::Countdown {
                            remaining: remaining - 1,
                            until: until + self.settings.countdown_step,
                        };
                    } else {
                        self.display.show_message("Go!");
                        self.phase = SessionPhase::Go {
                            until: until + self.settings.go_flash,
                        };
                    }
                }
            }

            SessionPhase::Go { until } => {
                if now >= until {
                    self.display.clear_message();
                    self.begin_trial(clock);
                }
            }

            SessionPhase::StanceWait(wait) => {
                if let Some(outcome) = wait.poll(&mut self.stance, now) {
                    if outcome == StanceWaitOutcome::TimedOut {
                        log::info!(
                            "Stance {} not assumed within {:.1}s (observed {}), continuing",
                            wait.requirement.as_str(),
                            wait.timeout,
                            self.stance.current_stance().as_str()
                        );
                    }
                    self.after_stance(clock);
                }
            }

            SessionPhase::AudioCue => {
                let outcome = match self.audio.as_mut() {
                    Some(cue) => cue.poll(self.latest_posture.as_ref(), now),
                    None => None,
                };
                if outcome.is_some() || self.audio.is_none() {
                    if let Some(active) = self.active.as_mut() {
                        active.audio_used = outcome.is_some();
                    }
                    self.dispatch(clock);
                }
            }

            SessionPhase::AwaitingOutcome {
                handle,
                spawn_time,
                deadline,
            } => {
                // A hit in the same tick as the deadline wins
                let hit = messages
                    .iter()
                    .find(|m| m.handle == handle && m.outcome == FlightOutcome::Hit);
                if let Some(message) = hit {
                    let reaction = (message.at - spawn_time).clamp(0.0, deadline);
                    self.resolve(Some(reaction), spawn_time, clock);
                } else if now - spawn_time >= deadline {
                    self.resolve(None, spawn_time, clock);
                }
            }

            SessionPhase::InterTrialDelay { until } => {
                if now >= until {
                    self.begin_trial(clock);
                }
            }
        }
    }

    /// Pick the next usable slot and enter its first phase
    fn begin_trial(&mut self, clock: Clock) {
        loop {
            let Some(plan) = self.trials.get(self.next_index) else {
                self.complete_session();
                return;
            };
            match plan.config.validate() {
                Ok(()) => break,
                Err(e) => {
                    log::warn!("Trial slot {} skipped: {}", self.next_index, e);
                    self.skipped += 1;
                    self.next_index += 1;
                }
            }
        }

        let index = self.next_index;
        self.active = Some(ActiveTrial {
            index,
            plan: self.trials[index].clone(),
            audio_used: false,
        });

        let required = self.settings.required_stance;
        if required == StanceRequirement::None {
            self.after_stance(clock);
        } else {
            self.display
                .show_message(&format!("Assume stance: {}", required.as_str()));
            self.phase = SessionPhase::StanceWait(self.stance.await_until(
                required,
                self.settings.stance_timeout,
                clock.now,
            ));
        }
    }

    fn after_stance(&mut self, clock: Clock) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let wants_cue = active.plan.audio_cue;
        let index = active.index;

        match self.audio.as_mut() {
            Some(cue) if wants_cue => {
                cue.begin(index, self.latest_posture.as_ref(), clock.now);
                self.phase = SessionPhase::AudioCue;
            }
            _ => {
                if wants_cue {
                    log::debug!("Trial {} wants an audio cue but none is attached", index);
                }
                self.dispatch(clock);
            }
        }
    }

    fn dispatch(&mut self, clock: Clock) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let index = active.index;
        self.display
            .show_message(&format!("Trial {}/{}", index + 1, self.trials.len()));

        match self.dispatcher.spawn(
            &active.plan.config,
            &mut self.pool,
            &mut self.engine,
            clock.now,
        ) {
            Ok(handle) => {
                log::debug!(
                    "Trial {} spawned {} ({})",
                    index,
                    handle,
                    active.plan.config.kind.as_str()
                );
                self.phase = SessionPhase::AwaitingOutcome {
                    handle,
                    spawn_time: clock.now,
                    deadline: active.plan.config.lifetime + self.settings.outcome_grace,
                };
            }
            Err(e) => {
                log::warn!("Trial {} skipped, dispatch failed: {}", index, e);
                self.skipped += 1;
                self.active = None;
                self.next_index += 1;
                self.phase = SessionPhase::InterTrialDelay {
                    until: clock.now + self.settings.inter_trial_delay,
                };
            }
        }
    }

    /// Compose, log and display the trial result
    fn resolve(&mut self, reaction_time: Option<f32>, spawn_time: f32, clock: Clock) {
        let Some(active) = self.active.take() else {
            return;
        };
        let config = &active.plan.config;

        let mut record = match reaction_time {
            Some(rt) => TrialRecord::hit(active.index, config, spawn_time, clock.now, rt),
            None => TrialRecord::miss(active.index, config, spawn_time, clock.now),
        };
        record.required_stance = self.settings.required_stance;
        record.observed_stance = match self.settings.required_stance {
            StanceRequirement::None => None,
            _ => Some(self.stance.last_observed()),
        };
        record.audio_trial = active.audio_used;

        log::info!(
            "Trial {} ({}, {}): {} rt={:.4}",
            record.trial_index,
            record.label,
            record.kind.as_str(),
            record.note,
            record.reaction_time
        );

        if let Err(e) = self.sink.log_trial(&record) {
            log::warn!("Result sink failed to log trial {}: {}", record.trial_index, e);
        }
        self.display.show_outcome(record.hit, record.reaction_time);
        self.records.push(record);

        self.next_index += 1;
        self.phase = SessionPhase::InterTrialDelay {
            until: clock.now + self.settings.inter_trial_delay,
        };
    }

    fn complete_session(&mut self) {
        self.active = None;
        if let Err(e) = self.sink.finalize() {
            log::warn!("Result sink failed to finalize: {}", e);
        }
        let hits = self.records.iter().filter(|r| r.hit).count();
        log::info!(
            "Session complete: {}/{} hits, {} skipped",
            hits,
            self.records.len(),
            self.skipped
        );
        self.display.show_message("Session complete!");
        self.phase = SessionPhase::SessionComplete;
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn trials(&self) -> &[TrialPlan] {
        &self.trials
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn skipped_trials(&self) -> usize {
        self.skipped
    }

    pub fn settings(&self) -> &DrillSettings {
        &self.settings
    }

    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    pub fn stance(&self) -> &StanceGate {
        &self.stance
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn into_parts(self) -> (S, D) {
        (self.sink, self.display)
    }
}
