//! Pitch Drill - reaction-time trial engine for virtual batting practice
//!
//! Core modules:
//! - `sim`: Deterministic, tick-driven trial core (pool, flights, dispatch, stance, orchestration)
//! - `results`: Result sinks (CSV, JSON lines, in-memory)
//! - `display`: Message/feedback surface the orchestrator drives
//! - `audio`: Optional pre-trial audio cue check
//! - `settings`: Data-driven session configuration

pub mod audio;
pub mod display;
pub mod error;
pub mod results;
pub mod settings;
pub mod sim;

pub use error::DrillError;
pub use settings::DrillSettings;

/// Session timing constants
pub mod consts {
    /// Fixed simulation timestep (90 Hz, a common headset refresh rate)
    pub const SIM_DT: f32 = 1.0 / 90.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Countdown counts shown before the first trial
    pub const COUNTDOWN_COUNTS: u32 = 3;
    /// Seconds each countdown count is held
    pub const COUNTDOWN_STEP: f32 = 1.0;
    /// Seconds the "Go!" flash is held
    pub const GO_FLASH: f32 = 0.5;

    /// Extra time after a throw's lifetime before the trial counts as a miss
    pub const OUTCOME_GRACE: f32 = 0.5;
    /// Seconds to wait for the participant to assume the required stance
    pub const STANCE_TIMEOUT: f32 = 5.0;
    /// Pause between trials
    pub const INTER_TRIAL_DELAY: f32 = 1.5;

    /// Delay between a hit and returning the object to the pool
    pub const HIT_RELEASE_DELAY: f32 = 1.0;
    /// Delay between world contact and returning the object to the pool
    pub const WORLD_RELEASE_DELAY: f32 = 0.5;
    /// Minimum implement speed (m/s) for a contact to count as a swing
    pub const MIN_SWING_SPEED: f32 = 1.2;

    /// Shortest blink/teleport interval a throw may use
    pub const MIN_APPEAR_INTERVAL: f32 = 1e-3;

    /// Distance along the forward axis used when no target is set
    pub const FORWARD_TARGET_DISTANCE: f32 = 8.0;

    /// Reaction time recorded for trials without a hit
    pub const MISS_REACTION_TIME: f32 = -1.0;
}

/// Clamp a value to [0, 1]
#[inline]
pub fn clamp01(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}
