//! Deterministic trial simulation
//!
//! All trial logic lives here. This module must be pure and deterministic:
//! - Time only arrives through the injected `Clock`
//! - Seeded RNG only
//! - Stable iteration order (by pool slot)
//! - No rendering, sound playback or platform dependencies

pub mod curve;
pub mod dispatch;
pub mod flight;
pub mod orchestrator;
pub mod pool;
pub mod stance;
pub mod state;
pub mod trial;

pub use curve::QuadraticBezier;
pub use dispatch::{RangeReferences, ThrowDispatcher};
pub use flight::{
    AppearTactic, EngineSettings, Entity, FlightMessage, FlightOutcome, FlightPhase,
    HitTrigger, LaunchCommand, MotionEngine, Motion, PlayVolume,
};
pub use orchestrator::{SessionPhase, TrialOrchestrator};
pub use pool::{EntityHandle, ObjectPool};
pub use stance::{StanceGate, StanceThresholds, StanceWait, StanceWaitOutcome};
pub use state::{
    Clock, Contact, ContactSource, ContactSurface, PostureSample, RngState, StanceRequirement,
    ThrowConfig, ThrowKind, TickInput,
};
pub use trial::{TrialPlan, TrialRecord, generate_trials};
