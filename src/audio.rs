//! Optional pre-trial audio cue
//!
//! A spatialized cue plays from one of several sources around the
//! participant; the check passes if the head stays still (within a small
//! rotation tolerance) until the cue finishes. Sound playback itself is an
//! external collaborator behind `CuePlayer`.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::sim::PostureSample;

/// Extra listening time after the clip ends
pub const CUE_TAIL: f32 = 0.2;
/// Cue duration when no clip length is known
pub const DEFAULT_CUE_DURATION: f32 = 1.0;
/// Allowed head rotation while the cue plays
pub const ALLOWED_HEAD_ROTATION_DEGREES: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioCueOutcome {
    pub source_index: usize,
    pub within_tolerance: bool,
}

/// Cue check the orchestrator can run before a trial
pub trait AudioCue {
    /// Start the cue for a trial
    fn begin(&mut self, trial_index: usize, posture: Option<&PostureSample>, now: f32);
    /// Called once per tick until it yields an outcome
    fn poll(&mut self, posture: Option<&PostureSample>, now: f32) -> Option<AudioCueOutcome>;
}

/// Plays and stops the cue sound
pub trait CuePlayer {
    fn play(&mut self, source_index: usize);
    fn stop(&mut self);
}

/// Player that only logs (headless runs)
#[derive(Debug, Default)]
pub struct LogCuePlayer;

impl CuePlayer for LogCuePlayer {
    fn play(&mut self, source_index: usize) {
        log::info!("Audio cue playing from source {}", source_index);
    }

    fn stop(&mut self) {}
}

#[derive(Debug, Clone, Copy)]
struct ActiveCue {
    trial_index: usize,
    source_index: usize,
    started: f32,
    duration: f32,
    initial_forward: Option<Vec3>,
}

/// Passes when the head does not turn toward the cue too early
pub struct HeadStillCue<P: CuePlayer> {
    player: P,
    source_count: usize,
    clip_length: Option<f32>,
    allowed_degrees: f32,
    rng: Pcg32,
    active: Option<ActiveCue>,
}

impl<P: CuePlayer> HeadStillCue<P> {
    pub fn new(player: P, source_count: usize, clip_length: Option<f32>, rng: Pcg32) -> Self {
        Self {
            player,
            source_count: source_count.max(1),
            clip_length,
            allowed_degrees: ALLOWED_HEAD_ROTATION_DEGREES,
            rng,
            active: None,
        }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    fn duration(&self) -> f32 {
        self.clip_length
            .map(|len| len + CUE_TAIL)
            .unwrap_or(DEFAULT_CUE_DURATION)
    }

    fn finish(&mut self, cue: ActiveCue, within_tolerance: bool) -> AudioCueOutcome {
        self.player.stop();
        self.active = None;
        log::info!(
            "Audio cue for trial {} from source {}: {}",
            cue.trial_index,
            cue.source_index,
            if within_tolerance { "pass" } else { "head moved" }
        );
        AudioCueOutcome {
            source_index: cue.source_index,
            within_tolerance,
        }
    }
}

fn forward_of(posture: Option<&PostureSample>) -> Option<Vec3> {
    posture
        .map(|p| p.head_forward.normalize_or_zero())
        .filter(|f| *f != Vec3::ZERO)
}

impl<P: CuePlayer> AudioCue for HeadStillCue<P> {
    fn begin(&mut self, trial_index: usize, posture: Option<&PostureSample>, now: f32) {
        let source_index = self.rng.random_range(0..self.source_count);
        self.player.play(source_index);
        self.active = Some(ActiveCue {
            trial_index,
            source_index,
            started: now,
            duration: self.duration(),
            initial_forward: forward_of(posture),
        });
    }

    fn poll(&mut self, posture: Option<&PostureSample>, now: f32) -> Option<AudioCueOutcome> {
        let mut cue = self.active?;

        if let Some(current) = forward_of(posture) {
            match cue.initial_forward {
                Some(initial) => {
                    let degrees = initial.angle_between(current).to_degrees();
                    if degrees > self.allowed_degrees {
                        return Some(self.finish(cue, false));
                    }
                }
                None => {
                    cue.initial_forward = Some(current);
                    self.active = Some(cue);
                }
            }
        }

        if now - cue.started >= cue.duration {
            return Some(self.finish(cue, true));
        }
        None
    }
}
