//! Posture gating from tracked hand positions
//!
//! Only relative distances are used: inter-hand distance for FeetTogether
//! and ShoulderWidth, and the depth offset between hands for Staggered.

use serde::{Deserialize, Serialize};

use super::state::{PostureSample, StanceRequirement};

/// Classification thresholds (meters)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StanceThresholds {
    /// Hands closer than this => feet together
    pub feet_together: f32,
    pub shoulder_min: f32,
    pub shoulder_max: f32,
    /// |Δz| between hands above this => staggered
    pub stagger: f32,
}

impl Default for StanceThresholds {
    fn default() -> Self {
        Self {
            feet_together: 0.45,
            shoulder_min: 0.45,
            shoulder_max: 0.8,
            stagger: 0.2,
        }
    }
}

impl StanceThresholds {
    pub fn satisfies(&self, sample: &PostureSample, requirement: StanceRequirement) -> bool {
        let hand_dist = sample.hand_distance();
        match requirement {
            StanceRequirement::None => true,
            StanceRequirement::FeetTogether => hand_dist < self.feet_together,
            StanceRequirement::ShoulderWidth => {
                hand_dist >= self.shoulder_min && hand_dist <= self.shoulder_max
            }
            StanceRequirement::Staggered => sample.lateral_offset().abs() > self.stagger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StanceWaitOutcome {
    Satisfied,
    TimedOut,
}

#[derive(Debug, Clone, Default)]
pub struct StanceGate {
    thresholds: StanceThresholds,
    latest: Option<PostureSample>,
    last_observed: StanceRequirement,
}

impl StanceGate {
    pub fn new(thresholds: StanceThresholds) -> Self {
        Self {
            thresholds,
            latest: None,
            last_observed: StanceRequirement::None,
        }
    }

    /// Record this tick's tracker sample; a tick without one clears the last
    pub fn observe(&mut self, sample: Option<PostureSample>) {
        self.latest = sample;
    }

    /// Best-matching stance for a sample
    pub fn classify(&self, sample: &PostureSample) -> StanceRequirement {
        [
            StanceRequirement::FeetTogether,
            StanceRequirement::ShoulderWidth,
            StanceRequirement::Staggered,
        ]
        .into_iter()
        .find(|s| self.thresholds.satisfies(sample, *s))
        .unwrap_or(StanceRequirement::None)
    }

    /// Classification of the current sample (None without one)
    pub fn current_stance(&self) -> StanceRequirement {
        self.latest
            .as_ref()
            .map(|s| self.classify(s))
            .unwrap_or(StanceRequirement::None)
    }

    /// Whether the latest sample meets the requirement (false without a sample)
    pub fn currently_satisfies(&self, requirement: StanceRequirement) -> bool {
        if requirement == StanceRequirement::None {
            return true;
        }
        self.latest
            .as_ref()
            .is_some_and(|s| self.thresholds.satisfies(s, requirement))
    }

    /// Last stance confirmed by a wait (None until one succeeds)
    pub fn last_observed(&self) -> StanceRequirement {
        self.last_observed
    }

    /// Start waiting for a stance; poll the returned wait once per tick
    pub fn await_until(&self, requirement: StanceRequirement, timeout: f32, now: f32) -> StanceWait {
        StanceWait {
            requirement,
            started: now,
            timeout,
        }
    }
}

/// An in-progress stance wait
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StanceWait {
    pub requirement: StanceRequirement,
    pub started: f32,
    pub timeout: f32,
}

impl StanceWait {
    /// Check once; `None` means keep waiting
    ///
    /// A timeout leaves the gate's last observation untouched.
    pub fn poll(&self, gate: &mut StanceGate, now: f32) -> Option<StanceWaitOutcome> {
        if gate.currently_satisfies(self.requirement) {
            gate.last_observed = self.requirement;
            return Some(StanceWaitOutcome::Satisfied);
        }
        if now - self.started >= self.timeout {
            return Some(StanceWaitOutcome::TimedOut);
        }
        None
    }
}
