//! Core simulation types shared by every trial component
//!
//! Throw prototypes, stance classes, the injected clock, and the per-tick
//! input the external driver hands the orchestrator.

use glam::Vec3;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pool::EntityHandle;
use crate::consts::MIN_APPEAR_INTERVAL;
use crate::error::DrillError;

/// Kinematic behavior of a launched object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThrowKind {
    /// Straight-line flight at constant launch velocity
    #[default]
    Basic,
    /// Straight-line flight with periodic blinking or teleporting
    AppearingDisappearing,
    /// Quadratic Bézier arc, moved manually every tick
    Curve,
}

impl ThrowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThrowKind::Basic => "Basic",
            ThrowKind::AppearingDisappearing => "AppearingDisappearing",
            ThrowKind::Curve => "Curve",
        }
    }
}

/// Description of one pitch type
///
/// Trial lists hold value copies of these, so mutating one slot never
/// touches the catalog or a sibling slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowConfig {
    pub kind: ThrowKind,
    /// Launch speed (m/s) for Basic / AppearingDisappearing
    pub speed: f32,
    /// Maximum flight time before the throw counts as missed
    pub lifetime: f32,
    /// Blink/teleport period for AppearingDisappearing
    pub appear_interval: f32,
    /// Control point height above the origin-target midpoint
    pub curve_height: f32,
    /// Time to traverse the whole curve
    pub curve_duration: f32,
    /// Offset added to the target point
    pub target_offset: Vec3,
    /// Friendly label for result files
    pub label: String,
}

impl Default for ThrowConfig {
    fn default() -> Self {
        Self {
            kind: ThrowKind::Basic,
            speed: 6.0,
            lifetime: 6.0,
            appear_interval: 0.12,
            curve_height: 1.0,
            curve_duration: 2.5,
            target_offset: Vec3::ZERO,
            label: "VisionThrow".to_string(),
        }
    }
}

impl ThrowConfig {
    /// A prototype of the given kind with default parameters
    pub fn of_kind(kind: ThrowKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Check speed > 0 and lifetime > 0 (and that the kind's own timing is usable)
    pub fn validate(&self) -> Result<(), DrillError> {
        let invalid = |reason| DrillError::InvalidThrow {
            label: self.label.clone(),
            reason,
        };
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(invalid("speed must be positive"));
        }
        if !(self.lifetime.is_finite() && self.lifetime > 0.0) {
            return Err(invalid("lifetime must be positive"));
        }
        match self.kind {
            ThrowKind::Curve if !(self.curve_duration.is_finite() && self.curve_duration > 0.0) => {
                Err(invalid("curve duration must be positive"))
            }
            ThrowKind::AppearingDisappearing
                if !(self.appear_interval.is_finite()
                    && self.appear_interval >= MIN_APPEAR_INTERVAL) =>
            {
                Err(invalid("appear interval too short"))
            }
            _ if !self.target_offset.is_finite() => Err(invalid("target offset must be finite")),
            _ => Ok(()),
        }
    }
}

/// Required (or last observed) body posture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StanceRequirement {
    #[default]
    None,
    FeetTogether,
    ShoulderWidth,
    Staggered,
}

impl StanceRequirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            StanceRequirement::None => "None",
            StanceRequirement::FeetTogether => "FeetTogether",
            StanceRequirement::ShoulderWidth => "ShoulderWidth",
            StanceRequirement::Staggered => "Staggered",
        }
    }
}

/// Time source injected into every tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Clock {
    /// Seconds since the driver started
    pub now: f32,
    /// Seconds elapsed since the previous tick
    pub dt: f32,
}

impl Clock {
    pub fn new(now: f32, dt: f32) -> Self {
        Self { now, dt }
    }

    /// Clock for the following tick
    pub fn advance(self) -> Self {
        Self {
            now: self.now + self.dt,
            dt: self.dt,
        }
    }
}

/// Tracked world positions from the posture feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureSample {
    pub head: Vec3,
    /// Unit vector the head is facing
    pub head_forward: Vec3,
    pub left_hand: Vec3,
    pub right_hand: Vec3,
}

impl PostureSample {
    /// Distance between the two tracked hands
    pub fn hand_distance(&self) -> f32 {
        self.left_hand.distance(self.right_hand)
    }

    /// Signed depth (z) offset between the hands
    pub fn lateral_offset(&self) -> f32 {
        self.left_hand.z - self.right_hand.z
    }
}

/// How the external physics layer detected the contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContactSource {
    /// Solid-body collision
    #[default]
    Collision,
    /// Trigger-volume overlap
    TriggerOverlap,
}

/// What the launched object touched
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactSurface {
    /// The handheld striking implement
    Implement {
        /// Implement speed at contact (m/s)
        speed: f32,
        /// Velocity the collision response wants to impart, if any
        response_velocity: Option<Vec3>,
    },
    /// Ground or any other world geometry
    World,
}

/// Contact reported by the external collision layer for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub handle: EntityHandle,
    pub source: ContactSource,
    pub surface: ContactSurface,
}

impl Contact {
    /// Implement collision with no collision response
    pub fn swing(handle: EntityHandle, speed: f32) -> Self {
        Self {
            handle,
            source: ContactSource::Collision,
            surface: ContactSurface::Implement {
                speed,
                response_velocity: None,
            },
        }
    }

    /// World/ground collision
    pub fn world(handle: EntityHandle) -> Self {
        Self {
            handle,
            source: ContactSource::Collision,
            surface: ContactSurface::World,
        }
    }
}

/// Inputs for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Latest posture sample, if the tracker produced one
    pub posture: Option<PostureSample>,
    /// Contacts reported since the previous tick
    pub contacts: Vec<Contact>,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Independent generator for one subsystem
    pub fn fork(&self, stream: u64) -> Pcg32 {
        Pcg32::new(self.seed, self.stream.wrapping_add(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        for kind in [
            ThrowKind::Basic,
            ThrowKind::Curve,
            ThrowKind::AppearingDisappearing,
        ] {
            assert!(ThrowConfig::of_kind(kind).validate().is_ok());
        }
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        let cfg = ThrowConfig {
            speed: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(DrillError::InvalidThrow { .. })
        ));

        let cfg = ThrowConfig {
            lifetime: -1.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = ThrowConfig {
            speed: f32::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_tiny_appear_interval() {
        let cfg = ThrowConfig {
            appear_interval: 1e-12,
            ..ThrowConfig::of_kind(ThrowKind::AppearingDisappearing)
        };
        assert!(matches!(
            cfg.validate(),
            Err(DrillError::InvalidThrow { .. })
        ));

        let cfg = ThrowConfig {
            appear_interval: MIN_APPEAR_INTERVAL,
            ..ThrowConfig::of_kind(ThrowKind::AppearingDisappearing)
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_posture_metrics() {
        let sample = PostureSample {
            head: Vec3::new(0.0, 1.7, 0.0),
            head_forward: Vec3::Z,
            left_hand: Vec3::new(-0.3, 1.0, 0.1),
            right_hand: Vec3::new(0.3, 1.0, -0.1),
        };
        assert!((sample.lateral_offset() - 0.2).abs() < 1e-6);
        assert!((sample.hand_distance() - (0.36f32 + 0.04).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_clock_advance() {
        let clock = Clock::new(1.0, 0.5).advance().advance();
        assert!((clock.now - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ThrowKind::Basic.as_str(), "Basic");
        assert_eq!(StanceRequirement::Staggered.as_str(), "Staggered");
    }
}
