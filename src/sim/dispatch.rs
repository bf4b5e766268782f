//! Turns a trial's throw configuration into a launched entity

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::curve::QuadraticBezier;
use super::flight::{LaunchCommand, Motion, MotionEngine};
use super::pool::{EntityHandle, ObjectPool};
use super::state::{ThrowConfig, ThrowKind};
use crate::consts::FORWARD_TARGET_DISTANCE;
use crate::error::{DrillError, ReferenceKind};

/// Scene anchors the dispatcher aims with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeReferences {
    /// Where throws leave from
    pub origin: Option<Vec3>,
    /// Where throws are aimed (before the per-throw offset)
    pub target: Option<Vec3>,
    /// Direction the origin faces, used when no target is set
    pub forward: Vec3,
    pub forward_distance: f32,
}

impl Default for RangeReferences {
    fn default() -> Self {
        Self {
            origin: Some(Vec3::new(0.0, 1.5, 18.0)),
            target: Some(Vec3::new(0.0, 1.0, 0.0)),
            forward: Vec3::NEG_Z,
            forward_distance: FORWARD_TARGET_DISTANCE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThrowDispatcher {
    references: RangeReferences,
}

impl ThrowDispatcher {
    pub fn new(references: RangeReferences) -> Self {
        Self { references }
    }

    pub fn references(&self) -> &RangeReferences {
        &self.references
    }

    pub fn set_references(&mut self, references: RangeReferences) {
        self.references = references;
    }

    fn origin(&self) -> Result<Vec3, DrillError> {
        self.references
            .origin
            .ok_or(DrillError::MissingReference(ReferenceKind::Origin))
    }

    /// Aim point: target + offset, or a point straight ahead of the origin
    pub fn resolve_target(&self, config: &ThrowConfig) -> Result<Vec3, DrillError> {
        match self.references.target {
            Some(target) => Ok(target + config.target_offset),
            None => {
                let origin = self.origin()?;
                let forward = self.references.forward.normalize_or_zero();
                if forward == Vec3::ZERO {
                    return Err(DrillError::MissingReference(ReferenceKind::Target));
                }
                Ok(origin + forward * self.references.forward_distance + config.target_offset)
            }
        }
    }

    /// Build the launch command for one throw
    pub fn build_command(&self, config: &ThrowConfig) -> Result<LaunchCommand, DrillError> {
        config.validate()?;
        let origin = self.origin()?;
        let target = self.resolve_target(config)?;
        let velocity = (target - origin).normalize_or_zero() * config.speed;

        let (motion, lifetime) = match config.kind {
            ThrowKind::Basic => (Motion::Ballistic, config.lifetime),
            ThrowKind::AppearingDisappearing => (
                Motion::Appearing {
                    interval: config.appear_interval,
                    since_toggle: 0.0,
                },
                config.lifetime,
            ),
            // A curve's flight ends when it reaches the target
            ThrowKind::Curve => (
                Motion::Curve {
                    curve: QuadraticBezier::arched(origin, target, config.curve_height),
                    duration: config.curve_duration,
                },
                config.curve_duration,
            ),
        };

        Ok(LaunchCommand {
            origin,
            target,
            velocity,
            lifetime,
            motion,
        })
    }

    /// Acquire a pooled entity and launch it
    ///
    /// Nothing is taken from the pool unless the command can be built.
    pub fn spawn(
        &self,
        config: &ThrowConfig,
        pool: &mut ObjectPool,
        engine: &mut MotionEngine,
        now: f32,
    ) -> Result<EntityHandle, DrillError> {
        let cmd = self.build_command(config)?;
        let handle = pool.acquire()?;
        match pool.get_mut(handle) {
            Some(entity) => {
                engine.launch(entity, cmd, now);
                Ok(handle)
            }
            None => Err(DrillError::StaleHandle(handle)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::flight::{EngineSettings, FlightPhase};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn refs(origin: Option<Vec3>, target: Option<Vec3>) -> RangeReferences {
        RangeReferences {
            origin,
            target,
            forward: Vec3::Z,
            forward_distance: 8.0,
        }
    }

    fn engine() -> MotionEngine {
        MotionEngine::new(EngineSettings::default(), Pcg32::seed_from_u64(1))
    }

    #[test]
    fn test_target_includes_offset() {
        let dispatcher = ThrowDispatcher::new(refs(Some(Vec3::ZERO), Some(Vec3::new(0.0, 0.0, 10.0))));
        let cfg = ThrowConfig {
            target_offset: Vec3::new(0.5, 0.0, 0.0),
            ..Default::default()
        };
        let target = dispatcher.resolve_target(&cfg).unwrap();
        assert_eq!(target, Vec3::new(0.5, 0.0, 10.0));
    }

    #[test]
    fn test_forward_point_without_target() {
        let dispatcher = ThrowDispatcher::new(refs(Some(Vec3::new(0.0, 1.0, 0.0)), None));
        let target = dispatcher.resolve_target(&ThrowConfig::default()).unwrap();
        assert_eq!(target, Vec3::new(0.0, 1.0, 8.0));
    }

    #[test]
    fn test_basic_velocity_points_at_target() {
        let dispatcher = ThrowDispatcher::new(refs(Some(Vec3::ZERO), Some(Vec3::new(0.0, 0.0, 10.0))));
        let cmd = dispatcher.build_command(&ThrowConfig::default()).unwrap();
        assert!((cmd.velocity - Vec3::new(0.0, 0.0, 6.0)).length() < 1e-5);
        assert_eq!(cmd.lifetime, 6.0);
        assert_eq!(cmd.motion, Motion::Ballistic);
    }

    #[test]
    fn test_curve_command_uses_raised_control_point() {
        let dispatcher = ThrowDispatcher::new(refs(Some(Vec3::ZERO), Some(Vec3::new(0.0, 0.0, 10.0))));
        let cfg = ThrowConfig::of_kind(ThrowKind::Curve);
        let cmd = dispatcher.build_command(&cfg).unwrap();
        match cmd.motion {
            Motion::Curve { curve, duration } => {
                assert_eq!(curve.control, Vec3::new(0.0, 1.0, 5.0));
                assert_eq!(duration, 2.5);
            }
            other => panic!("expected curve motion, got {:?}", other),
        }
        assert_eq!(cmd.lifetime, 2.5);
    }

    #[test]
    fn test_spawn_without_origin_fails_and_keeps_pool() {
        let dispatcher = ThrowDispatcher::new(refs(None, Some(Vec3::Z)));
        let mut pool = ObjectPool::new(1, None);
        let mut engine = engine();

        let result = dispatcher.spawn(&ThrowConfig::default(), &mut pool, &mut engine, 0.0);
        assert!(matches!(
            result,
            Err(DrillError::MissingReference(ReferenceKind::Origin))
        ));
        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn test_spawn_invalid_config_fails() {
        let dispatcher = ThrowDispatcher::new(RangeReferences::default());
        let mut pool = ObjectPool::new(1, None);
        let mut engine = engine();
        let cfg = ThrowConfig {
            lifetime: 0.0,
            ..Default::default()
        };
        assert!(dispatcher.spawn(&cfg, &mut pool, &mut engine, 0.0).is_err());
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn test_spawn_no_capacity() {
        let dispatcher = ThrowDispatcher::new(RangeReferences::default());
        let mut pool = ObjectPool::new(1, Some(1));
        let mut engine = engine();
        let cfg = ThrowConfig::default();

        let first = dispatcher.spawn(&cfg, &mut pool, &mut engine, 0.0).unwrap();
        assert_eq!(pool.get(first).unwrap().phase, FlightPhase::InFlight);
        assert!(matches!(
            dispatcher.spawn(&cfg, &mut pool, &mut engine, 0.0),
            Err(DrillError::NoCapacity)
        ));
    }
}
