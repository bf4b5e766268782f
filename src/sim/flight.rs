//! Per-flight motion and outcome state machine
//!
//! Each pooled entity runs Idle -> InFlight -> {Hit, Expired} for one flight.
//! Terminal outcomes are posted as `FlightMessage`s on the engine's outbox,
//! which the orchestrator drains once per tick. Release back to the pool
//! happens exactly once, from `MotionEngine::step`.

use std::collections::VecDeque;

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::curve::QuadraticBezier;
use super::pool::{EntityHandle, ObjectPool};
use super::state::{Clock, Contact, ContactSource, ContactSurface, ThrowKind};
use crate::consts::*;

/// How a flight ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightOutcome {
    /// Struck by the implement
    Hit,
    /// Lifetime ran out or the object touched the world
    Expired,
}

/// Lifecycle of a pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlightPhase {
    /// Not launched (parked in the pool or freshly acquired)
    Idle,
    /// Moving, can still be hit
    InFlight,
    /// Outcome decided, waiting out the settle delay before release
    Resolving {
        outcome: FlightOutcome,
        release_at: f32,
    },
}

/// Kinematic behavior for the current flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Constant velocity; external collision response may change it
    Ballistic,
    /// Moved manually along a curve, ignores external velocity
    Curve {
        curve: QuadraticBezier,
        duration: f32,
    },
    /// Ballistic with a periodic blink or teleport
    Appearing { interval: f32, since_toggle: f32 },
}

impl Motion {
    pub fn kind(&self) -> ThrowKind {
        match self {
            Motion::Ballistic => ThrowKind::Basic,
            Motion::Curve { .. } => ThrowKind::Curve,
            Motion::Appearing { .. } => ThrowKind::AppearingDisappearing,
        }
    }
}

/// A launchable object owned by the pool
#[derive(Debug, Clone)]
pub struct Entity {
    pub handle: EntityHandle,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Cosmetic only; never consulted for contacts
    pub visible: bool,
    pub phase: FlightPhase,
    pub motion: Motion,
    pub launch_time: f32,
    pub lifetime: f32,
    pub target: Vec3,
}

impl Entity {
    pub fn new(index: u32) -> Self {
        Self {
            handle: EntityHandle {
                index,
                generation: 0,
            },
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            visible: true,
            phase: FlightPhase::Idle,
            motion: Motion::Ballistic,
            launch_time: 0.0,
            lifetime: 0.0,
            target: Vec3::ZERO,
        }
    }

    /// Canonical parked state (keeps identity)
    pub fn reset_idle(&mut self) {
        self.position = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.visible = true;
        self.phase = FlightPhase::Idle;
        self.motion = Motion::Ballistic;
        self.launch_time = 0.0;
        self.lifetime = 0.0;
        self.target = Vec3::ZERO;
    }

    pub fn kind(&self) -> ThrowKind {
        self.motion.kind()
    }

    /// Still hittable
    pub fn is_in_flight(&self) -> bool {
        self.phase == FlightPhase::InFlight
    }
}

/// Everything the engine needs to start one flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchCommand {
    pub origin: Vec3,
    pub target: Vec3,
    /// Initial velocity (ignored by curves)
    pub velocity: Vec3,
    /// Seconds until the flight expires unhit
    pub lifetime: f32,
    pub motion: Motion,
}

/// Posted when a flight reaches a terminal outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightMessage {
    pub handle: EntityHandle,
    pub outcome: FlightOutcome,
    /// Clock time of the transition
    pub at: f32,
}

/// Which contact source counts as a strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitTrigger {
    #[default]
    Collision,
    TriggerOverlap,
    Either,
}

impl HitTrigger {
    pub fn accepts(&self, source: ContactSource) -> bool {
        match self {
            HitTrigger::Collision => source == ContactSource::Collision,
            HitTrigger::TriggerOverlap => source == ContactSource::TriggerOverlap,
            HitTrigger::Either => true,
        }
    }
}

/// What AppearingDisappearing throws do every interval
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AppearTactic {
    /// Toggle visibility, keep moving along the launch line
    #[default]
    BlinkInPlace,
    /// Jump to a random point inside the box, keep the launch velocity
    TeleportInView { min: Vec3, max: Vec3 },
}

/// Axis-aligned box the objects are allowed to fly in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayVolume {
    pub min: Vec3,
    pub max: Vec3,
}

impl PlayVolume {
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Nearest point inside the volume
    pub fn clamp(&self, point: Vec3) -> Vec3 {
        point.max(self.min).min(self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Settle time between a hit and release
    pub hit_release_delay: f32,
    /// Settle time between world contact and release
    pub world_release_delay: f32,
    /// Implement contacts slower than this are ignored
    pub min_swing_speed: f32,
    pub hit_trigger: HitTrigger,
    pub appear_tactic: AppearTactic,
    /// Leaving this volume counts as world contact
    pub play_volume: Option<PlayVolume>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            hit_release_delay: HIT_RELEASE_DELAY,
            world_release_delay: WORLD_RELEASE_DELAY,
            min_swing_speed: MIN_SWING_SPEED,
            hit_trigger: HitTrigger::Collision,
            appear_tactic: AppearTactic::BlinkInPlace,
            play_volume: Some(PlayVolume {
                min: Vec3::new(-20.0, 0.0, -20.0),
                max: Vec3::new(20.0, 20.0, 40.0),
            }),
        }
    }
}

/// Drives every borrowed entity once per tick
pub struct MotionEngine {
    settings: EngineSettings,
    rng: Pcg32,
    outbox: VecDeque<FlightMessage>,
}

impl MotionEngine {
    pub fn new(settings: EngineSettings, rng: Pcg32) -> Self {
        Self {
            settings,
            rng,
            outbox: VecDeque::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Start a flight, discarding whatever state the entity was in
    pub fn launch(&mut self, entity: &mut Entity, cmd: LaunchCommand, now: f32) {
        entity.position = cmd.origin;
        entity.velocity = match cmd.motion {
            Motion::Curve { .. } => Vec3::ZERO,
            _ => cmd.velocity,
        };
        entity.visible = true;
        entity.motion = cmd.motion;
        entity.launch_time = now;
        entity.lifetime = cmd.lifetime;
        entity.target = cmd.target;
        entity.phase = FlightPhase::InFlight;

        log::debug!(
            "Launched {} ({}) from {:?} toward {:?}",
            entity.handle,
            entity.kind().as_str(),
            cmd.origin,
            cmd.target
        );
    }

    /// Feed this tick's contacts to their entities (stale handles are ignored)
    pub fn apply_contacts(&mut self, pool: &mut ObjectPool, contacts: &[Contact], now: f32) {
        for contact in contacts {
            match pool.get_mut(contact.handle) {
                Some(entity) => self.register_contact(entity, contact, now),
                None => log::debug!("Ignoring contact for stale entity {}", contact.handle),
            }
        }
    }

    /// Resolve a single contact against an entity
    ///
    /// Only the first accepted contact of a flight changes anything.
    pub fn register_contact(&mut self, entity: &mut Entity, contact: &Contact, now: f32) {
        if !entity.is_in_flight() {
            return;
        }

        match contact.surface {
            ContactSurface::Implement {
                speed,
                response_velocity,
            } => {
                if !self.settings.hit_trigger.accepts(contact.source) {
                    return;
                }
                if speed < self.settings.min_swing_speed {
                    log::debug!(
                        "Contact on {} too slow ({:.2} m/s), ignored",
                        entity.handle,
                        speed
                    );
                    return;
                }
                // Curves are kinematic and ignore collision response
                if let Some(v) = response_velocity {
                    if !matches!(entity.motion, Motion::Curve { .. }) {
                        entity.velocity = v;
                    }
                }
                self.resolve(entity, FlightOutcome::Hit, now, self.settings.hit_release_delay);
            }
            ContactSurface::World => {
                self.resolve(
                    entity,
                    FlightOutcome::Expired,
                    now,
                    self.settings.world_release_delay,
                );
            }
        }
    }

    fn resolve(&mut self, entity: &mut Entity, outcome: FlightOutcome, now: f32, delay: f32) {
        entity.visible = true;
        entity.phase = FlightPhase::Resolving {
            outcome,
            release_at: now + delay,
        };
        self.outbox.push_back(FlightMessage {
            handle: entity.handle,
            outcome,
            at: now,
        });
        log::debug!("Flight {} resolved: {:?} at {:.4}", entity.handle, outcome, now);
    }

    /// Advance every borrowed entity and release the ones whose flight is over
    pub fn step(&mut self, pool: &mut ObjectPool, clock: Clock) {
        for handle in pool.live_handles() {
            let release_due = match pool.get_mut(handle) {
                Some(entity) => self.advance(entity, clock),
                None => false,
            };
            if release_due {
                if let Err(e) = pool.release(handle) {
                    log::warn!("Release of {} failed: {}", handle, e);
                }
            }
        }
    }

    /// Move one entity; returns true when it should go back to the pool
    fn advance(&mut self, entity: &mut Entity, clock: Clock) -> bool {
        match entity.phase {
            FlightPhase::Idle => false,
            FlightPhase::InFlight => {
                let elapsed = clock.now - entity.launch_time;
                self.integrate(entity, elapsed, clock.dt);

                if elapsed >= entity.lifetime {
                    entity.phase = FlightPhase::Resolving {
                        outcome: FlightOutcome::Expired,
                        release_at: clock.now,
                    };
                    self.outbox.push_back(FlightMessage {
                        handle: entity.handle,
                        outcome: FlightOutcome::Expired,
                        at: clock.now,
                    });
                    log::debug!("Flight {} expired after {:.4}s", entity.handle, elapsed);
                    return true;
                }

                if let Some(volume) = self.settings.play_volume {
                    if !volume.contains(entity.position) {
                        self.resolve(
                            entity,
                            FlightOutcome::Expired,
                            clock.now,
                            self.settings.world_release_delay,
                        );
                    }
                }
                false
            }
            FlightPhase::Resolving {
                outcome,
                release_at,
            } => {
                // Struck straight-line throws keep their post-contact velocity
                if outcome == FlightOutcome::Hit && !matches!(entity.motion, Motion::Curve { .. }) {
                    entity.position += entity.velocity * clock.dt;
                }
                clock.now >= release_at
            }
        }
    }

    fn integrate(&mut self, entity: &mut Entity, elapsed: f32, dt: f32) {
        match entity.motion {
            Motion::Ballistic => {
                entity.position += entity.velocity * dt;
            }
            Motion::Curve { curve, duration } => {
                entity.position = curve.point_after(elapsed, duration);
            }
            Motion::Appearing {
                interval,
                since_toggle,
            } => {
                entity.position += entity.velocity * dt;
                let since_toggle = since_toggle + dt;
                // Whole intervals elapsed this tick
                let periods = if interval > 0.0 {
                    (since_toggle / interval).floor()
                } else {
                    0.0
                };
                let since_toggle = (since_toggle - periods * interval).max(0.0);
                if periods >= 1.0 {
                    match self.settings.appear_tactic {
                        AppearTactic::BlinkInPlace => {
                            if periods % 2.0 == 1.0 {
                                entity.visible = !entity.visible;
                            }
                        }
                        AppearTactic::TeleportInView { min, max } => {
                            let point = self.random_point(min, max);
                            entity.position = match self.settings.play_volume {
                                Some(volume) => volume.clamp(point),
                                None => point,
                            };
                        }
                    }
                }
                entity.motion = Motion::Appearing {
                    interval,
                    since_toggle,
                };
            }
        }
    }

    fn random_point(&mut self, a: Vec3, b: Vec3) -> Vec3 {
        let (lo, hi) = (a.min(b), a.max(b));
        Vec3::new(
            self.rng.random_range(lo.x..=hi.x),
            self.rng.random_range(lo.y..=hi.y),
            self.rng.random_range(lo.z..=hi.z),
        )
    }

    /// Take every message posted since the last drain
    pub fn drain_messages(&mut self) -> Vec<FlightMessage> {
        self.outbox.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const DT: f32 = 0.01;

    fn engine(settings: EngineSettings) -> MotionEngine {
        MotionEngine::new(settings, Pcg32::seed_from_u64(7))
    }

    fn no_volume() -> EngineSettings {
        EngineSettings {
            play_volume: None,
            ..Default::default()
        }
    }

    fn basic_command(velocity: Vec3, lifetime: f32) -> LaunchCommand {
        LaunchCommand {
            origin: Vec3::ZERO,
            target: velocity * lifetime,
            velocity,
            lifetime,
            motion: Motion::Ballistic,
        }
    }

    /// Launch into a one-entity pool at t = 0
    fn launched(engine: &mut MotionEngine, cmd: LaunchCommand) -> (ObjectPool, EntityHandle) {
        let mut pool = ObjectPool::new(1, None);
        let h = pool.acquire().unwrap();
        engine.launch(pool.get_mut(h).unwrap(), cmd, 0.0);
        (pool, h)
    }

    fn run(engine: &mut MotionEngine, pool: &mut ObjectPool, from: f32, ticks: usize) -> Clock {
        let mut clock = Clock::new(from, DT);
        for _ in 0..ticks {
            clock = clock.advance();
            engine.step(pool, clock);
        }
        clock
    }

    #[test]
    fn test_basic_flight_is_linear() {
        let mut engine = engine(no_volume());
        let v = Vec3::new(0.0, 0.0, 6.0);
        let (mut pool, h) = launched(&mut engine, basic_command(v, 6.0));

        run(&mut engine, &mut pool, 0.0, 50);
        let pos = pool.get(h).unwrap().position;
        assert!((pos - v * 0.5).length() < 1e-3);

        run(&mut engine, &mut pool, 0.5, 50);
        let pos = pool.get(h).unwrap().position;
        assert!((pos - v * 1.0).length() < 1e-3);
    }

    #[test]
    fn test_curve_flight_follows_bezier() {
        let mut engine = engine(no_volume());
        let curve = QuadraticBezier::arched(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), 1.0);
        let cmd = LaunchCommand {
            origin: curve.start,
            target: curve.end,
            velocity: Vec3::new(0.0, 0.0, 100.0),
            lifetime: 2.5,
            motion: Motion::Curve {
                curve,
                duration: 2.5,
            },
        };
        let (mut pool, h) = launched(&mut engine, cmd);
        assert_eq!(pool.get(h).unwrap().velocity, Vec3::ZERO);

        run(&mut engine, &mut pool, 0.0, 125);
        let pos = pool.get(h).unwrap().position;
        assert!((pos - Vec3::new(0.0, 0.5, 5.0)).length() < 1e-2);
    }

    #[test]
    fn test_hit_only_counts_once() {
        let mut engine = engine(no_volume());
        let (mut pool, h) = launched(&mut engine, basic_command(Vec3::Z * 6.0, 6.0));

        let contacts = [Contact::swing(h, 3.0), Contact::swing(h, 3.0)];
        engine.apply_contacts(&mut pool, &contacts, 0.4);
        engine.apply_contacts(&mut pool, &contacts[..1], 0.45);

        let messages = engine.drain_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].outcome, FlightOutcome::Hit);
        assert_eq!(messages[0].handle, h);
        assert!((messages[0].at - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_hit_releases_after_grace_delay() {
        let mut engine = engine(no_volume());
        let (mut pool, h) = launched(&mut engine, basic_command(Vec3::Z * 6.0, 6.0));
        engine.apply_contacts(&mut pool, &[Contact::swing(h, 3.0)], 0.0);

        run(&mut engine, &mut pool, 0.0, 50);
        assert!(pool.is_live(h), "release waits for the settle delay");

        run(&mut engine, &mut pool, 0.5, 60);
        assert!(!pool.is_live(h));
        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn test_response_velocity_applies_to_ballistic_only() {
        let mut engine = engine(no_volume());
        let (mut pool, h) = launched(&mut engine, basic_command(Vec3::Z * 6.0, 6.0));
        let contact = Contact {
            handle: h,
            source: ContactSource::Collision,
            surface: ContactSurface::Implement {
                speed: 4.0,
                response_velocity: Some(Vec3::new(0.0, 2.0, -8.0)),
            },
        };
        engine.apply_contacts(&mut pool, &[contact], 0.0);
        assert_eq!(pool.get(h).unwrap().velocity, Vec3::new(0.0, 2.0, -8.0));
    }

    #[test]
    fn test_slow_contact_ignored() {
        let mut engine = engine(no_volume());
        let (mut pool, h) = launched(&mut engine, basic_command(Vec3::Z, 6.0));
        engine.apply_contacts(&mut pool, &[Contact::swing(h, 0.5)], 0.1);
        assert!(engine.drain_messages().is_empty());
        assert!(pool.get(h).unwrap().is_in_flight());
    }

    #[test]
    fn test_hit_trigger_tactic_filters_source() {
        let mut engine = engine(EngineSettings {
            hit_trigger: HitTrigger::TriggerOverlap,
            ..no_volume()
        });
        let (mut pool, h) = launched(&mut engine, basic_command(Vec3::Z, 6.0));

        engine.apply_contacts(&mut pool, &[Contact::swing(h, 3.0)], 0.1);
        assert!(engine.drain_messages().is_empty());

        let overlap = Contact {
            source: ContactSource::TriggerOverlap,
            ..Contact::swing(h, 3.0)
        };
        engine.apply_contacts(&mut pool, &[overlap], 0.2);
        assert_eq!(engine.drain_messages().len(), 1);
    }

    #[test]
    fn test_lifetime_expiry_releases_once() {
        let mut engine = engine(no_volume());
        let (mut pool, h) = launched(&mut engine, basic_command(Vec3::Z, 1.0));

        run(&mut engine, &mut pool, 0.0, 150);
        assert!(!pool.is_live(h));
        let messages = engine.drain_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].outcome, FlightOutcome::Expired);
        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn test_world_contact_releases_sooner() {
        let mut engine = engine(no_volume());
        let (mut pool, h) = launched(&mut engine, basic_command(Vec3::Z, 6.0));
        engine.apply_contacts(&mut pool, &[Contact::world(h)], 0.0);

        // A swing after touching the ground no longer counts
        engine.apply_contacts(&mut pool, &[Contact::swing(h, 3.0)], 0.1);

        run(&mut engine, &mut pool, 0.0, 60);
        assert!(!pool.is_live(h));
        let messages = engine.drain_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].outcome, FlightOutcome::Expired);
    }

    #[test]
    fn test_leaving_play_volume_expires() {
        let mut engine = engine(EngineSettings {
            play_volume: Some(PlayVolume {
                min: Vec3::splat(-1.0),
                max: Vec3::splat(1.0),
            }),
            ..Default::default()
        });
        let (mut pool, h) = launched(&mut engine, basic_command(Vec3::Z * 10.0, 6.0));

        run(&mut engine, &mut pool, 0.0, 20);
        let entity = pool.get(h).unwrap();
        assert!(matches!(
            entity.phase,
            FlightPhase::Resolving {
                outcome: FlightOutcome::Expired,
                ..
            }
        ));
    }

    #[test]
    fn test_relaunch_cancels_pending_release() {
        let mut engine = engine(no_volume());
        let (mut pool, h) = launched(&mut engine, basic_command(Vec3::Z, 6.0));
        engine.apply_contacts(&mut pool, &[Contact::swing(h, 3.0)], 0.0);

        engine.launch(pool.get_mut(h).unwrap(), basic_command(Vec3::X, 6.0), 0.5);
        run(&mut engine, &mut pool, 0.5, 100);

        let entity = pool.get(h).unwrap();
        assert!(entity.is_in_flight());
        assert!((entity.position - Vec3::X).length() < 1e-3);
    }

    #[test]
    fn test_blink_does_not_change_path() {
        let mut engine = engine(no_volume());
        let cmd = LaunchCommand {
            motion: Motion::Appearing {
                interval: 0.12,
                since_toggle: 0.0,
            },
            ..basic_command(Vec3::Z * 6.0, 6.0)
        };
        let (mut pool, h) = launched(&mut engine, cmd);

        let mut saw_hidden = false;
        let mut clock = Clock::new(0.0, DT);
        for _ in 0..100 {
            clock = clock.advance();
            engine.step(&mut pool, clock);
            saw_hidden |= !pool.get(h).unwrap().visible;
        }
        assert!(saw_hidden);
        let pos = pool.get(h).unwrap().position;
        assert!((pos - Vec3::Z * 6.0).length() < 1e-2);
    }

    #[test]
    fn test_teleport_stays_in_view_box() {
        let min = Vec3::new(-1.0, 1.0, 4.0);
        let max = Vec3::new(1.0, 2.0, 6.0);
        let mut engine = engine(EngineSettings {
            appear_tactic: AppearTactic::TeleportInView { min, max },
            ..no_volume()
        });
        let cmd = LaunchCommand {
            velocity: Vec3::ZERO,
            motion: Motion::Appearing {
                interval: 0.05,
                since_toggle: 0.0,
            },
            ..basic_command(Vec3::ZERO, 6.0)
        };
        let (mut pool, h) = launched(&mut engine, cmd);

        let mut clock = Clock::new(0.0, DT);
        for _ in 0..50 {
            clock = clock.advance();
            engine.step(&mut pool, clock);
        }
        let entity = pool.get(h).unwrap();
        assert!(entity.visible);
        assert!(PlayVolume { min, max }.contains(entity.position));
    }

    #[test]
    fn test_tiny_interval_step_returns() {
        let mut engine = engine(no_volume());
        let cmd = LaunchCommand {
            motion: Motion::Appearing {
                interval: 1e-12,
                since_toggle: 0.0,
            },
            ..basic_command(Vec3::Z * 6.0, 6.0)
        };
        let (mut pool, h) = launched(&mut engine, cmd);

        engine.step(&mut pool, Clock::new(0.01, 0.01));
        let entity = pool.get(h).unwrap();
        assert!(entity.is_in_flight());
        match entity.motion {
            Motion::Appearing { since_toggle, .. } => assert!(since_toggle >= 0.0),
            other => panic!("unexpected motion {:?}", other),
        }
    }

    #[test]
    fn test_blink_toggles_once_per_odd_period_count() {
        let mut engine = engine(no_volume());
        let cmd = LaunchCommand {
            motion: Motion::Appearing {
                interval: 0.004,
                since_toggle: 0.0,
            },
            ..basic_command(Vec3::Z, 6.0)
        };
        let (mut pool, h) = launched(&mut engine, cmd);

        // 0.01 / 0.004 = 2 whole intervals: visible again
        engine.step(&mut pool, Clock::new(0.01, 0.01));
        assert!(pool.get(h).unwrap().visible);
        // 0.002 + 0.011 = 3.25 intervals: hidden
        engine.step(&mut pool, Clock::new(0.021, 0.011));
        assert!(!pool.get(h).unwrap().visible);
    }

    #[test]
    fn test_teleport_clamped_to_play_volume() {
        let volume = PlayVolume {
            min: Vec3::new(-2.0, 0.0, -2.0),
            max: Vec3::new(2.0, 4.0, 2.0),
        };
        let mut engine = engine(EngineSettings {
            appear_tactic: AppearTactic::TeleportInView {
                min: Vec3::new(10.0, 1.0, 10.0),
                max: Vec3::new(12.0, 2.0, 12.0),
            },
            play_volume: Some(volume),
            ..Default::default()
        });
        let cmd = LaunchCommand {
            velocity: Vec3::ZERO,
            motion: Motion::Appearing {
                interval: 0.05,
                since_toggle: 0.0,
            },
            ..basic_command(Vec3::ZERO, 6.0)
        };
        let (mut pool, h) = launched(&mut engine, cmd);

        run(&mut engine, &mut pool, 0.0, 20);
        let entity = pool.get(h).unwrap();
        assert!(entity.is_in_flight(), "teleport must not leave the volume");
        assert!(volume.contains(entity.position));
        assert!(engine.drain_messages().is_empty());
    }

    #[test]
    fn test_stale_contact_ignored() {
        let mut engine = engine(no_volume());
        let (mut pool, old) = launched(&mut engine, basic_command(Vec3::Z, 0.05));
        run(&mut engine, &mut pool, 0.0, 10);
        engine.drain_messages();

        let fresh = pool.acquire().unwrap();
        engine.launch(pool.get_mut(fresh).unwrap(), basic_command(Vec3::Z, 6.0), 0.1);
        engine.apply_contacts(&mut pool, &[Contact::swing(old, 3.0)], 0.2);

        assert!(engine.drain_messages().is_empty());
        assert!(pool.get(fresh).unwrap().is_in_flight());
    }
}
