//! Pool of reusable launchable entities
//!
//! The pool owns every entity. Callers borrow one through an `EntityHandle`
//! for the duration of a single flight and hand it back exactly once.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::flight::Entity;
use crate::error::DrillError;

/// Identity of one flight of one pooled entity
///
/// The generation is bumped on every acquire, so a handle from an earlier
/// flight never matches the entity's current flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle {
    pub index: u32,
    pub generation: u32,
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug)]
pub struct ObjectPool {
    entities: Vec<Entity>,
    in_use: Vec<bool>,
    /// Idle slots, FIFO
    available: VecDeque<u32>,
    /// Hard ceiling on growth (None = unbounded)
    max_size: Option<usize>,
}

impl ObjectPool {
    /// Create a pool with `initial_size` idle entities
    pub fn new(initial_size: usize, max_size: Option<usize>) -> Self {
        let initial_size = match max_size {
            Some(max) => initial_size.min(max),
            None => initial_size,
        };
        let entities: Vec<Entity> = (0..initial_size as u32).map(Entity::new).collect();
        Self {
            in_use: vec![false; entities.len()],
            available: (0..initial_size as u32).collect(),
            entities,
            max_size,
        }
    }

    /// Hand out an idle entity, growing the pool if none is available
    pub fn acquire(&mut self) -> Result<EntityHandle, DrillError> {
        let index = match self.available.pop_front() {
            Some(index) => index,
            None => {
                if let Some(max) = self.max_size {
                    if self.entities.len() >= max {
                        return Err(DrillError::NoCapacity);
                    }
                }
                let index = self.entities.len() as u32;
                log::warn!(
                    "Object pool exhausted, growing to {} entities",
                    self.entities.len() + 1
                );
                self.entities.push(Entity::new(index));
                self.in_use.push(false);
                index
            }
        };

        let slot = index as usize;
        self.in_use[slot] = true;
        let entity = &mut self.entities[slot];
        entity.handle.generation = entity.handle.generation.wrapping_add(1);
        Ok(entity.handle)
    }

    /// Return an entity to the idle set
    ///
    /// Rejects stale handles and second releases of the same flight, so the
    /// available set never holds a duplicate slot.
    pub fn release(&mut self, handle: EntityHandle) -> Result<(), DrillError> {
        let slot = handle.index as usize;
        let entity = self
            .entities
            .get_mut(slot)
            .ok_or(DrillError::StaleHandle(handle))?;
        if entity.handle.generation != handle.generation {
            return Err(DrillError::StaleHandle(handle));
        }
        if !self.in_use[slot] {
            return Err(DrillError::DoubleRelease(handle));
        }

        entity.reset_idle();
        self.in_use[slot] = false;
        self.available.push_back(handle.index);
        Ok(())
    }

    /// True if the handle refers to the entity's current, unreleased flight
    pub fn is_live(&self, handle: EntityHandle) -> bool {
        let slot = handle.index as usize;
        self.entities
            .get(slot)
            .is_some_and(|e| e.handle.generation == handle.generation && self.in_use[slot])
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        if self.is_live(handle) {
            self.entities.get(handle.index as usize)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        if self.is_live(handle) {
            self.entities.get_mut(handle.index as usize)
        } else {
            None
        }
    }

    /// Entities currently borrowed (in slot order)
    pub fn in_flight(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .zip(self.in_use.iter())
            .filter(|(_, used)| **used)
            .map(|(e, _)| e)
    }

    /// Handles of every borrowed entity (in slot order)
    pub fn live_handles(&self) -> Vec<EntityHandle> {
        self.in_flight().map(|e| e.handle).collect()
    }

    /// Total entities owned by the pool
    pub fn capacity(&self) -> usize {
        self.entities.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use.iter().filter(|u| **u).count()
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Idle slots in queue order
    pub fn available_slots(&self) -> impl Iterator<Item = u32> + '_ {
        self.available.iter().copied()
    }
}
