//! Error taxonomy for the trial engine
//!
//! Almost everything here is a skip-and-continue condition: the orchestrator
//! logs it and moves on to the next trial.

use std::fmt;

use crate::sim::EntityHandle;

/// A reference the dispatcher needs before it can launch anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Origin,
    Target,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Origin => f.write_str("launch origin"),
            ReferenceKind::Target => f.write_str("target point"),
        }
    }
}

#[derive(Debug)]
pub enum DrillError {
    /// No prototypes, no trials, or some other required configuration
    ConfigurationMissing(&'static str),
    /// A range reference is unset
    MissingReference(ReferenceKind),
    /// Pool is at its ceiling and nothing is idle
    NoCapacity,
    /// Handle was already returned to the pool
    DoubleRelease(EntityHandle),
    /// Handle refers to an older flight of a reused entity
    StaleHandle(EntityHandle),
    /// Throw configuration violates its invariants
    InvalidThrow { label: String, reason: &'static str },
    /// Trial list cannot change while a run is active
    RunActive,
    Io(std::io::Error),
    Settings(serde_json::Error),
}

impl fmt::Display for DrillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrillError::ConfigurationMissing(what) => write!(f, "configuration missing: {what}"),
            DrillError::MissingReference(kind) => write!(f, "{kind} is not set"),
            DrillError::NoCapacity => f.write_str("object pool has no capacity left"),
            DrillError::DoubleRelease(h) => write!(f, "entity {h} released twice"),
            DrillError::StaleHandle(h) => write!(f, "entity handle {h} is stale"),
            DrillError::InvalidThrow { label, reason } => {
                write!(f, "throw '{label}' is invalid: {reason}")
            }
            DrillError::RunActive => f.write_str("a run is active"),
            DrillError::Io(e) => write!(f, "i/o error: {e}"),
            DrillError::Settings(e) => write!(f, "settings error: {e}"),
        }
    }
}

impl std::error::Error for DrillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DrillError::Io(e) => Some(e),
            DrillError::Settings(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DrillError {
    fn from(e: std::io::Error) -> Self {
        DrillError::Io(e)
    }
}

impl From<serde_json::Error> for DrillError {
    fn from(e: serde_json::Error) -> Self {
        DrillError::Settings(e)
    }
}
