//! Failure kinds reported by the pipeline.

use thiserror::Error;

use crate::data::{ColorId, RoomId, StudentId};

/// Problems with the supplied inventory or roster, detected before any computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("room inventory is empty")]
    NoRooms,
    #[error("none of the {0} rooms has a positive capacity and grid")]
    NoValidRooms(usize),
    #[error("room {0} appears more than once in the inventory")]
    DuplicateRoom(RoomId),
    #[error("student {0} appears more than once in the roster")]
    DuplicateStudent(StudentId),
}

/// The roster cannot be fitted into the rooms under their constraints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InfeasibleError {
    #[error("{needed} students but only {available} usable seats")]
    InsufficientCapacity { needed: usize, available: usize },
    #[error("color class {color} has {size} students but the largest room seats {largest}")]
    OversizedClass {
        color: ColorId,
        size: usize,
        largest: usize,
    },
    #[error("no room assignment satisfies the capacity and composition limits")]
    SearchExhausted,
    #[error("room assignment search gave up after {0} steps")]
    StepLimitReached(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatingError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("infeasible assignment: {0}")]
    Infeasible(#[from] InfeasibleError),
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl SeatingError {
    /// Stable machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SeatingError::Config(_) => "configuration",
            SeatingError::Infeasible(_) => "infeasible_assignment",
            SeatingError::InternalInvariant(_) => "internal_invariant",
        }
    }
}

pub type Result<T> = std::result::Result<T, SeatingError>;
