//! Wire records for seating requests and results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// Type aliases for clarity
pub type StudentId = u32;
pub type RoomId = u32;
pub type ColorId = usize;

/// Largest seat grid a room may declare.
pub const MAX_GRID_CELLS: u64 = 100_000;

/// An examinee to be seated for one session.
///
/// `section` and `subject` are compared verbatim; an empty string means
/// "unknown" and never produces a conflict on its own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub year: u32,
    pub branch: String,
    pub section: String,
    pub subject: String,
    #[serde(default)]
    pub department: String,
}

/// Kind of a declared relationship between two students.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    #[default]
    Friend,
    Relative,
    SameHostel,
    SameRoom,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationshipKind::Friend => "friend",
            RelationshipKind::Relative => "relative",
            RelationshipKind::SameHostel => "same_hostel",
            RelationshipKind::SameRoom => "same_room",
        };
        f.write_str(name)
    }
}

/// A declared relationship. The pair is unordered; see [`RelationshipEdge::pair`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEdge {
    pub student_a: StudentId,
    pub student_b: StudentId,
    #[serde(default)]
    pub kind: RelationshipKind,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl RelationshipEdge {
    /// The pair canonicalized as (low id, high id).
    pub fn pair(&self) -> (StudentId, StudentId) {
        if self.student_a <= self.student_b {
            (self.student_a, self.student_b)
        } else {
            (self.student_b, self.student_a)
        }
    }
}

/// A physical exam room.
///
/// Composition limits set to 0 are unlimited, and an empty `allowed_years`
/// admits every year.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub capacity: u32,
    #[serde(default)]
    pub allowed_years: BTreeSet<u32>,
    #[serde(default)]
    pub max_subjects: usize,
    #[serde(default)]
    pub max_branches: usize,
    #[serde(default)]
    pub max_years: usize,
    #[serde(default)]
    pub max_departments: usize,
    pub columns: u32,
    pub rows: u32,
}

impl Room {
    pub fn is_valid(&self) -> bool {
        let cells = u64::from(self.columns) * u64::from(self.rows);
        self.capacity > 0 && cells > 0 && cells <= MAX_GRID_CELLS
    }

    /// Number of students the room can actually seat: its capacity, bounded by the grid.
    pub fn seat_limit(&self) -> usize {
        let cells = self.columns as usize * self.rows as usize;
        cells.min(self.capacity as usize)
    }

    pub fn admits_year(&self, year: u32) -> bool {
        self.allowed_years.is_empty() || self.allowed_years.contains(&year)
    }
}

/// Per-run knobs supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default = "default_true")]
    pub enable_friend_separation: bool,
    #[serde(default = "default_true")]
    pub enable_section_separation: bool,
    /// Cap on decisions made by the backtracking fallback. `None` searches without bound.
    #[serde(default = "default_max_backtrack_steps")]
    pub max_backtrack_steps: Option<u64>,
}

pub const DEFAULT_MAX_BACKTRACK_STEPS: u64 = 1_000_000;

fn default_true() -> bool {
    true
}

fn default_max_backtrack_steps() -> Option<u64> {
    Some(DEFAULT_MAX_BACKTRACK_STEPS)
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            enable_friend_separation: true,
            enable_section_separation: true,
            max_backtrack_steps: default_max_backtrack_steps(),
        }
    }
}

/// The complete input for one seating generation run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingInput {
    /// Exam/session key. Only used by callers to serialize regeneration.
    #[serde(default)]
    pub session_id: String,
    pub students: Vec<Student>,
    #[serde(default)]
    pub relationships: Vec<RelationshipEdge>,
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub options: GenerationOptions,
}

/// Represents a single seated student.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct SeatAssignment {
    pub student_id: StudentId,
    pub room_id: RoomId,
    pub x: u32,
    pub y: u32,
    pub seat_number: u32,
    pub color: ColorId,
}

/// Two related students that ended up in 8-adjacent seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacencyWarning {
    pub student_a: StudentId,
    pub student_b: StudentId,
    pub room_id: RoomId,
    pub seat_a: u32,
    pub seat_b: u32,
    pub kind: RelationshipKind,
}

impl fmt::Display for AdjacencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] students {} and {} are adjacent in room {} (seats {} and {})",
            self.kind, self.student_a, self.student_b, self.room_id, self.seat_a, self.seat_b
        )
    }
}

/// Summary figures for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingStats {
    pub total_students: usize,
    pub conflict_edges: usize,
    pub relationship_pairs_applied: usize,
    pub colors_used: usize,
    pub rooms_used: usize,
    pub used_backtracking: bool,
    pub forced_placements: usize,
    pub adjacency_warnings: usize,
}

/// The final output of the solver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingOutput {
    pub assignments: Vec<SeatAssignment>,
    pub warnings: Vec<AdjacencyWarning>,
    pub stats: SeatingStats,
}
