//! Positions the students of one room on its grid.

use crate::data::{AdjacencyWarning, ColorId, Room, SeatAssignment, StudentId};
use crate::error::{Result, SeatingError};
use crate::graph::{ConflictGraph, Relations};
use crate::rooms::RoomPlan;
use log::{debug, warn};
use std::collections::HashMap;

/// Seats and diagnostics produced for one room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomSeating {
    /// Ascending seat number.
    pub assignments: Vec<SeatAssignment>,
    pub warnings: Vec<AdjacencyWarning>,
    /// Students that had to take a seat next to a related student.
    pub forced: usize,
}

struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<StudentId>>,
}

impl Grid {
    fn new(room: &Room) -> Self {
        Grid {
            columns: room.columns,
            rows: room.rows,
            cells: vec![None; room.columns as usize * room.rows as usize],
        }
    }

    fn coords(&self, cell: usize) -> (u32, u32) {
        let columns = self.columns as usize;
        ((cell % columns) as u32, (cell / columns) as u32)
    }

    /// 1-based, row-major.
    fn seat_number(&self, cell: usize) -> u32 {
        cell as u32 + 1
    }

    /// Cells sharing an edge or a corner with `cell`.
    fn neighbors(&self, cell: usize) -> impl Iterator<Item = usize> {
        let (columns, rows) = (self.columns as i64, self.rows as i64);
        let (x, y) = self.coords(cell);
        let (x, y) = (x as i64, y as i64);
        (-1..=1i64)
            .flat_map(move |dy| (-1..=1i64).map(move |dx| (x + dx, y + dy)))
            .filter(move |&(nx, ny)| {
                (nx, ny) != (x, y) && nx >= 0 && ny >= 0 && nx < columns && ny < rows
            })
            .map(move |(nx, ny)| (ny * columns + nx) as usize)
    }

    fn is_free(&self, cell: usize) -> bool {
        self.cells[cell].is_none()
    }

    fn next_to_related(&self, cell: usize, student: StudentId, relations: &Relations) -> bool {
        self.neighbors(cell)
            .filter_map(|n| self.cells[n])
            .any(|other| relations.are_related(student, other))
    }

    /// Every other cell in row-major order, then the remaining ones.
    fn spread_order(&self) -> impl Iterator<Item = usize> + '_ {
        let even = (0..self.cells.len()).filter(move |&c| self.parity(c) == 0);
        let odd = (0..self.cells.len()).filter(move |&c| self.parity(c) == 1);
        even.chain(odd)
    }

    fn parity(&self, cell: usize) -> u32 {
        let (x, y) = self.coords(cell);
        (x + y) % 2
    }
}

/// Seats the students of `plan` in `room`.
///
/// When any two occupants conflict each student takes the first free cell,
/// row-major, that does not touch an already seated relation; if there is none
/// it takes the first free cell and the placement is counted as forced.
/// Otherwise the room is filled with the even/odd spread.
pub fn place(
    room: &Room,
    plan: &RoomPlan,
    colors: &HashMap<StudentId, ColorId>,
    graph: &ConflictGraph,
    relations: &Relations,
) -> Result<RoomSeating> {
    if plan.students.len() > room.seat_limit() {
        return Err(SeatingError::InternalInvariant(format!(
            "room {} received {} students but seats {}",
            room.id,
            plan.students.len(),
            room.seat_limit()
        )));
    }

    let mut grid = Grid::new(room);
    // relationships count even when they were left out of the graph
    let has_conflicts = plan.students.iter().enumerate().any(|(i, &a)| {
        plan.students[i + 1..]
            .iter()
            .any(|&b| graph.conflicts(a, b) || relations.are_related(a, b))
    });

    let mut forced = 0;
    if has_conflicts {
        for &student in &plan.students {
            let free: Vec<usize> = (0..grid.cells.len()).filter(|&c| grid.is_free(c)).collect();
            let cell = match free
                .iter()
                .copied()
                .find(|&c| !grid.next_to_related(c, student, relations))
            {
                Some(cell) => cell,
                None => {
                    forced += 1;
                    let cell = first_free(&free, room, student)?;
                    warn!(
                        "Room {}: student {} seated next to a related student (seat {})",
                        room.id,
                        student,
                        grid.seat_number(cell)
                    );
                    cell
                }
            };
            grid.cells[cell] = Some(student);
        }
    } else {
        let cells: Vec<usize> = grid.spread_order().take(plan.students.len()).collect();
        for (&student, cell) in plan.students.iter().zip(cells) {
            grid.cells[cell] = Some(student);
        }
    }

    let mut assignments = Vec::with_capacity(plan.students.len());
    for (cell, student) in grid.cells.iter().enumerate() {
        let Some(student) = *student else { continue };
        let (x, y) = grid.coords(cell);
        let color = colors.get(&student).copied().ok_or_else(|| {
            SeatingError::InternalInvariant(format!("student {} has no color", student))
        })?;
        assignments.push(SeatAssignment {
            student_id: student,
            room_id: room.id,
            x,
            y,
            seat_number: grid.seat_number(cell),
            color,
        });
    }

    let warnings = adjacency_warnings(&grid, room, relations);
    debug!(
        "Room {}: {} seated, {} forced, {} adjacency warnings",
        room.id,
        assignments.len(),
        forced,
        warnings.len()
    );

    Ok(RoomSeating {
        assignments,
        warnings,
        forced,
    })
}

fn first_free(free: &[usize], room: &Room, student: StudentId) -> Result<usize> {
    free.first().copied().ok_or_else(|| {
        SeatingError::InternalInvariant(format!(
            "room {} has no free seat for student {}",
            room.id, student
        ))
    })
}

/// One warning per related pair seated 8-adjacent, lower student id first.
fn adjacency_warnings(grid: &Grid, room: &Room, relations: &Relations) -> Vec<AdjacencyWarning> {
    let mut warnings = Vec::new();
    for (cell, a) in grid.cells.iter().enumerate() {
        let Some(a) = *a else { continue };
        for n in grid.neighbors(cell) {
            let Some(b) = grid.cells[n] else { continue };
            if a >= b {
                continue;
            }
            if let Some(kind) = relations.kind(a, b) {
                warnings.push(AdjacencyWarning {
                    student_a: a,
                    student_b: b,
                    room_id: room.id,
                    seat_a: grid.seat_number(cell),
                    seat_b: grid.seat_number(n),
                    kind,
                });
            }
        }
    }
    warnings.sort_by_key(|w| (w.student_a, w.student_b));
    warnings
}
