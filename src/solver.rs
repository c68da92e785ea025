//! Runs the whole seating pipeline for one session.

use crate::coloring::{color_classes, dsatur};
use crate::data::{ColorId, Room, RoomId, SeatingInput, SeatingOutput, SeatingStats, Student, StudentId};
use crate::error::{ConfigError, Result, SeatingError};
use crate::graph::{ConflictGraph, Relations};
use crate::rooms;
use crate::seats;
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Generates seating for one session: conflict graph, DSatur coloring, room
/// assignment and in-room placement.
///
/// Pure function of `input`; either every student is seated or an error is returned.
pub fn solve(input: &SeatingInput) -> Result<SeatingOutput> {
    let start_time = Instant::now();

    let usable = usable_rooms(&input.rooms)?;
    check_roster(&input.students)?;

    if input.students.is_empty() {
        info!("Empty roster, nothing to seat");
        return Ok(SeatingOutput::default());
    }

    info!(
        "Generating seating for {} students, {} relationships and {} rooms...",
        input.students.len(),
        input.relationships.len(),
        usable.len()
    );

    let relations = Relations::new(&input.relationships, &input.students);
    let graph = ConflictGraph::build(&input.students, &relations, &input.options);
    info!(
        "Conflict graph has {} edges (max degree {})",
        graph.edge_count(),
        graph.max_degree()
    );

    let vertex_colors = dsatur(&graph);
    let classes = color_classes(&graph, &vertex_colors);
    let colors: HashMap<StudentId, ColorId> = (0..graph.len())
        .map(|v| (graph.student(v), vertex_colors[v]))
        .collect();
    info!("Partitioned students into {} color classes", classes.len());

    let assignment = rooms::assign(
        &classes,
        &input.students,
        &usable,
        input.options.max_backtrack_steps,
    )?;

    let by_id: HashMap<RoomId, &Room> = usable.iter().map(|r| (r.id, *r)).collect();
    let mut output = SeatingOutput::default();
    let mut forced = 0;
    for plan in &assignment.plans {
        let room = by_id.get(&plan.room_id).ok_or_else(|| {
            SeatingError::InternalInvariant(format!("plan for unknown room {}", plan.room_id))
        })?;
        let seating = seats::place(room, plan, &colors, &graph, &relations)?;
        forced += seating.forced;
        output.assignments.extend(seating.assignments);
        output.warnings.extend(seating.warnings);
    }

    if output.assignments.len() != input.students.len() {
        return Err(SeatingError::InternalInvariant(format!(
            "seated {} of {} students",
            output.assignments.len(),
            input.students.len()
        )));
    }

    for warning in &output.warnings {
        warn!("Adjacency exception: {}", warning);
    }

    output.stats = SeatingStats {
        total_students: input.students.len(),
        conflict_edges: graph.edge_count(),
        relationship_pairs_applied: graph.relationship_pairs(),
        colors_used: classes.len(),
        rooms_used: assignment.plans.len(),
        used_backtracking: assignment.used_backtracking,
        forced_placements: forced,
        adjacency_warnings: output.warnings.len(),
    };

    info!(
        "Seated {} students in {} rooms with {} adjacency warnings in {:.2?}",
        output.stats.total_students,
        output.stats.rooms_used,
        output.stats.adjacency_warnings,
        start_time.elapsed()
    );
    Ok(output)
}

/// Rooms with a positive capacity and a non-empty, bounded grid, in inventory order.
fn usable_rooms(rooms: &[Room]) -> Result<Vec<&Room>> {
    if rooms.is_empty() {
        return Err(ConfigError::NoRooms.into());
    }

    let mut seen = HashSet::new();
    for room in rooms {
        if !seen.insert(room.id) {
            return Err(ConfigError::DuplicateRoom(room.id).into());
        }
    }

    let usable: Vec<&Room> = rooms
        .iter()
        .filter(|room| {
            let valid = room.is_valid();
            if !valid {
                warn!(
                    "Skipping room {}: capacity {} with a {}x{} grid",
                    room.id, room.capacity, room.columns, room.rows
                );
            }
            valid
        })
        .collect();

    if usable.is_empty() {
        return Err(ConfigError::NoValidRooms(rooms.len()).into());
    }
    Ok(usable)
}

fn check_roster(students: &[Student]) -> Result<()> {
    let mut seen = HashSet::new();
    match students.iter().find(|s| !seen.insert(s.id)) {
        Some(student) => Err(ConfigError::DuplicateStudent(student.id).into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GenerationOptions;
    use std::collections::BTreeSet;

    fn room(id: RoomId, capacity: u32, columns: u32, rows: u32) -> Room {
        Room {
            id,
            capacity,
            allowed_years: BTreeSet::new(),
            max_subjects: 0,
            max_branches: 0,
            max_years: 0,
            max_departments: 0,
            columns,
            rows,
        }
    }

    fn student(id: StudentId, subject: &str) -> Student {
        Student {
            id,
            year: 2,
            branch: "ECE".into(),
            section: String::new(),
            subject: subject.into(),
            department: String::new(),
        }
    }

    fn input(students: Vec<Student>, rooms: Vec<Room>) -> SeatingInput {
        SeatingInput {
            session_id: "2025-05-01-morning".into(),
            students,
            relationships: Vec::new(),
            rooms,
            options: GenerationOptions::default(),
        }
    }

    #[test]
    fn rejects_empty_inventory_even_for_empty_roster() {
        let err = solve(&input(Vec::new(), Vec::new())).unwrap_err();
        assert_eq!(err, SeatingError::Config(ConfigError::NoRooms));
    }

    #[test]
    fn rejects_inventory_without_usable_rooms() {
        let rooms = vec![room(1, 0, 5, 5), room(2, 10, 0, 3), room(3, 10, 400_000, 400_000)];
        let err = solve(&input(vec![student(1, "A")], rooms)).unwrap_err();
        assert_eq!(err, SeatingError::Config(ConfigError::NoValidRooms(3)));
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn skips_invalid_rooms() {
        let rooms = vec![room(1, 0, 5, 5), room(2, 4, 2, 2)];
        let output = solve(&input(vec![student(1, "A"), student(2, "B")], rooms)).unwrap();
        assert!(output.assignments.iter().all(|a| a.room_id == 2));
        assert_eq!(output.stats.rooms_used, 1);
    }

    #[test]
    fn rejects_duplicates() {
        let err = solve(&input(
            vec![student(1, "A")],
            vec![room(1, 4, 2, 2), room(1, 6, 3, 2)],
        ))
        .unwrap_err();
        assert_eq!(err, SeatingError::Config(ConfigError::DuplicateRoom(1)));

        let err = solve(&input(
            vec![student(3, "A"), student(3, "B")],
            vec![room(1, 4, 2, 2)],
        ))
        .unwrap_err();
        assert_eq!(err, SeatingError::Config(ConfigError::DuplicateStudent(3)));
    }

    #[test]
    fn same_subject_students_get_distinct_colors() {
        let students = vec![student(1, "MATH"), student(2, "MATH"), student(3, "PHY")];
        let output = solve(&input(students, vec![room(1, 6, 3, 2)])).unwrap();

        let color = |id: StudentId| {
            output
                .assignments
                .iter()
                .find(|a| a.student_id == id)
                .map(|a| a.color)
                .unwrap()
        };
        assert_ne!(color(1), color(2));
        assert_eq!(output.stats.colors_used, 2);
        assert_eq!(output.stats.conflict_edges, 1);
        assert!(!output.stats.used_backtracking);
    }
}
