//! Maps whole color classes onto rooms.
//!
//! First-Fit-Decreasing is tried first. If any class cannot be placed the partial
//! result is dropped and an exhaustive depth-first search runs over an explicit
//! stack of (class, room) decisions.

use crate::coloring::ColorClass;
use crate::data::{ColorId, Room, RoomId, Student, StudentId};
use crate::error::{InfeasibleError, Result};
use log::{debug, info, trace, warn};
use std::collections::{BTreeSet, HashMap};

/// Students assigned to one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomPlan {
    pub room_id: RoomId,
    /// Colors placed here, ascending.
    pub colors: Vec<ColorId>,
    /// Class by class in color order, ascending student id within a class.
    pub students: Vec<StudentId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomAssignment {
    /// One plan per room that received students, in inventory order.
    pub plans: Vec<RoomPlan>,
    pub used_backtracking: bool,
}

/// Composition of one color class.
struct ClassProfile<'a> {
    class: &'a ColorClass,
    years: BTreeSet<u32>,
    subjects: BTreeSet<&'a str>,
    branches: BTreeSet<&'a str>,
    departments: BTreeSet<&'a str>,
}

impl<'a> ClassProfile<'a> {
    fn new(class: &'a ColorClass, roster: &HashMap<StudentId, &'a Student>) -> Self {
        let members = class.students.iter().filter_map(|id| roster.get(id).copied());
        let mut profile = ClassProfile {
            class,
            years: BTreeSet::new(),
            subjects: BTreeSet::new(),
            branches: BTreeSet::new(),
            departments: BTreeSet::new(),
        };
        for student in members {
            profile.years.insert(student.year);
            profile.subjects.insert(student.subject.as_str());
            profile.branches.insert(student.branch.as_str());
            profile.departments.insert(student.department.as_str());
        }
        profile
    }

    fn size(&self) -> usize {
        self.class.len()
    }
}

/// What a room holds so far.
#[derive(Debug, Clone)]
struct RoomState<'a> {
    remaining: usize,
    years: BTreeSet<u32>,
    subjects: BTreeSet<&'a str>,
    branches: BTreeSet<&'a str>,
    departments: BTreeSet<&'a str>,
    classes: Vec<usize>,
}

impl<'a> RoomState<'a> {
    fn new(room: &Room) -> Self {
        RoomState {
            remaining: room.seat_limit(),
            years: BTreeSet::new(),
            subjects: BTreeSet::new(),
            branches: BTreeSet::new(),
            departments: BTreeSet::new(),
            classes: Vec::new(),
        }
    }

    /// Whether `profile` can join this room without breaking any of its limits.
    fn admits(&self, room: &Room, profile: &ClassProfile<'a>) -> bool {
        if profile.size() > self.remaining {
            return false;
        }
        if !profile.years.iter().all(|&y| room.admits_year(y)) {
            return false;
        }
        within_limit(room.max_years, &self.years, &profile.years)
            && within_limit(room.max_subjects, &self.subjects, &profile.subjects)
            && within_limit(room.max_branches, &self.branches, &profile.branches)
            && within_limit(room.max_departments, &self.departments, &profile.departments)
    }

    fn place(&mut self, profile: &ClassProfile<'a>, index: usize) {
        self.remaining -= profile.size();
        self.years.extend(profile.years.iter().copied());
        self.subjects.extend(profile.subjects.iter().copied());
        self.branches.extend(profile.branches.iter().copied());
        self.departments.extend(profile.departments.iter().copied());
        self.classes.push(index);
    }
}

/// A limit of 0 is unlimited.
fn within_limit<T: Ord>(limit: usize, held: &BTreeSet<T>, incoming: &BTreeSet<T>) -> bool {
    limit == 0 || held.union(incoming).count() <= limit
}

/// Assigns every class to exactly one of `rooms` (already validated).
pub fn assign(
    classes: &[ColorClass],
    roster: &[Student],
    rooms: &[&Room],
    max_steps: Option<u64>,
) -> Result<RoomAssignment> {
    let lookup: HashMap<StudentId, &Student> = roster.iter().map(|s| (s.id, s)).collect();
    let profiles: Vec<ClassProfile> = classes.iter().map(|c| ClassProfile::new(c, &lookup)).collect();

    check_feasible(&profiles, rooms)?;

    // descending size, color order among equals
    let mut order: Vec<usize> = (0..profiles.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(profiles[i].size()));

    info!(
        "Assigning {} color classes to {} rooms (first-fit decreasing)",
        profiles.len(),
        rooms.len()
    );
    if let Some(states) = first_fit_decreasing(&profiles, &order, rooms) {
        return Ok(RoomAssignment {
            plans: build_plans(&profiles, rooms, &states),
            used_backtracking: false,
        });
    }

    warn!("First-fit decreasing could not place every class, falling back to backtracking");
    let states = backtrack(&profiles, &order, rooms, max_steps)?;
    Ok(RoomAssignment {
        plans: build_plans(&profiles, rooms, &states),
        used_backtracking: true,
    })
}

/// Rejects inputs no assignment could satisfy before any search starts.
fn check_feasible(profiles: &[ClassProfile], rooms: &[&Room]) -> Result<()> {
    let needed: usize = profiles.iter().map(|p| p.size()).sum();
    let available: usize = rooms.iter().map(|r| r.seat_limit()).sum();
    if needed > available {
        return Err(InfeasibleError::InsufficientCapacity { needed, available }.into());
    }

    let largest = rooms.iter().map(|r| r.seat_limit()).max().unwrap_or(0);
    if let Some(p) = profiles.iter().find(|p| p.size() > largest) {
        return Err(InfeasibleError::OversizedClass {
            color: p.class.color,
            size: p.size(),
            largest,
        }
        .into());
    }
    Ok(())
}

fn first_fit_decreasing<'a>(
    profiles: &[ClassProfile<'a>],
    order: &[usize],
    rooms: &[&Room],
) -> Option<Vec<RoomState<'a>>> {
    let mut states: Vec<RoomState> = rooms.iter().map(|r| RoomState::new(r)).collect();

    for &index in order {
        let profile = &profiles[index];
        // least-full room first; inventory order among equals
        let mut by_remaining: Vec<usize> = (0..rooms.len()).collect();
        by_remaining.sort_by_key(|&r| std::cmp::Reverse(states[r].remaining));

        let target = by_remaining
            .into_iter()
            .find(|&r| states[r].admits(rooms[r], profile));
        match target {
            Some(r) => {
                trace!(
                    "Color {} ({} students) -> room {}",
                    profile.class.color,
                    profile.size(),
                    rooms[r].id
                );
                states[r].place(profile, index);
            }
            None => {
                debug!(
                    "No room for color {} ({} students) during first-fit decreasing",
                    profile.class.color,
                    profile.size()
                );
                return None;
            }
        }
    }
    Some(states)
}

/// One placed class on the search stack, with the room state it replaced.
struct Decision<'a> {
    room: usize,
    saved: RoomState<'a>,
}

fn backtrack<'a>(
    profiles: &[ClassProfile<'a>],
    order: &[usize],
    rooms: &[&Room],
    max_steps: Option<u64>,
) -> Result<Vec<RoomState<'a>>> {
    let mut states: Vec<RoomState> = rooms.iter().map(|r| RoomState::new(r)).collect();
    let mut stack: Vec<Decision> = Vec::with_capacity(order.len());
    let mut next_room = 0;
    let mut steps: u64 = 0;

    while stack.len() < order.len() {
        let index = order[stack.len()];
        let profile = &profiles[index];
        let candidate = (next_room..rooms.len()).find(|&r| states[r].admits(rooms[r], profile));

        match candidate {
            Some(r) => {
                steps += 1;
                if max_steps.is_some_and(|limit| steps > limit) {
                    warn!("Backtracking stopped after {} steps", steps - 1);
                    return Err(InfeasibleError::StepLimitReached(steps - 1).into());
                }
                let saved = states[r].clone();
                states[r].place(profile, index);
                stack.push(Decision { room: r, saved });
                next_room = 0;
            }
            None => match stack.pop() {
                Some(decision) => {
                    states[decision.room] = decision.saved;
                    next_room = decision.room + 1;
                }
                None => {
                    warn!("Backtracking exhausted every ordering after {} steps", steps);
                    return Err(InfeasibleError::SearchExhausted.into());
                }
            },
        }
    }

    info!("Backtracking found an assignment after {} steps", steps);
    Ok(states)
}

fn build_plans(profiles: &[ClassProfile], rooms: &[&Room], states: &[RoomState]) -> Vec<RoomPlan> {
    rooms
        .iter()
        .zip(states)
        .filter(|(_, state)| !state.classes.is_empty())
        .map(|(room, state)| {
            let mut placed: Vec<&ColorClass> =
                state.classes.iter().map(|&i| profiles[i].class).collect();
            placed.sort_by_key(|c| c.color);
            RoomPlan {
                room_id: room.id,
                colors: placed.iter().map(|c| c.color).collect(),
                students: placed
                    .iter()
                    .flat_map(|c| c.students.iter().copied())
                    .collect(),
            }
        })
        .collect()
}
