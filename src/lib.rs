//! Exam seating generation.
//!
//! Students who share an exam subject, a section or a declared relationship
//! are kept apart: a conflict graph over the roster is colored with DSatur,
//! whole color classes are packed into rooms (first-fit decreasing with a
//! backtracking fallback) and each room is laid out on its seat grid.
//! [`solver::solve`] runs the whole pipeline; [`server`] exposes it over HTTP.

pub mod coloring;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod rooms;
pub mod seats;
pub mod server;
pub mod solver;
