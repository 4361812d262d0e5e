#![warn(missing_docs)]

//! # `enclose`
//!
//! A solver for grid enclosure puzzles: given a rectangular grid holding one source cell, water
//! cells, bonus cells and paired portal cells, choose at most `wall_budget` cells to block so
//! that the territory reachable from the source is as valuable as possible.
//! Begin by building a [`Puzzle`] with a [`PuzzleBuilder`] or by parsing
//! a raw marker grid with [`Puzzle::from_markers`]. Call [`solve()`](Puzzle::solve) with a
//! [`SolveConfig`] to obtain an [`Enclosure`] holding the wall and reachability grids and the
//! achieved score.
//!
//! # Internals
//! This crate is driven by expressing the puzzle as a mixed-integer linear program (a MILP),
//! handing it to a generic 0/1-and-continuous solver ([`good_lp`] over the pure-Rust `microlp`
//! backend), and re-expressing the optimum as grid-shaped arrays.
//!
//! Reachability cannot be a plain graph search here, because walls may only stand where they
//! make sense relative to the very reachability they shape; the two must be found together to
//! be globally optimal. Nor can it be left to unconstrained 0/1 variables: a pure boundary
//! formulation cannot tell "unreachable because walled off" from "unreachable because the
//! solver said so", and cannot prevent reached islands with no connection to the source at all.
//!
//! The model therefore routes a single-commodity flow out of the source. Every reached cell
//! except the source consumes exactly one unit, the source supplies one unit per reached cell,
//! flow is conserved across every edge, and flow is gated to zero through unreached cells.
//! Under these constraints a cell can be marked reached if and only if it is genuinely
//! connected to the source through open, non-water cells. Adjacent interior cells may differ
//! in reachability only where a wall stands between them, so walls (and water) are the only
//! permitted border of the enclosure; the outermost ring of the grid is unreachable by fiat,
//! since an open boundary cannot be enclosed.

pub use board::{Enclosure, Puzzle};
pub use builder::{MalformedPuzzle, PuzzleBuilder};
pub use cell::CellRole;
pub use direction::Direction;
pub use location::{Dimension, Location};
pub use solver::{SolveConfig, SolverFailure};

pub(crate) mod board;
mod tests;
pub(crate) mod builder;
pub(crate) mod cell;
pub(crate) mod direction;
pub(crate) mod location;
pub(crate) mod solver;
