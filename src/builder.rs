use std::collections::BTreeMap;
use std::num::NonZero;
use std::ops::IndexMut;

use itertools::Itertools;
use ndarray::{Array2, AssignElem};
use petgraph::graphmap::UnGraphMap;
use thiserror::Error;
use unordered_pair::UnorderedPair;

use crate::board::Puzzle;
use crate::cell::CellRole;
use crate::direction::Direction;
use crate::location::{Dimension, Location};

/// Ways an input grid can violate the structural invariants of a puzzle.
///
/// All of these are detected while building, before any optimization model exists.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum MalformedPuzzle {
    /// A feature was placed outside the bounds specified by `dims` on a builder.
    #[error("feature placed out of bounds at {location:?}")]
    FeatureOutOfBounds {
        /// The offending location.
        location: Location,
    },
    /// The grid does not contain exactly one source cell.
    #[error("expected exactly one source cell, found {0}")]
    SourceCount(usize),
    /// A portal tag does not have exactly two member cells.
    #[error("portal tag {tag:?} has {count} member cells, expected exactly 2")]
    PortalCardinality {
        /// The tag in question.
        tag: String,
        /// How many cells carry it.
        count: usize,
    },
    /// A marker in the raw grid matches no legend entry.
    #[error("unrecognized marker {marker:?} at ({row}, {col})")]
    UnknownMarker {
        /// The marker text as given.
        marker: String,
        /// Row of the offending cell.
        row: usize,
        /// Column of the offending cell.
        col: usize,
    },
    /// The rows of the raw marker grid do not all have the same length.
    #[error("marker rows do not all have the same length")]
    RaggedRows,
    /// The raw marker grid has no cells at all.
    #[error("the marker grid is empty")]
    EmptyGrid,
}

/// A builder for [`Puzzle`]s on a rectangular grid.
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some
/// point. Placement methods on an already-invalid builder do nothing; the first accumulated
/// problem is reported by [`build`](Self::build).
#[derive(Clone)]
pub struct PuzzleBuilder {
    // (rows, cols)
    dims: (Dimension, Dimension),
    cells: Array2<CellRole>,
    invalid_reasons: Vec<MalformedPuzzle>,
}

impl Default for PuzzleBuilder {
    fn default() -> Self {
        Self::with_dims((NonZero::new(5).unwrap(), NonZero::new(5).unwrap()))
    }
}

impl PuzzleBuilder {
    /// Construct a new builder with the specified dimensions, in `(rows, cols)` order.
    /// Every cell starts out [`Buildable`](CellRole::Buildable).
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            dims,
            cells: Array2::from_shape_simple_fn((dims.0.get(), dims.1.get()), CellRole::default),
            invalid_reasons: Default::default(),
        }
    }

    fn place(&mut self, location: Location, role: CellRole) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if location.0 >= self.dims.0.get() || location.1 >= self.dims.1.get() {
            self.invalid_reasons.push(MalformedPuzzle::FeatureOutOfBounds { location });
            return self;
        }

        self.cells.index_mut(location.as_index()).assign_elem(role);
        self
    }

    /// Mark `location` as the source cell. A puzzle must contain exactly one.
    ///
    /// May invalidate the builder with [`FeatureOutOfBounds`](MalformedPuzzle::FeatureOutOfBounds).
    pub fn source(&mut self, location: Location) -> &mut Self {
        self.place(location, CellRole::Source)
    }

    /// Mark `location` as water.
    ///
    /// May invalidate the builder with [`FeatureOutOfBounds`](MalformedPuzzle::FeatureOutOfBounds).
    pub fn add_water(&mut self, location: Location) -> &mut Self {
        self.place(location, CellRole::Water)
    }

    /// Mark `location` as a bonus cell.
    ///
    /// May invalidate the builder with [`FeatureOutOfBounds`](MalformedPuzzle::FeatureOutOfBounds).
    pub fn add_bonus(&mut self, location: Location) -> &mut Self {
        self.place(location, CellRole::Bonus)
    }

    /// Add a portal pair sharing `tag`. The order in which `locations` are specified does not
    /// matter.
    ///
    /// May invalidate the builder with [`FeatureOutOfBounds`](MalformedPuzzle::FeatureOutOfBounds).
    pub fn add_portals(&mut self, tag: &str, locations: (Location, Location)) -> &mut Self {
        for location in [locations.0, locations.1] {
            self.place(location, CellRole::Portal { tag: tag.to_owned() });
        }

        self
    }

    /// Check the validity of this builder.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<MalformedPuzzle>)` otherwise.
    pub fn is_valid(&self) -> Option<&Vec<MalformedPuzzle>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// Validate the structural invariants and convert the state of this builder into a
    /// [`Puzzle`].
    ///
    /// Fails with [`SourceCount`](MalformedPuzzle::SourceCount) unless exactly one source cell
    /// was placed, and with [`PortalCardinality`](MalformedPuzzle::PortalCardinality) if portal
    /// placements left a tag without exactly two members (possible when one member of a pair
    /// was later overwritten by another feature).
    pub fn build(&self) -> Result<Puzzle, MalformedPuzzle> {
        if let Some(reason) = self.invalid_reasons.first() {
            return Err(reason.clone());
        }

        let sources = self.cells.indexed_iter()
            .filter(|(_, role)| **role == CellRole::Source)
            .map(|(index, _)| Location::from(index))
            .collect_vec();
        let &[source] = sources.as_slice() else {
            return Err(MalformedPuzzle::SourceCount(sources.len()));
        };

        let bonuses = self.cells.indexed_iter()
            .filter(|(_, role)| **role == CellRole::Bonus)
            .map(|(index, _)| Location::from(index))
            .collect_vec();

        // group portal cells by tag; BTreeMap keeps pair order deterministic
        let mut portals: BTreeMap<&str, Vec<Location>> = BTreeMap::new();
        for (index, role) in self.cells.indexed_iter() {
            if let CellRole::Portal { tag } = role {
                portals.entry(tag).or_default().push(Location::from(index));
            }
        }

        let mut portal_pairs = Vec::with_capacity(portals.len());
        for (tag, members) in portals {
            match members.as_slice() {
                &[first, second] => portal_pairs.push(UnorderedPair(first, second)),
                _ => {
                    return Err(MalformedPuzzle::PortalCardinality {
                        tag: tag.to_owned(),
                        count: members.len(),
                    });
                }
            }
        }

        let (rows, cols) = (self.dims.0.get(), self.dims.1.get());
        let mut graph = UnGraphMap::with_capacity(
            rows * cols,
            // "vertical" edges
            (rows - 1) * cols
                // "horizontal" edges
                + (cols - 1) * rows,
        );

        // stepping only forward inserts each geometric edge exactly once
        for (index, _) in self.cells.indexed_iter() {
            let location = Location::from(index);
            graph.add_node(location);
            for direction in Direction::FORWARD_VARIANTS {
                let neighbor = direction.attempt_from(location);
                if neighbor.0 < rows && neighbor.1 < cols {
                    graph.add_edge(location, neighbor, ());
                }
            }
        }

        Ok(Puzzle {
            cells: self.cells.clone(),
            graph,
            source,
            bonuses,
            portal_pairs,
        })
    }
}
