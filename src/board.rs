use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::num::NonZero;

use ndarray::Array2;
use petgraph::graphmap::UnGraphMap;
use unordered_pair::UnorderedPair;

use crate::builder::{MalformedPuzzle, PuzzleBuilder};
use crate::cell::CellRole;
use crate::location::Location;
use crate::solver::{EnclosureModel, SolveConfig, SolverFailure};

/// A parsed enclosure puzzle: an immutable rectangular grid of [`CellRole`]s together with its
/// 4-neighbor adjacency.
///
/// [`Puzzle`]s are produced by a [`PuzzleBuilder`] or by [`Puzzle::from_markers`], both of which
/// enforce the structural invariants (exactly one source, two cells per portal tag). Solving
/// never mutates the puzzle, so one puzzle can be solved repeatedly under different budgets.
#[derive(Clone)]
pub struct Puzzle {
    pub(crate) cells: Array2<CellRole>,
    pub(crate) graph: UnGraphMap<Location, ()>,
    pub(crate) source: Location,
    pub(crate) bonuses: Vec<Location>,
    pub(crate) portal_pairs: Vec<UnorderedPair<Location>>,
}

impl Puzzle {
    /// Parse a raw grid of markers into a [`Puzzle`].
    ///
    /// The legend: `"0"` (or empty) is buildable ground, `"1"` is water, `"s"` is the source,
    /// `"c"` is a bonus cell, and `"P<tag>"` (e.g. `"P1"`) is a portal; the two cells carrying
    /// the same tag form a pair. Whitespace around a marker is ignored.
    ///
    /// Fails with [`MalformedPuzzle`] when a marker is unrecognized, the grid is empty or
    /// ragged, or the structural invariants do not hold.
    pub fn from_markers<S: AsRef<str>>(markers: &[Vec<S>]) -> Result<Self, MalformedPuzzle> {
        let rows = NonZero::new(markers.len()).ok_or(MalformedPuzzle::EmptyGrid)?;
        let cols = NonZero::new(markers[0].len()).ok_or(MalformedPuzzle::EmptyGrid)?;
        if markers.iter().any(|row| row.len() != cols.get()) {
            return Err(MalformedPuzzle::RaggedRows);
        }

        let mut builder = PuzzleBuilder::with_dims((rows, cols));
        let mut portals: BTreeMap<String, Vec<Location>> = BTreeMap::new();

        for (row, row_markers) in markers.iter().enumerate() {
            for (col, marker) in row_markers.iter().enumerate() {
                let location = Location(row, col);
                match marker.as_ref().trim() {
                    "" | "0" => {}
                    "1" => {
                        builder.add_water(location);
                    }
                    "s" => {
                        builder.source(location);
                    }
                    "c" => {
                        builder.add_bonus(location);
                    }
                    tagged if tagged.starts_with('P') => {
                        portals.entry(tagged[1..].to_owned()).or_default().push(location);
                    }
                    unknown => {
                        return Err(MalformedPuzzle::UnknownMarker {
                            marker: unknown.to_owned(),
                            row,
                            col,
                        });
                    }
                }
            }
        }

        for (tag, members) in portals {
            match members.as_slice() {
                &[first, second] => {
                    builder.add_portals(&tag, (first, second));
                }
                _ => {
                    return Err(MalformedPuzzle::PortalCardinality {
                        tag,
                        count: members.len(),
                    });
                }
            }
        }

        builder.build()
    }

    /// The grid extents in `(rows, cols)` order.
    pub fn dims(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// The role of the cell at `location`.
    pub fn role(&self, location: Location) -> &CellRole {
        &self.cells[location.as_index()]
    }

    /// Whether the cell at `location` is water.
    pub fn is_water(&self, location: Location) -> bool {
        matches!(self.cells[location.as_index()], CellRole::Water)
    }

    /// Whether `location` lies strictly inside the boundary ring.
    pub fn is_interior(&self, location: Location) -> bool {
        let (rows, cols) = self.dims();
        (1..rows - 1).contains(&location.0) && (1..cols - 1).contains(&location.1)
    }

    /// The unique source cell.
    pub fn source(&self) -> Location {
        self.source
    }

    /// All bonus cells, in row-major order.
    pub fn bonuses(&self) -> &[Location] {
        &self.bonuses
    }

    /// All portal pairs, ordered by tag.
    pub fn portal_pairs(&self) -> &[UnorderedPair<Location>] {
        &self.portal_pairs
    }

    /// A boolean mask of the grid, true wherever the cell is water.
    pub fn water_mask(&self) -> Array2<bool> {
        self.cells.map(|role| matches!(role, CellRole::Water))
    }

    /// Every location of the grid, in row-major order.
    pub(crate) fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.cells.indexed_iter().map(|(index, _)| Location::from(index))
    }

    pub(crate) fn graph(&self) -> &UnGraphMap<Location, ()> {
        &self.graph
    }

    /// Solve this puzzle under `config`, deferring to the internal MILP model.
    ///
    /// Returns the optimal [`Enclosure`], or a [`SolverFailure`] when the model is infeasible
    /// (e.g. a portal pair that no wall placement can satisfy) or otherwise does not reach an
    /// optimal status. No partial grids are ever returned.
    pub fn solve(&self, config: SolveConfig) -> Result<Enclosure, SolverFailure> {
        EnclosureModel::new(self, config).solve()
    }

    /// Render `enclosure` over this puzzle: `#` for walls, `+` for reached open ground, with
    /// the puzzle's own glyphs for water, source, bonus and portal cells.
    pub fn render_solution(&self, enclosure: &Enclosure) -> String {
        print(&Array2::from_shape_fn(self.cells.dim(), |index| {
            if enclosure.walls[index] {
                '#'
            } else {
                match self.cells[index] {
                    CellRole::Water => '~',
                    CellRole::Source => 'S',
                    CellRole::Bonus => 'c',
                    CellRole::Portal { .. } => 'P',
                    CellRole::Buildable => {
                        if enclosure.reachable[index] {
                            '+'
                        } else {
                            '.'
                        }
                    }
                }
            }
        }))
    }
}

impl Display for Puzzle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", print(&self.cells.map(|role| match role {
            CellRole::Buildable => '.',
            CellRole::Water => '~',
            CellRole::Source => 'S',
            CellRole::Bonus => 'c',
            CellRole::Portal { .. } => 'P',
        })))
    }
}

/// The solved output of one optimization run, read back into grid-shaped arrays.
#[derive(Clone, Debug)]
pub struct Enclosure {
    /// True wherever a wall is built. Never true on water, the source, a bonus or a portal
    /// cell, and never true together with `reachable`.
    pub walls: Array2<bool>,
    /// True wherever the cell is connected to the source through open, non-water cells. A
    /// single 4-connected component containing the source; false on water and the boundary
    /// ring.
    pub reachable: Array2<bool>,
    /// The achieved objective value: reached cells, plus the bonus weight once more per
    /// reached bonus cell.
    pub score: f64,
}

fn print(grid: &Array2<char>) -> String {
    let mut out = String::with_capacity(grid.nrows() * (grid.ncols() + 1));

    for row in grid.rows() {
        for glyph in row {
            out.push(*glyph);
        }
        out.push('\n');
    }

    out
}
