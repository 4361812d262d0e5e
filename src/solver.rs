use std::collections::HashMap;

use good_lp::{
    default_solver, variable, Constraint, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use ndarray::Array2;
use strum::VariantArray;
use thiserror::Error;
use unordered_pair::UnorderedPair;

use crate::board::{Enclosure, Puzzle};
use crate::direction::Direction;
use crate::location::Location;

/// Everything one solve invocation needs besides the puzzle itself.
///
/// Passed in explicitly; the crate holds no global or interactive configuration.
#[derive(Clone, Copy, Debug)]
pub struct SolveConfig {
    /// The maximum number of cells that may carry a wall.
    pub wall_budget: usize,
    /// The extra objective weight of a reached bonus cell, on top of the one point every
    /// reached cell is worth.
    pub bonus_weight: f64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            wall_budget: 0,
            bonus_weight: 3.0,
        }
    }
}

impl SolveConfig {
    /// A config with the given wall budget and the default bonus weight.
    pub fn with_budget(wall_budget: usize) -> Self {
        Self {
            wall_budget,
            ..Self::default()
        }
    }
}

/// Reasons a solve invocation may fail.
///
/// These are fatal: no partial result grid exists when any of them is returned.
#[derive(Debug, Error)]
pub enum SolverFailure {
    /// The constraints admit no assignment at all, e.g. a portal pair whose members no wall
    /// placement can reconcile, or a source on the boundary ring.
    #[error("no feasible enclosure exists for this puzzle and budget")]
    Infeasible,
    /// The solver reported the objective as unbounded. This should never happen for a
    /// well-formed model, whose objective is capped by the cell count.
    #[error("the enclosure model is unbounded")]
    Unbounded,
    /// Any other non-optimal solver status.
    #[error("solver failure: {0}")]
    Other(String),
}

impl From<ResolutionError> for SolverFailure {
    fn from(value: ResolutionError) -> Self {
        match value {
            ResolutionError::Infeasible => Self::Infeasible,
            ResolutionError::Unbounded => Self::Unbounded,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The MILP encoding of one puzzle under one [`SolveConfig`].
///
/// # Logical setup
/// Per cell there is a binary `wall` and a binary `reach` variable; per grid edge there are two
/// continuous flow variables, one owned by each endpoint, oriented outward and bounded by
/// `M = rows * cols`. The maps below are the single source of truth for variable existence: a
/// flow variable exists if and only if the neighbor in that direction exists.
///
/// Reachability is tied to true connectivity by routing a single-commodity flow out of the
/// source: every reached cell except the source consumes one unit, the source supplies one unit
/// per reached cell, the two variables on an edge negate each other, and flow is gated to zero
/// through unreached cells. A 0/1 relaxation without the flow could mark islands reached without
/// any connection to the source, or drop cells "for free" without paying a wall.
pub(crate) struct EnclosureModel<'a> {
    puzzle: &'a Puzzle,
    config: SolveConfig,
    vars: ProblemVariables,
    wall: HashMap<Location, Variable>,
    reach: HashMap<Location, Variable>,
    flow: HashMap<(Location, Direction), Variable>,
    flow_bound: f64,
}

impl<'a> EnclosureModel<'a> {
    pub(crate) fn new(puzzle: &'a Puzzle, config: SolveConfig) -> Self {
        let (rows, cols) = puzzle.dims();
        let flow_bound = (rows * cols) as f64;

        let mut vars = ProblemVariables::new();

        let mut wall = HashMap::with_capacity(rows * cols);
        let mut reach = HashMap::with_capacity(rows * cols);
        for location in puzzle.locations() {
            wall.insert(location, vars.add(variable().binary()));
            reach.insert(location, vars.add(variable().binary()));
        }

        let mut flow = HashMap::with_capacity(2 * puzzle.graph().edge_count());
        for (a, b, _) in puzzle.graph().all_edges() {
            let towards = Direction::direction_to(a, b).unwrap();
            flow.insert((a, towards), vars.add(variable().min(-flow_bound).max(flow_bound)));
            flow.insert(
                (b, towards.invert()),
                vars.add(variable().min(-flow_bound).max(flow_bound)),
            );
        }

        Self {
            puzzle,
            config,
            vars,
            wall,
            reach,
            flow,
            flow_bound,
        }
    }

    /// The net outward flow of a cell: the sum of its existing directional flow variables.
    fn net_flow(&self, location: Location) -> Expression {
        let mut sum = Expression::default();
        for direction in Direction::VARIANTS {
            if let Some(&flow) = self.flow.get(&(location, *direction)) {
                sum.add_mul(1., flow);
            }
        }

        sum
    }

    fn total_reach(&self) -> Expression {
        let mut sum = Expression::default();
        for &reach in self.reach.values() {
            sum.add_mul(1., reach);
        }

        sum
    }

    /// Constraints emitted once per cell.
    fn cell_constraints(&self) -> Vec<Constraint> {
        let mut out = Vec::new();
        let m = self.flow_bound;

        for location in self.puzzle.locations() {
            let wall = self.wall[&location];
            let reach = self.reach[&location];

            // never both walled and reached
            out.push((reach + wall).leq(1.0));

            if self.puzzle.is_water(location) {
                out.push(Expression::from(reach).eq(0.0));
                out.push(Expression::from(wall).eq(0.0));
                for direction in Direction::VARIANTS {
                    if let Some(&flow) = self.flow.get(&(location, *direction)) {
                        out.push(Expression::from(flow).eq(0.0));
                    }
                }
            }

            // the boundary ring is outside the arena; an open boundary cannot be enclosed
            if !self.puzzle.is_interior(location) {
                out.push(Expression::from(reach).eq(0.0));
            }

            // flow passes only through reached cells
            for direction in Direction::VARIANTS {
                if let Some(&flow) = self.flow.get(&(location, *direction)) {
                    out.push(Expression::from(flow).leq(m * reach));
                    out.push(Expression::from(flow).geq(-m * reach));
                }
            }

            // every reached cell except the source consumes one unit; outward flow is a
            // divergence, hence the sign
            if location != self.puzzle.source() {
                out.push((self.net_flow(location) + reach).eq(0.0));
            }
        }

        out
    }

    /// Constraints emitted exactly once per grid edge.
    fn edge_constraints(&self) -> Vec<Constraint> {
        let mut out = Vec::new();

        for (a, b, _) in self.puzzle.graph().all_edges() {
            let towards = Direction::direction_to(a, b).unwrap();
            let flow_out = self.flow[&(a, towards)];
            let flow_back = self.flow[&(b, towards.invert())];

            // nothing is lost crossing an edge
            out.push((flow_out + flow_back).eq(0.0));

            // inside the arena, walls are the only permitted separator between reached and
            // unreached territory: a cell cannot be dropped "for free"
            if [a, b].into_iter().all(|end| self.puzzle.is_interior(end) && !self.puzzle.is_water(end)) {
                let (wall_a, wall_b) = (self.wall[&a], self.wall[&b]);
                let (reach_a, reach_b) = (self.reach[&a], self.reach[&b]);
                out.push((reach_b - reach_a).leq(wall_a + wall_b));
                out.push((reach_a - reach_b).leq(wall_a + wall_b));
            }
        }

        out
    }

    /// The wall budget and the special-cell constraints.
    fn puzzle_constraints(&self) -> Vec<Constraint> {
        let mut out = Vec::new();
        let source = self.puzzle.source();

        out.push(Expression::from(self.reach[&source]).eq(1.0));
        out.push(Expression::from(self.wall[&source]).eq(0.0));
        // the source supplies one unit to every other reached cell
        out.push(self.net_flow(source).eq(self.total_reach() - 1.0));

        let mut wall_count = Expression::default();
        for &wall in self.wall.values() {
            wall_count.add_mul(1., wall);
        }
        out.push(wall_count.leq(self.config.wall_budget as f64));

        for bonus in self.puzzle.bonuses() {
            out.push(Expression::from(self.wall[bonus]).eq(0.0));
        }

        // one equality per pair; both members stay open
        for &UnorderedPair(first, second) in self.puzzle.portal_pairs() {
            out.push(Expression::from(self.wall[&first]).eq(0.0));
            out.push(Expression::from(self.wall[&second]).eq(0.0));
            out.push((self.reach[&first] - self.reach[&second]).eq(0.0));
        }

        out
    }

    /// Maximize reached cells, with bonus cells weighted extra.
    fn objective(&self) -> Expression {
        let mut objective = self.total_reach();
        for bonus in self.puzzle.bonuses() {
            objective.add_mul(self.config.bonus_weight, self.reach[bonus]);
        }

        objective
    }

    /// Hand the model to the MILP solver and read the optimum back into grid-shaped arrays.
    pub(crate) fn solve(self) -> Result<Enclosure, SolverFailure> {
        let mut constraints = self.cell_constraints();
        constraints.extend(self.edge_constraints());
        constraints.extend(self.puzzle_constraints());
        let objective = self.objective();

        let Self {
            puzzle,
            config,
            vars,
            wall,
            reach,
            ..
        } = self;

        let mut problem = vars.maximise(objective).using(default_solver);
        for constraint in constraints {
            problem = problem.with(constraint);
        }

        let solution = problem.solve()?;

        let (rows, cols) = puzzle.dims();
        let walls = Array2::from_shape_fn((rows, cols), |index| {
            solution.value(wall[&Location::from(index)]) > 0.5
        });
        let reachable = Array2::from_shape_fn((rows, cols), |index| {
            solution.value(reach[&Location::from(index)]) > 0.5
        });

        let cells_reached = reachable.iter().filter(|reached| **reached).count();
        let bonuses_reached = puzzle
            .bonuses()
            .iter()
            .filter(|bonus| reachable[bonus.as_index()])
            .count();
        let score = cells_reached as f64 + config.bonus_weight * bonuses_reached as f64;

        Ok(Enclosure {
            walls,
            reachable,
            score,
        })
    }
}
