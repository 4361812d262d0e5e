#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::num::NonZero;

    use ndarray::Array2;
    use strum::VariantArray;
    use unordered_pair::UnorderedPair;

    use crate::builder::PuzzleBuilder;
    use crate::direction::Direction;
    use crate::location::{Dimension, Location};
    use crate::solver::{SolveConfig, SolverFailure};
    use crate::{Enclosure, MalformedPuzzle, Puzzle};

    fn dims(rows: usize, cols: usize) -> (Dimension, Dimension) {
        (NonZero::new(rows).unwrap(), NonZero::new(cols).unwrap())
    }

    /// Check every solution property a correct enclosure must have, independently of the
    /// solver: wall/reach exclusion, the budget, protected cells, portal symmetry, the
    /// boundary ring, and single-component connectivity via a BFS over the returned grid.
    fn assert_enclosure_invariants(puzzle: &Puzzle, enclosure: &Enclosure, wall_budget: usize) {
        let (rows, cols) = puzzle.dims();

        for row in 0..rows {
            for col in 0..cols {
                let index = (row, col);
                assert!(
                    !(enclosure.walls[index] && enclosure.reachable[index]),
                    "cell ({row}, {col}) is both walled and reached"
                );
                if row == 0 || col == 0 || row == rows - 1 || col == cols - 1 {
                    assert!(!enclosure.reachable[index], "boundary cell ({row}, {col}) reached");
                }
                if puzzle.is_water(Location(row, col)) {
                    assert!(!enclosure.reachable[index], "water cell ({row}, {col}) reached");
                    assert!(!enclosure.walls[index], "water cell ({row}, {col}) walled");
                }
            }
        }

        assert!(enclosure.walls.iter().filter(|wall| **wall).count() <= wall_budget);

        assert!(!enclosure.walls[puzzle.source().as_index()]);
        for bonus in puzzle.bonuses() {
            assert!(!enclosure.walls[bonus.as_index()]);
        }
        for &UnorderedPair(first, second) in puzzle.portal_pairs() {
            assert!(!enclosure.walls[first.as_index()]);
            assert!(!enclosure.walls[second.as_index()]);
            assert_eq!(
                enclosure.reachable[first.as_index()],
                enclosure.reachable[second.as_index()],
                "portal pair {first:?}/{second:?} disagrees on reachability"
            );
        }

        // BFS from the source over the reached cells must cover exactly the reached cells
        assert!(enclosure.reachable[puzzle.source().as_index()]);
        let mut seen = Array2::from_elem((rows, cols), false);
        let mut queue = VecDeque::from([puzzle.source()]);
        seen[puzzle.source().as_index()] = true;
        while let Some(location) = queue.pop_front() {
            for direction in Direction::VARIANTS {
                let next = direction.attempt_from(location);
                if next.0 < rows
                    && next.1 < cols
                    && enclosure.reachable[next.as_index()]
                    && !seen[next.as_index()]
                {
                    seen[next.as_index()] = true;
                    queue.push_back(next);
                }
            }
        }
        assert_eq!(seen, enclosure.reachable);
    }

    #[test]
    fn open_grid_no_budget() {
        let puzzle = PuzzleBuilder::with_dims(dims(5, 5))
            .source(Location(2, 2))
            .build()
            .unwrap();

        let enclosure = puzzle.solve(SolveConfig::default()).unwrap();
        assert_enclosure_invariants(&puzzle, &enclosure, 0);

        // every interior cell is reached, the boundary ring is not
        assert_eq!(enclosure.score, 9.0);
        assert_eq!(puzzle.render_solution(&enclosure), ".....
.+++.
.+S+.
.+++.
.....
");
    }

    #[test]
    fn bonus_cells_weigh_extra() {
        let puzzle = PuzzleBuilder::with_dims(dims(5, 5))
            .source(Location(2, 2))
            .add_bonus(Location(1, 1))
            .build()
            .unwrap();

        let enclosure = puzzle.solve(SolveConfig::default()).unwrap();
        assert_enclosure_invariants(&puzzle, &enclosure, 0);

        // 9 reached cells, one of them a bonus worth 3 more
        assert_eq!(enclosure.score, 12.0);
        assert_eq!(puzzle.render_solution(&enclosure), ".....
.c++.
.+S+.
.+++.
.....
");
    }

    #[test]
    fn water_ring_isolates_source() {
        let mut builder = PuzzleBuilder::with_dims(dims(5, 5));
        builder.source(Location(2, 2));
        for location in [
            Location(1, 1),
            Location(1, 2),
            Location(1, 3),
            Location(2, 1),
            Location(2, 3),
            Location(3, 1),
            Location(3, 2),
            Location(3, 3),
        ] {
            builder.add_water(location);
        }
        let puzzle = builder.build().unwrap();

        // no budget buys a way through water
        for wall_budget in [0, 3] {
            let enclosure = puzzle.solve(SolveConfig::with_budget(wall_budget)).unwrap();
            assert_enclosure_invariants(&puzzle, &enclosure, wall_budget);
            assert_eq!(enclosure.reachable.iter().filter(|reached| **reached).count(), 1);
            assert_eq!(enclosure.score, 1.0);
        }
    }

    fn portal_across_channel() -> Puzzle {
        // a water channel splits the arena; the far portal can never be reached, so its near
        // partner must be cordoned off by walls
        let mut builder = PuzzleBuilder::with_dims(dims(7, 7));
        builder.source(Location(1, 1));
        for row in 1..=5 {
            builder.add_water(Location(row, 3));
        }
        builder.add_portals("1", (Location(5, 2), Location(3, 5)));
        builder.build().unwrap()
    }

    #[test]
    fn portal_pair_forces_cordon() {
        let puzzle = portal_across_channel();

        let enclosure = puzzle.solve(SolveConfig::with_budget(2)).unwrap();
        assert_enclosure_invariants(&puzzle, &enclosure, 2);

        // the near portal sits in a corner of the left chamber; walling its two open
        // neighbors costs the least territory
        assert_eq!(enclosure.score, 7.0);
        assert_eq!(puzzle.render_solution(&enclosure), ".......
.S+~...
.++~...
.++~.P.
.+#~...
.#P~...
.......
");
    }

    #[test]
    fn portal_pair_infeasible_without_walls() {
        let puzzle = portal_across_channel();

        // with no walls available the whole left chamber shares one reachability value, so
        // the pair cannot be reconciled
        assert!(matches!(
            puzzle.solve(SolveConfig::default()),
            Err(SolverFailure::Infeasible)
        ));
        assert!(matches!(
            puzzle.solve(SolveConfig::with_budget(1)),
            Err(SolverFailure::Infeasible)
        ));
    }

    #[test]
    fn two_portal_pairs_both_respected() {
        // the channel pair still needs a cordon; a second pair entirely inside the source
        // chamber must stay open and reached at the same time
        let mut builder = PuzzleBuilder::with_dims(dims(7, 7));
        builder.source(Location(1, 1));
        for row in 1..=5 {
            builder.add_water(Location(row, 3));
        }
        builder.add_portals("1", (Location(5, 2), Location(3, 5)));
        builder.add_portals("2", (Location(2, 1), Location(4, 1)));
        let puzzle = builder.build().unwrap();
        assert_eq!(puzzle.portal_pairs().len(), 2);

        let enclosure = puzzle.solve(SolveConfig::with_budget(4)).unwrap();
        assert_enclosure_invariants(&puzzle, &enclosure, 4);

        // cordoning off the channel portal still costs exactly 3 cells; the second pair sits
        // clear of the cordon, so both of its members are reached
        assert_eq!(enclosure.score, 7.0);
        assert!(enclosure.reachable[Location(2, 1).as_index()]);
        assert!(enclosure.reachable[Location(4, 1).as_index()]);
    }

    #[test]
    fn larger_budget_never_hurts() {
        let puzzle = portal_across_channel();

        let scores = [2usize, 3, 4, 6].map(|wall_budget| {
            let enclosure = puzzle.solve(SolveConfig::with_budget(wall_budget)).unwrap();
            assert_enclosure_invariants(&puzzle, &enclosure, wall_budget);
            enclosure.score
        });

        assert_eq!(scores[0], 7.0);
        assert!(scores.windows(2).all(|pair| pair[0] <= pair[1]));

        // an open grid never profits from walls either; walling nothing is always feasible
        let open = PuzzleBuilder::with_dims(dims(5, 5))
            .source(Location(2, 2))
            .build()
            .unwrap();
        for wall_budget in [0, 1] {
            let enclosure = open.solve(SolveConfig::with_budget(wall_budget)).unwrap();
            assert_enclosure_invariants(&open, &enclosure, wall_budget);
            assert_eq!(enclosure.score, 9.0);
        }
    }

    #[test]
    fn source_on_boundary_is_infeasible() {
        let puzzle = PuzzleBuilder::with_dims(dims(5, 5))
            .source(Location(0, 2))
            .build()
            .unwrap();

        assert!(matches!(
            puzzle.solve(SolveConfig::default()),
            Err(SolverFailure::Infeasible)
        ));
    }

    #[test]
    fn parse_markers() {
        let markers = vec![
            vec!["0", "0", "0", "0", "0"],
            vec!["0", "c", "0", "P1", "0"],
            vec!["0", "0", "s", "1", "0"],
            vec!["0", "P1", "0", "", "0"],
            vec!["0", "0", "0", "0", "0"],
        ];
        let puzzle = Puzzle::from_markers(&markers).unwrap();

        assert_eq!(format!("{puzzle}"), ".....
.c.P.
..S~.
.P...
.....
");
        assert_eq!(puzzle.source(), Location(2, 2));
        assert_eq!(puzzle.bonuses(), &[Location(1, 1)][..]);
        assert_eq!(
            puzzle.portal_pairs(),
            &[UnorderedPair(Location(1, 3), Location(3, 1))][..]
        );
        assert!(puzzle.is_water(Location(2, 3)));
        assert_eq!(puzzle.water_mask().iter().filter(|water| **water).count(), 1);
    }

    #[test]
    fn markers_without_source_rejected() {
        let markers = vec![vec!["0"; 4]; 4];
        assert_eq!(
            Puzzle::from_markers(&markers).err(),
            Some(MalformedPuzzle::SourceCount(0))
        );
    }

    #[test]
    fn markers_with_two_sources_rejected() {
        let markers = vec![
            vec!["0", "s", "0"],
            vec!["0", "0", "0"],
            vec!["0", "s", "0"],
        ];
        assert_eq!(
            Puzzle::from_markers(&markers).err(),
            Some(MalformedPuzzle::SourceCount(2))
        );
    }

    #[test]
    fn unpaired_portal_rejected() {
        let markers = vec![
            vec!["0", "s", "0"],
            vec!["0", "P1", "0"],
            vec!["0", "0", "0"],
        ];
        assert_eq!(
            Puzzle::from_markers(&markers).err(),
            Some(MalformedPuzzle::PortalCardinality {
                tag: "1".to_owned(),
                count: 1,
            })
        );
    }

    #[test]
    fn unknown_marker_rejected() {
        let markers = vec![vec!["0", "x"], vec!["s", "0"]];
        assert_eq!(
            Puzzle::from_markers(&markers).err(),
            Some(MalformedPuzzle::UnknownMarker {
                marker: "x".to_owned(),
                row: 0,
                col: 1,
            })
        );
    }

    #[test]
    fn degenerate_marker_grids_rejected() {
        let empty: Vec<Vec<&str>> = vec![];
        assert_eq!(Puzzle::from_markers(&empty).err(), Some(MalformedPuzzle::EmptyGrid));

        let ragged = vec![vec!["0", "0"], vec!["0"]];
        assert_eq!(Puzzle::from_markers(&ragged).err(), Some(MalformedPuzzle::RaggedRows));
    }

    #[test]
    fn out_of_bounds_feature_invalidates_builder() {
        let mut builder = PuzzleBuilder::with_dims(dims(5, 5));
        builder.source(Location(2, 2)).add_water(Location(9, 0));

        assert!(builder.is_valid().is_some());
        assert_eq!(
            builder.build().err(),
            Some(MalformedPuzzle::FeatureOutOfBounds {
                location: Location(9, 0),
            })
        );
    }

    #[test]
    fn directions_step_and_invert() {
        for direction in Direction::VARIANTS {
            assert_eq!(direction.invert().invert(), *direction);
        }

        assert_eq!(
            Direction::direction_to(Location(2, 2), Location(1, 2)),
            Some(Direction::North)
        );
        assert_eq!(
            Direction::direction_to(Location(2, 2), Location(2, 3)),
            Some(Direction::East)
        );
        assert_eq!(Direction::direction_to(Location(0, 0), Location(2, 2)), None);
        // steps off the grid never alias a real cell
        assert_eq!(Direction::North.attempt_from(Location(0, 0)).0, usize::MAX);
    }
}
