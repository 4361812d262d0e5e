/// The role a single cell plays in a puzzle.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum CellRole {
    /// Open ground; may carry a wall or end up reached.
    #[default]
    Buildable,
    /// Impassable and unbuildable; never reached, never walled.
    Water,
    /// The unique cell reachability radiates from.
    Source,
    /// Reaching this cell scores extra; walls are forbidden here.
    Bonus,
    /// One member of a pair of cells which must share a reachability outcome; walls are
    /// forbidden here.
    Portal {
        /// The tag grouping the two members of the pair, e.g. `"1"` for marker `P1`.
        tag: String,
    },
}
