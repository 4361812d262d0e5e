use strum::VariantArray;

use crate::location::Location;

/// One of the four cardinal directions from a cell to a geometric neighbor.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum Direction {
    /// Towards a lower row index.
    North,
    /// Towards a higher row index.
    South,
    /// Towards a higher column index.
    East,
    /// Towards a lower column index.
    West,
}

impl Direction {
    /// The directions which step towards a higher row-major index.
    ///
    /// Stepping only forward while walking the grid visits every edge exactly once.
    pub(crate) const FORWARD_VARIANTS: &'static [Self] = &[Self::South, Self::East];

    /// Attempt the step from `location` in the direction specified by `self` and return the
    /// resultant [`Location`].
    ///
    /// Steps off the top or left edge wrap to a huge coordinate, so the result of a bad step
    /// fails any bounds check rather than aliasing a real cell.
    pub fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::North => location.offset_by((-1, 0)),
            Self::South => location.offset_by((1, 0)),
            Self::East => location.offset_by((0, 1)),
            Self::West => location.offset_by((0, -1)),
        }
    }

    /// Invert the direction specified by `self` (N↔S, E↔W).
    pub fn invert(&self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    /// Determine the direction from `a` to `b` by calling [`attempt_from`](Self::attempt_from)
    /// until one works.
    ///
    /// Returns [`None`] when the two locations are not geometric neighbors.
    pub fn direction_to(a: Location, b: Location) -> Option<Self> {
        Self::VARIANTS.iter().find(|direction| direction.attempt_from(a) == b).copied()
    }
}
