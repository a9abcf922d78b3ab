// Wrapper types making it harder to accidentally mix up grid coordinates and ids.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::Direction;

/// A tile position on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    /// Column, growing east.
    pub x: i32,
    /// Row, growing north.
    pub y: i32,
}

impl TilePos {
    /// Creates a new tile position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the position offset by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Returns the neighbouring position in the given direction.
    #[must_use]
    pub const fn relative(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        self.offset(dx, dy)
    }

    /// Returns the direction from `self` to an edge-adjacent `other`.
    ///
    /// Positions that are not direct neighbours have no relative direction.
    #[must_use]
    pub fn relative_to(self, other: Self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| self.relative(*direction) == other)
    }

    /// Returns the straight-line direction from `self` towards `other`.
    ///
    /// Unlike [`TilePos::relative_to`] the two positions may be any distance
    /// apart, as long as they share a row or a column.
    #[must_use]
    pub fn absolute_relative_to(self, other: Self) -> Option<Direction> {
        match (other.x - self.x, other.y - self.y) {
            (0, 0) => None,
            (dx, 0) if dx > 0 => Some(Direction::East),
            (dx, 0) if dx < 0 => Some(Direction::West),
            (0, dy) if dy > 0 => Some(Direction::North),
            (0, _) => Some(Direction::South),
            _ => None,
        }
    }
}

impl Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Owning team of a building. Buildings of different teams never exchange liquid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TeamId(pub u8);

impl TeamId {
    /// The default player team.
    pub const SHARDED: TeamId = TeamId(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_to() {
        let origin = TilePos::new(3, 3);
        assert_eq!(origin.relative_to(TilePos::new(4, 3)), Some(Direction::East));
        assert_eq!(origin.relative_to(TilePos::new(3, 2)), Some(Direction::South));
        assert_eq!(origin.relative_to(TilePos::new(5, 3)), None);
        assert_eq!(origin.relative_to(origin), None);
    }

    #[test]
    fn test_absolute_relative_to() {
        let origin = TilePos::new(0, 0);
        assert_eq!(origin.absolute_relative_to(TilePos::new(7, 0)), Some(Direction::East));
        assert_eq!(origin.absolute_relative_to(TilePos::new(0, -4)), Some(Direction::South));
        assert_eq!(origin.absolute_relative_to(TilePos::new(1, 1)), None);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&TilePos::new(-2, 9)).expect("serialize");
        assert_eq!(json, r#"{"x":-2,"y":9}"#);
        let back: TilePos = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, TilePos::new(-2, 9));
    }
}
