//! Cardinal directions and rotations on the tile grid.

use serde::{Deserialize, Serialize};

/// Four cardinal directions.
///
/// The ordinal doubles as the building rotation: 0 faces +x and each step
/// turns a quarter counter-clockwise.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// +x, rotation 0
    East = 0,
    /// +y, rotation 1
    North = 1,
    /// -x, rotation 2
    West = 2,
    /// -y, rotation 3
    South = 3,
}

impl Direction {
    /// All four directions in rotation order.
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::North,
        Direction::West,
        Direction::South,
    ];

    /// Builds a direction from any integer rotation, wrapping modulo 4.
    #[must_use]
    pub const fn from_rotation(rotation: i32) -> Self {
        match rotation.rem_euclid(4) {
            0 => Self::East,
            1 => Self::North,
            2 => Self::West,
            _ => Self::South,
        }
    }

    /// The rotation index of this direction.
    #[inline]
    #[must_use]
    pub const fn rotation(self) -> u8 {
        self as u8
    }

    /// Returns the direction turned by `quarter_turns` counter-clockwise steps.
    #[must_use]
    pub const fn rotated(self, quarter_turns: i32) -> Self {
        Self::from_rotation(self as i32 + quarter_turns)
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        self.rotated(2)
    }

    /// Gets the `(dx, dy)` step for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::East => (1, 0),
            Self::North => (0, 1),
            Self::West => (-1, 0),
            Self::South => (0, -1),
        }
    }

    /// Returns true if the two directions are a quarter turn apart.
    #[must_use]
    pub const fn is_perpendicular(self, other: Self) -> bool {
        (self as i32 - other as i32).rem_euclid(2) == 1
    }
}
