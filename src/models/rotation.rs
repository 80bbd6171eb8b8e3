//! Serving rotations.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::{Team, TeamPair};

/// Rotation value outside the 1..=6 court positions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rotation must be between 1 and 6, got {0}")]
pub struct RotationError(pub u8);

/// One of the six serving positions a team cycles through.
///
/// A team advances one position every time it wins a sideout, following the
/// cycle `1 → 6 → 5 → 4 → 3 → 2 → 1`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rotation(u8);

impl Rotation {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(position: u8) -> Result<Self, RotationError> {
        if (Self::MIN..=Self::MAX).contains(&position) {
            Ok(Self(position))
        } else {
            Err(RotationError(position))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The rotation a team moves to after winning a sideout.
    pub fn advance(self) -> Self {
        if self.0 == Self::MIN {
            Self(Self::MAX)
        } else {
            Self(self.0 - 1)
        }
    }

    /// All six rotations in ascending order.
    pub fn all() -> impl Iterator<Item = Rotation> {
        (Self::MIN..=Self::MAX).map(Rotation)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for Rotation {
    type Error = RotationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rotation> for u8 {
    fn from(rotation: Rotation) -> Self {
        rotation.0
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Current rotation of each team. Both teams rotate independently.
pub type RotationPair = TeamPair<Rotation>;

impl RotationPair {
    /// Advance `team` after it won a sideout; the other team is untouched.
    pub fn advance(&mut self, team: Team) {
        let rotation = self.get_mut(team);
        *rotation = rotation.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rot(n: u8) -> Rotation {
        Rotation::new(n).unwrap()
    }

    #[test]
    fn test_rotation_bounds() {
        assert!(Rotation::new(0).is_err());
        assert!(Rotation::new(7).is_err());
        assert_eq!(Rotation::new(1).unwrap().get(), 1);
        assert_eq!(Rotation::new(6).unwrap().get(), 6);
    }

    #[test]
    fn test_advance_wraps_from_one_to_six() {
        assert_eq!(rot(1).advance(), rot(6));
    }

    #[test]
    fn test_advance_decrements() {
        for n in 2..=6 {
            assert_eq!(rot(n).advance(), rot(n - 1));
        }
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        let mut r = rot(3);
        for _ in 0..6 {
            r = r.advance();
            assert!((1..=6).contains(&r.get()));
        }
        assert_eq!(r, rot(3));
    }

    #[test]
    fn test_default_is_one() {
        assert_eq!(Rotation::default().get(), 1);
    }

    #[test]
    fn test_serde_validates_range() {
        assert_eq!(serde_json::to_string(&rot(4)).unwrap(), "4");
        let r: Rotation = serde_json::from_str("5").unwrap();
        assert_eq!(r, rot(5));
        assert!(serde_json::from_str::<Rotation>("0").is_err());
        assert!(serde_json::from_str::<Rotation>("9").is_err());
    }

    #[test]
    fn test_pair_advances_one_team_only() {
        let mut pair = RotationPair::new(rot(1), rot(4));
        pair.advance(Team::Own);
        assert_eq!(pair, RotationPair::new(rot(6), rot(4)));
        pair.advance(Team::Rival);
        assert_eq!(pair, RotationPair::new(rot(6), rot(3)));
    }

    #[test]
    fn test_all_lists_six_rotations() {
        let all: Vec<u8> = Rotation::all().map(Rotation::get).collect();
        assert_eq!(all, vec![1, 2, 3, 4, 5, 6]);
    }
}
