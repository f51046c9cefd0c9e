//! Engine evaluation scores.

use serde::{Deserialize, Serialize};

/// Centipawn equivalent of a mate, before subtracting the distance.
pub const MATE_CP: i32 = 30000;

/// Engine evaluation score, always from the side-to-move's perspective.
///
/// Centipawns: positive = side-to-move is better.
/// Mate: positive N = side-to-move mates in N moves,
/// negative N = side-to-move gets mated in N moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

impl Score {
    pub fn centipawns(&self) -> Option<i32> {
        match self {
            Self::Centipawns(cp) => Some(*cp),
            Self::Mate(_) => None,
        }
    }

    pub fn mate(&self) -> Option<i32> {
        match self {
            Self::Mate(m) => Some(*m),
            Self::Centipawns(_) => None,
        }
    }

    /// True when the side to move delivers mate.
    pub fn is_mate_for(&self) -> bool {
        matches!(self, Self::Mate(m) if *m > 0)
    }

    /// True when the side to move gets mated.
    pub fn is_mate_against(&self) -> bool {
        matches!(self, Self::Mate(m) if *m < 0)
    }

    /// Convert to centipawns for comparison. Mate scores use large values,
    /// closer mates further from zero.
    pub fn to_cp(&self) -> i32 {
        match self {
            Self::Centipawns(cp) => *cp,
            Self::Mate(m) if *m > 0 => MATE_CP - *m * 100,
            Self::Mate(m) => -MATE_CP - *m * 100,
        }
    }

    /// Negate the score (flip perspective).
    pub fn negate(&self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(m) => Self::Mate(-m),
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Centipawns(cp) => write!(f, "{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) if *m > 0 => write!(f, "+M{}", m),
            Self::Mate(m) => write!(f, "-M{}", m.abs()),
        }
    }
}
