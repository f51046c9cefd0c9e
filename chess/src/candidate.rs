use cozy_chess::{Move, Piece, Square};
use serde::Serialize;

use crate::analysis::Score;
use crate::uci::format_uci_move;

/// Centipawn score given to moves the engine names without ever analysing.
pub const NOMINAL_SCORE_CP: i32 = 0;

/// One analysis result for a position.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMove {
    /// The move under evaluation, also the first entry of `pv`.
    pub mv: Move,
    /// Principal variation.
    pub pv: Vec<Move>,
    pub score: Score,
    pub depth: u32,
    /// 1-based multi-line slot reported by the engine.
    pub line_index: u32,
    /// Fabricated from a best-move line instead of streamed analysis.
    pub synthetic: bool,
}

impl CandidateMove {
    /// Build a candidate from a principal variation. Returns `None` for an
    /// empty variation or a zero mate distance.
    pub fn new(pv: Vec<Move>, score: Score, depth: u32, line_index: u32) -> Option<Self> {
        if score == Score::Mate(0) {
            return None;
        }
        let mv = *pv.first()?;
        Some(Self {
            mv,
            pv,
            score,
            depth,
            line_index,
            synthetic: false,
        })
    }

    /// A stand-in for a best move that never showed up in analysis lines.
    pub fn synthetic(mv: Move, depth: u32) -> Self {
        Self {
            mv,
            pv: vec![mv],
            score: Score::Centipawns(NOMINAL_SCORE_CP),
            depth,
            line_index: 1,
            synthetic: true,
        }
    }

    pub fn token(&self) -> String {
        format_uci_move(self.mv)
    }

    pub fn from(&self) -> Square {
        self.mv.from
    }

    pub fn to(&self) -> Square {
        self.mv.to
    }

    pub fn promotion(&self) -> Option<Piece> {
        self.mv.promotion
    }

    pub fn centipawns(&self) -> Option<i32> {
        self.score.centipawns()
    }

    pub fn mate_distance(&self) -> Option<i32> {
        self.score.mate()
    }

    pub fn quality_class(&self) -> QualityClass {
        QualityClass::of(&self.score)
    }
}

/// Display tint for a candidate. Has no influence on ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityClass {
    Mating,
    Excellent,
    Good,
    Equal,
    Dubious,
    Bad,
    Mated,
}

impl QualityClass {
    pub fn of(score: &Score) -> Self {
        match *score {
            Score::Mate(m) if m > 0 => Self::Mating,
            Score::Mate(_) => Self::Mated,
            Score::Centipawns(cp) if cp >= 100 => Self::Excellent,
            Score::Centipawns(cp) if cp >= 25 => Self::Good,
            Score::Centipawns(cp) if cp > -25 => Self::Equal,
            Score::Centipawns(cp) if cp > -100 => Self::Dubious,
            Score::Centipawns(_) => Self::Bad,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Mating => "#1baca6",
            Self::Excellent => "#0080ff",
            Self::Good => "#81c678",
            Self::Equal => "#c0c0c0",
            Self::Dubious => "#ffff00",
            Self::Bad => "#ff6600",
            Self::Mated => "#ff0000",
        }
    }
}
