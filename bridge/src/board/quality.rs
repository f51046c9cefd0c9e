//! Labels for the move that was just played.

use chess::CandidateMove;
use cozy_chess::Move;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    Best,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
    Brilliant,
    MissedWin,
    Book,
}

impl MoveQuality {
    pub fn color(self) -> &'static str {
        match self {
            Self::Best => "#0080ff",
            Self::Excellent => "#00ff00",
            Self::Good => "#81c678",
            Self::Inaccuracy => "#ffff00",
            Self::Mistake => "#ff6600",
            Self::Blunder => "#ff0000",
            Self::Brilliant => "#1baca6",
            Self::MissedWin => "#ff00ff",
            Self::Book => "#a88865",
        }
    }
}

/// Classify `played` against the search that preceded it.
///
/// `prior_top` is the best move of the position the mover faced;
/// `current_top` is the best reply found in the position after the move,
/// so its score is from the opponent's side. The loss is measured from the
/// mover's side as `before - after`.
pub fn classify(
    prior_top: &CandidateMove,
    played: Move,
    current_top: &CandidateMove,
    in_book: bool,
) -> MoveQuality {
    if in_book {
        return MoveQuality::Book;
    }
    if played == prior_top.mv {
        return MoveQuality::Best;
    }
    // The opponent being mated is the mover still mating.
    if prior_top.score.is_mate_for() && !current_top.score.is_mate_against() {
        return MoveQuality::MissedWin;
    }

    let before = prior_top.score.to_cp();
    let after = current_top.score.negate().to_cp();
    let loss = before.saturating_sub(after);
    match loss {
        l if l <= -50 => MoveQuality::Brilliant,
        l if l <= 20 => MoveQuality::Excellent,
        l if l <= 50 => MoveQuality::Good,
        l if l <= 100 => MoveQuality::Inaccuracy,
        l if l <= 300 => MoveQuality::Mistake,
        _ => MoveQuality::Blunder,
    }
}
