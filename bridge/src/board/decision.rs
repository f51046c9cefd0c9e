//! Which of the top moves gets played.

use chess::CandidateMove;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub random_best_move: bool,
    /// Percent chance the top move is kept.
    pub best_move_chance: u32,
    pub high_mate_chance: bool,
    /// Mate horizon in moves; zero disables mate preference.
    pub mate_horizon: u32,
}

/// Fastest mate for the side to move within `horizon` moves, if any.
pub fn fastest_mate(moves: &[CandidateMove], horizon: u32) -> Option<&CandidateMove> {
    if horizon == 0 {
        return None;
    }
    moves
        .iter()
        .filter(|c| matches!(c.mate_distance(), Some(n) if n > 0 && n.unsigned_abs() <= horizon))
        .min_by_key(|c| (c.mate_distance(), c.pv.len()))
}

/// Pick one move from `top_moves`, which is ranked best first.
///
/// High-mate-chance collapses to the fastest mate in range. Otherwise the
/// pick is uniform when random-best-move is on; failing that the top move
/// is kept with `best_move_chance` percent probability, and the rest of the
/// list is drawn from with weights halving per rank.
pub fn select_move<'a, R: Rng + ?Sized>(
    top_moves: &'a [CandidateMove],
    policy: &SelectionPolicy,
    rng: &mut R,
) -> Option<&'a CandidateMove> {
    let top = top_moves.first()?;

    if policy.high_mate_chance {
        if let Some(mate) = fastest_mate(top_moves, policy.mate_horizon) {
            tracing::debug!("High mate chance picked {}", mate.token());
            return Some(mate);
        }
    }

    if policy.random_best_move {
        let pick = &top_moves[rng.gen_range(0..top_moves.len())];
        tracing::debug!("Random best move picked {}", pick.token());
        return Some(pick);
    }

    if top_moves.len() == 1 || rng.gen_range(0..100) < policy.best_move_chance {
        return Some(top);
    }

    let rest = &top_moves[1..];
    let weights: Vec<u64> = (0..rest.len()).map(|i| 1u64 << (rest.len() - 1 - i)).collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => {
            let pick = &rest[dist.sample(rng)];
            tracing::debug!("Best move chance failed, picked {}", pick.token());
            Some(pick)
        }
        Err(e) => {
            tracing::warn!("Cannot weight alternatives ({}), keeping top move", e);
            Some(top)
        }
    }
}
