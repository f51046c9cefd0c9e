//! Live candidate list for one search, unique by move and kept ranked.

use cozy_chess::Move;

use crate::candidate::CandidateMove;
use crate::ranking;

/// What a merge did to the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Replaced,
    /// The incoming line was shallower than the stored entry and was dropped.
    Stale,
}

impl MergeOutcome {
    pub fn changed(self) -> bool {
        !matches!(self, Self::Stale)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    entries: Vec<CandidateMove>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one analysis result. An existing entry for the same move is
    /// replaced in place only when the incoming depth is at least as deep,
    /// so out-of-order delivery never regresses what is shown.
    pub fn merge(&mut self, candidate: CandidateMove) -> MergeOutcome {
        let outcome = match self.entries.iter_mut().find(|c| c.mv == candidate.mv) {
            Some(existing) if candidate.depth >= existing.depth => {
                *existing = candidate;
                MergeOutcome::Replaced
            }
            Some(_) => return MergeOutcome::Stale,
            None => {
                self.entries.push(candidate);
                MergeOutcome::Inserted
            }
        };
        ranking::rank(&mut self.entries);
        outcome
    }

    pub fn get(&self, mv: Move) -> Option<&CandidateMove> {
        self.entries.iter().find(|c| c.mv == mv)
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.get(mv).is_some()
    }

    /// Entries best first.
    pub fn ranked(&self) -> &[CandidateMove] {
        &self.entries
    }

    pub fn top(&self) -> Option<&CandidateMove> {
        self.entries.first()
    }

    /// Deepest depth among the stored entries.
    pub fn max_depth(&self) -> u32 {
        self.entries.iter().map(|c| c.depth).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Score;
    use crate::uci::parse_uci_move;

    fn cand(token: &str, cp: i32, depth: u32) -> CandidateMove {
        CandidateMove::new(vec![parse_uci_move(token).unwrap()], Score::Centipawns(cp), depth, 1)
            .unwrap()
    }

    #[test]
    fn test_insert_then_rerank() {
        let mut set = CandidateSet::new();
        assert_eq!(set.merge(cand("e2e4", 35, 10)), MergeOutcome::Inserted);
        assert_eq!(set.merge(cand("d2d4", 40, 12)), MergeOutcome::Inserted);
        assert_eq!(set.top().unwrap().token(), "d2d4");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_same_move_updates_in_place() {
        let mut set = CandidateSet::new();
        set.merge(cand("e2e4", 35, 10));
        assert_eq!(set.merge(cand("e2e4", 20, 11)), MergeOutcome::Replaced);
        assert_eq!(set.len(), 1);
        let entry = set.get(parse_uci_move("e2e4").unwrap()).unwrap();
        assert_eq!(entry.depth, 11);
        assert_eq!(entry.centipawns(), Some(20));
    }

    #[test]
    fn test_equal_depth_replaces() {
        let mut set = CandidateSet::new();
        set.merge(cand("e2e4", 35, 10));
        assert_eq!(set.merge(cand("e2e4", 50, 10)), MergeOutcome::Replaced);
        assert_eq!(set.top().unwrap().centipawns(), Some(50));
    }

    #[test]
    fn test_shallower_repeat_never_regresses() {
        let mut set = CandidateSet::new();
        set.merge(cand("e2e4", 35, 14));
        for depth in [3, 9, 13] {
            assert_eq!(set.merge(cand("e2e4", -500, depth)), MergeOutcome::Stale);
        }
        let entry = set.top().unwrap();
        assert_eq!(entry.depth, 14);
        assert_eq!(entry.centipawns(), Some(35));
    }

    #[test]
    fn test_highest_depth_wins_over_any_sequence() {
        let depths = [4u32, 9, 2, 9, 15, 7, 15, 1];
        let mut set = CandidateSet::new();
        let mut best = 0;
        for (i, depth) in depths.iter().enumerate() {
            set.merge(cand("g1f3", i as i32, *depth));
            best = best.max(*depth);
            assert_eq!(set.top().unwrap().depth, best);
        }
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut set = CandidateSet::new();
        set.merge(cand("e2e4", 35, 10));
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.max_depth(), 0);
    }
}
