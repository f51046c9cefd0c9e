//! Best-first ordering of candidate moves, with the same mate/centipawn
//! tie-breaks engines use when reporting multi-line analysis.

use std::cmp::Ordering;

use crate::candidate::CandidateMove;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MateBand {
    For,
    NoMate,
    Against,
}

fn band(c: &CandidateMove) -> MateBand {
    if c.score.is_mate_for() {
        MateBand::For
    } else if c.score.is_mate_against() {
        MateBand::Against
    } else {
        MateBand::NoMate
    }
}

/// Compare two candidates. `Ordering::Less` means `a` ranks ahead of `b`.
///
/// 1. Mate for the side to move > no mate > mate against.
/// 2. Mate for: shorter variation first.
/// 3. Mate against: longer variation first.
/// 4. No mate: deeper search first, then higher centipawn score.
pub fn compare(a: &CandidateMove, b: &CandidateMove) -> Ordering {
    let (band_a, band_b) = (band(a), band(b));
    if band_a != band_b {
        return band_a.cmp(&band_b);
    }

    match band_a {
        MateBand::For => a.pv.len().cmp(&b.pv.len()),
        MateBand::Against => b.pv.len().cmp(&a.pv.len()),
        MateBand::NoMate => b
            .depth
            .cmp(&a.depth)
            .then_with(|| b.centipawns().unwrap_or(0).cmp(&a.centipawns().unwrap_or(0))),
    }
}

/// Sort best first. Stable: equal-ranked entries keep their relative order.
pub fn rank(candidates: &mut [CandidateMove]) {
    candidates.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Score;
    use crate::uci::parse_uci_move;
    use proptest::prelude::*;

    fn cand(tokens: &[&str], score: Score, depth: u32) -> CandidateMove {
        let pv = tokens.iter().map(|t| parse_uci_move(t).unwrap()).collect();
        CandidateMove::new(pv, score, depth, 1).unwrap()
    }

    fn tokens(list: &[CandidateMove]) -> Vec<String> {
        list.iter().map(|c| c.token()).collect()
    }

    #[test]
    fn test_mate_for_beats_large_centipawns() {
        let mut list = vec![
            cand(&["e2e4"], Score::Centipawns(500), 20),
            cand(&["d1h5", "g8f6", "h5f7"], Score::Mate(2), 8),
        ];
        rank(&mut list);
        assert_eq!(tokens(&list), vec!["d1h5", "e2e4"]);
    }

    #[test]
    fn test_mate_against_ranks_below_no_mate() {
        let mut list = vec![
            cand(&["a2a3", "d8h4"], Score::Mate(-1), 20),
            cand(&["h2h3"], Score::Centipawns(-800), 5),
        ];
        rank(&mut list);
        assert_eq!(tokens(&list), vec!["h2h3", "a2a3"]);
    }

    #[test]
    fn test_faster_mate_first_and_slower_loss_first() {
        let mut wins = vec![
            cand(&["a1a8", "h8h7", "a8a7", "h7h8", "b1b8"], Score::Mate(3), 10),
            cand(&["b1b8"], Score::Mate(1), 10),
        ];
        rank(&mut wins);
        assert_eq!(tokens(&wins), vec!["b1b8", "a1a8"]);

        let mut losses = vec![
            cand(&["g1h1", "d8d1"], Score::Mate(-1), 10),
            cand(&["g1f1", "d8d2", "f1g1", "d2d1"], Score::Mate(-2), 10),
        ];
        rank(&mut losses);
        assert_eq!(tokens(&losses), vec!["g1f1", "g1h1"]);
    }

    #[test]
    fn test_depth_then_score_for_no_mate() {
        let mut list = vec![
            cand(&["e2e4"], Score::Centipawns(35), 10),
            cand(&["c2c4"], Score::Centipawns(20), 12),
            cand(&["d2d4"], Score::Centipawns(40), 12),
        ];
        rank(&mut list);
        assert_eq!(tokens(&list), vec!["d2d4", "c2c4", "e2e4"]);
    }

    fn arb_score() -> impl Strategy<Value = Score> {
        prop_oneof![
            (-600i32..600).prop_map(Score::Centipawns),
            (1i32..6).prop_map(Score::Mate),
            (-6i32..0).prop_map(Score::Mate),
        ]
    }

    const SQUARES: [&str; 8] = ["a2a3", "b2b3", "c2c3", "d2d3", "e2e3", "f2f3", "g2g3", "h2h3"];

    fn arb_candidate() -> impl Strategy<Value = CandidateMove> {
        (arb_score(), 1u32..4, 1usize..4, 0usize..SQUARES.len()).prop_map(
            |(score, depth, pv_len, sq)| {
                let pv: Vec<&str> = std::iter::repeat(SQUARES[sq]).take(pv_len).collect();
                cand(&pv, score, depth)
            },
        )
    }

    proptest! {
        #[test]
        fn prop_compare_is_antisymmetric(a in arb_candidate(), b in arb_candidate()) {
            prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
        }

        #[test]
        fn prop_rank_is_idempotent(mut list in prop::collection::vec(arb_candidate(), 0..12)) {
            rank(&mut list);
            let once = list.clone();
            rank(&mut list);
            prop_assert_eq!(once, list);
        }

        #[test]
        fn prop_equal_entries_keep_insertion_order(
            seed in arb_candidate(),
            order in Just((0..SQUARES.len()).collect::<Vec<_>>()).prop_shuffle(),
        ) {
            // Same score, depth and variation length; only the move differs.
            let list: Vec<CandidateMove> = order
                .iter()
                .map(|&i| {
                    let mut c = seed.clone();
                    let mv = parse_uci_move(SQUARES[i]).unwrap();
                    c.mv = mv;
                    c.pv = vec![mv; seed.pv.len()];
                    c
                })
                .collect();
            let mut first = list.clone();
            let mut second = list.clone();
            rank(&mut first);
            rank(&mut second);
            prop_assert_eq!(tokens(&first), tokens(&list));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_ranked_list_is_sorted(mut list in prop::collection::vec(arb_candidate(), 0..12)) {
            rank(&mut list);
            for pair in list.windows(2) {
                prop_assert_ne!(compare(&pair[0], &pair[1]), Ordering::Greater);
            }
        }
    }
}
