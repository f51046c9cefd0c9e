//! Shared analysis types: move tokens, scores, candidate moves, the ranking
//! policy and the live candidate set.

pub mod aggregator;
pub mod analysis;
pub mod candidate;
pub mod ranking;
pub mod uci;

pub use aggregator::{CandidateSet, MergeOutcome};
pub use analysis::Score;
pub use candidate::{CandidateMove, QualityClass};
pub use uci::{
    format_piece, format_square, format_uci_move, parse_square, parse_uci_move, MoveTokenError,
};
