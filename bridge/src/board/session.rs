//! State of the current search and memory of the last completed one.

use chess::{CandidateMove, CandidateSet};

/// Outcome of a completed search, kept for judging the move that follows.
#[derive(Debug, Clone)]
pub struct CompletedSearch {
    pub fen: String,
    pub top: CandidateMove,
    pub moves: Vec<CandidateMove>,
}

#[derive(Debug, Default)]
pub struct SearchSession {
    /// Bumped for every submitted search. Scheduled moves carry it.
    pub generation: u64,
    pub is_evaluating: bool,
    /// A stop is outstanding; analysis lines are not merged meanwhile.
    pub stop_requested: bool,
    pub fen: Option<String>,
    pub current: CandidateSet,
    pub previous: Option<CompletedSearch>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a new search for `fen`.
    pub fn begin(&mut self, fen: String) -> u64 {
        self.generation += 1;
        self.is_evaluating = true;
        self.stop_requested = false;
        self.current.clear();
        self.fen = Some(fen);
        self.generation
    }

    pub fn request_stop(&mut self) {
        if self.is_evaluating {
            self.stop_requested = true;
        }
    }

    /// The engine confirmed the stop.
    pub fn stop_completed(&mut self) {
        self.is_evaluating = false;
    }

    /// Whether analysis lines should be merged right now.
    pub fn accepts_updates(&self) -> bool {
        self.is_evaluating && !self.stop_requested
    }

    /// The search ended with `top` as its answer.
    pub fn complete(&mut self, top: Option<CandidateMove>, moves: Vec<CandidateMove>) {
        self.is_evaluating = false;
        if let (Some(top), Some(fen)) = (top, self.fen.clone()) {
            self.previous = Some(CompletedSearch { fen, top, moves });
        }
    }

    /// The connection dropped. Returns true if a search was cut short.
    pub fn abandon(&mut self) -> bool {
        let was_running = self.is_evaluating && !self.stop_requested;
        self.is_evaluating = false;
        self.stop_requested = false;
        was_running
    }

    /// Forget everything tied to the current game.
    pub fn reset_game(&mut self) {
        self.previous = None;
    }
}
