use serde::Serialize;

/// Point-in-time view of a board, for status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub id: String,
    pub engine: String,
    pub engine_state: String,
    pub connected: bool,
    pub evaluating: bool,
    pub generation: u64,
    pub fen: Option<String>,
    pub player_turn: bool,
    /// Ranked candidate tokens of the current or last search, best first.
    pub candidates: Vec<String>,
    pub premoves_used: u32,
    pub premove_limit_reached: bool,
}
