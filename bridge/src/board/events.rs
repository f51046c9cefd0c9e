use serde::Serialize;

use super::quality::MoveQuality;

/// Effects broadcast from a board actor to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Highlights { squares: Vec<Highlight> },
    Arrows { arrows: Vec<Arrow> },
    DepthProgress { percent: u8 },
    /// Centipawns, or the signed mate distance when `mate` is set.
    Evaluation { value: i32, mate: bool },
    MoveQuality {
        square: String,
        label: MoveQuality,
        color: &'static str,
    },
    ExecuteMove {
        from: String,
        to: String,
        promotion: Option<char>,
        premove: bool,
    },
    /// The per-game pre-move budget is used up. Sent once per game.
    PremoveLimitReached,
    ConnectionStatus { connected: bool },
    Reconnecting { attempt: u32, delay_ms: u64 },
    /// Retries are exhausted; only a reconnect request revives the link.
    EngineUnreachable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub square: String,
    pub color: &'static str,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrow {
    pub from: String,
    pub to: String,
    pub color: &'static str,
    pub opacity: f32,
}

/// Arrow color and opacity by rank, best first.
const ARROW_PALETTE: [(&str, f32); 5] = [
    ("#0080ff", 0.8),
    ("#00ff00", 0.7),
    ("#81c678", 0.6),
    ("#ffff00", 0.5),
    ("#ff6600", 0.4),
];

pub fn arrow_style(rank: usize) -> (&'static str, f32) {
    ARROW_PALETTE[rank.min(ARROW_PALETTE.len() - 1)]
}
