use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};

use super::events::Effect;
use super::snapshot::BoardSnapshot;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BoardError {
    #[error("Board not found: {0}")]
    NotFound(String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Notifications from the board UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiNotification {
    PositionChanged {
        fen: String,
    },
    /// Whether the controlled side is to move.
    TurnChanged {
        player_turn: bool,
    },
    /// Legal moves of the controlled side as UCI tokens.
    LegalMoves {
        moves: Vec<String>,
    },
    LastMove {
        #[serde(rename = "move")]
        mv: String,
    },
    /// Full replacement settings map.
    OptionsChanged {
        options: serde_json::Map<String, serde_json::Value>,
    },
    NewGame,
    /// Re-arm the engine connection after it was given up on.
    Reconnect,
}

/// Commands sent to the board actor. Each embeds a oneshot for the reply.
pub enum BoardCommand {
    Notify {
        notification: UiNotification,
        reply: oneshot::Sender<Result<(), BoardError>>,
    },
    GetSnapshot {
        reply: oneshot::Sender<BoardSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<(BoardSnapshot, broadcast::Receiver<Effect>)>,
    },
    Shutdown,
}
