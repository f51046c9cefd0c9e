pub mod command;
pub mod parser;

pub use command::{EngineCommand, EngineOption, GoParams};
pub use parser::{parse_uci_message, EngineInfo, UciMessage};

#[derive(Debug, thiserror::Error)]
pub enum UciError {
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("Unknown UCI message: {0}")]
    UnknownMessage(String),
    #[error(transparent)]
    InvalidMove(#[from] chess::MoveTokenError),
}
