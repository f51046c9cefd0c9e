//! Commands sent to the engine, encoded as single wire lines.

use std::fmt;

use chess::format_uci_move;
use cozy_chess::Move;

/// One command line for the engine. `Display` renders the wire form without
/// the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Handshake.
    Uci,
    /// Readiness probe.
    IsReady,
    SetOption { name: String, value: Option<String> },
    UciNewGame,
    /// `fen: None` means the standard start position.
    SetPosition { fen: Option<String>, moves: Vec<Move> },
    Go(GoParams),
    Stop,
    Quit,
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub movetime: Option<u64>, // Move time in milliseconds
    pub depth: Option<u32>,    // Search depth
    pub infinite: bool,        // Search until "stop"
}

impl GoParams {
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Default::default()
        }
    }
}

/// A named engine option, re-issued after every handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOption {
    pub name: String,
    pub value: String,
}

impl EngineOption {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
        }
    }

    pub fn to_command(&self) -> EngineCommand {
        EngineCommand::SetOption {
            name: self.name.clone(),
            value: Some(self.value.clone()),
        }
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uci => f.write_str("uci"),
            Self::IsReady => f.write_str("isready"),
            Self::SetOption { name, value } => match value {
                Some(value) => write!(f, "setoption name {} value {}", name, value),
                None => write!(f, "setoption name {}", name),
            },
            Self::UciNewGame => f.write_str("ucinewgame"),
            Self::SetPosition { fen, moves } => {
                match fen {
                    Some(fen) => write!(f, "position fen {}", fen)?,
                    None => f.write_str("position startpos")?,
                }
                if !moves.is_empty() {
                    f.write_str(" moves")?;
                    for mv in moves {
                        write!(f, " {}", format_uci_move(*mv))?;
                    }
                }
                Ok(())
            }
            Self::Go(params) => {
                f.write_str("go")?;
                if let Some(movetime) = params.movetime {
                    write!(f, " movetime {}", movetime)
                } else if let Some(depth) = params.depth {
                    write!(f, " depth {}", depth)
                } else if params.infinite {
                    f.write_str(" infinite")
                } else {
                    // Default 1 second
                    f.write_str(" movetime 1000")
                }
            }
            Self::Stop => f.write_str("stop"),
            Self::Quit => f.write_str("quit"),
        }
    }
}
