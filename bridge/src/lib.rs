//! Bridge between a chess board UI and a UCI engine.
//!
//! The UI reports positions, turns and legal moves; each board actor keeps a
//! single engine conversation going, ranks the analysis, and answers with
//! hints, evaluations and (optionally) moves to play.

pub mod board;
pub mod book;
pub mod config;
pub mod settings;

pub use board::{BoardHandle, BoardManager, Effect, UiNotification};
pub use settings::Settings;
