//! One actor per controlled board: it drives the engine conversation and
//! turns finished searches into hints and moves.

mod actor;
pub mod commands;
pub mod controller;
pub mod decision;
pub mod events;
pub mod handle;
pub mod quality;
pub mod session;
pub mod snapshot;
pub mod timing;

use std::collections::HashMap;
use std::sync::Arc;

use engine::{EngineLink, Transport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use crate::book::OpeningBook;
use crate::settings::Settings;
use actor::run_board_actor;
pub use commands::{BoardError, UiNotification};
pub use controller::{BoardController, Output, ScheduledMove};
pub use events::{Arrow, Effect, Highlight};
pub use handle::BoardHandle;
pub use quality::MoveQuality;
pub use snapshot::BoardSnapshot;

/// Manages all active boards. Spawns an actor task per board.
pub struct BoardManager {
    boards: RwLock<HashMap<String, BoardHandle>>,
    book: Arc<dyn OpeningBook>,
}

impl BoardManager {
    pub fn new(book: Arc<dyn OpeningBook>) -> Self {
        Self {
            boards: RwLock::new(HashMap::new()),
            book,
        }
    }

    /// Spawn a board talking to the engine over `transport`. The returned
    /// receiver is subscribed before the actor starts, so no effect is missed.
    pub async fn create_board(
        &self,
        settings: Settings,
        transport: Box<dyn Transport>,
    ) -> (BoardHandle, broadcast::Receiver<Effect>) {
        let board_id = Uuid::new_v4().to_string();
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = broadcast::channel(100);

        let link = EngineLink::new(transport, settings.reconnect_policy());
        let controller = BoardController::new(settings, self.book.clone(), StdRng::from_entropy());

        let id = board_id.clone();
        tokio::spawn(async move {
            run_board_actor(id, controller, link, cmd_rx, event_tx).await;
        });

        let handle = BoardHandle::new(board_id.clone(), cmd_tx);
        self.boards.write().await.insert(board_id, handle.clone());
        tracing::info!("Board {} created", handle.id());

        (handle, event_rx)
    }

    pub async fn get_handle(&self, board_id: &str) -> Result<BoardHandle, BoardError> {
        self.boards
            .read()
            .await
            .get(board_id)
            .cloned()
            .ok_or_else(|| BoardError::NotFound(board_id.to_string()))
    }

    pub async fn close_board(&self, board_id: &str) -> Result<(), BoardError> {
        let handle = self
            .boards
            .write()
            .await
            .remove(board_id)
            .ok_or_else(|| BoardError::NotFound(board_id.to_string()))?;
        handle.shutdown().await;
        Ok(())
    }

    pub async fn list(&self) -> Vec<String> {
        self.boards.read().await.keys().cloned().collect()
    }
}
