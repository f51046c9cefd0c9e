use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::*;
use super::events::Effect;
use super::snapshot::BoardSnapshot;

/// Cheap, cloneable handle to a board actor.
#[derive(Clone)]
pub struct BoardHandle {
    id: String,
    cmd_tx: mpsc::Sender<BoardCommand>,
}

impl BoardHandle {
    pub(crate) fn new(id: String, cmd_tx: mpsc::Sender<BoardCommand>) -> Self {
        Self { id, cmd_tx }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn notify(&self, notification: UiNotification) -> Result<(), BoardError> {
        let (tx, rx) = oneshot::channel();
        self.send(BoardCommand::Notify {
            notification,
            reply: tx,
        })
        .await?;
        rx.await
            .map_err(|_| BoardError::Internal("Reply dropped".into()))?
    }

    pub async fn position_changed(&self, fen: impl Into<String>) -> Result<(), BoardError> {
        self.notify(UiNotification::PositionChanged { fen: fen.into() })
            .await
    }

    pub async fn turn_changed(&self, player_turn: bool) -> Result<(), BoardError> {
        self.notify(UiNotification::TurnChanged { player_turn })
            .await
    }

    pub async fn get_snapshot(&self) -> Result<BoardSnapshot, BoardError> {
        let (tx, rx) = oneshot::channel();
        self.send(BoardCommand::GetSnapshot { reply: tx }).await?;
        rx.await
            .map_err(|_| BoardError::Internal("Reply dropped".into()))
    }

    pub async fn subscribe(
        &self,
    ) -> Result<(BoardSnapshot, broadcast::Receiver<Effect>), BoardError> {
        let (tx, rx) = oneshot::channel();
        self.send(BoardCommand::Subscribe { reply: tx }).await?;
        rx.await
            .map_err(|_| BoardError::Internal("Reply dropped".into()))
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(BoardCommand::Shutdown).await;
    }

    async fn send(&self, cmd: BoardCommand) -> Result<(), BoardError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| BoardError::Internal("Board actor closed".into()))
    }
}
