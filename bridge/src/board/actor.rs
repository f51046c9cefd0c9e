use engine::{transport_for, EngineLink, LinkEvent, TransportEvent};
use rand::Rng;
use tokio::sync::{broadcast, mpsc};
use tracing::Instrument;

use super::commands::*;
use super::controller::{BoardController, Output, ScheduledMove};
use super::events::Effect;
use super::snapshot::BoardSnapshot;
use crate::settings::Settings;

/// Owns the controller and the engine link of one board. Processes UI
/// commands, engine traffic and fired move timers sequentially.
pub(crate) async fn run_board_actor<R: Rng + Send + 'static>(
    id: String,
    controller: BoardController<R>,
    link: EngineLink,
    cmd_rx: mpsc::Receiver<BoardCommand>,
    event_tx: broadcast::Sender<Effect>,
) {
    let span = tracing::info_span!("board", id = %id);
    let (timer_tx, timer_rx) = mpsc::channel(32);
    let actor = BoardActor {
        id,
        controller,
        link,
        event_tx,
        timer_tx,
    };
    actor.run(cmd_rx, timer_rx).instrument(span).await;
}

struct BoardActor<R> {
    id: String,
    controller: BoardController<R>,
    link: EngineLink,
    event_tx: broadcast::Sender<Effect>,
    timer_tx: mpsc::Sender<ScheduledMove>,
}

impl<R: Rng + Send + 'static> BoardActor<R> {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<BoardCommand>,
        mut timer_rx: mpsc::Receiver<ScheduledMove>,
    ) {
        tracing::info!("Board actor started, engine at {}", self.link.describe());

        self.connect().await;
        self.flush().await;

        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(BoardCommand::Shutdown) | None => {
                            tracing::info!("Board actor shutting down");
                            self.controller.close();
                            self.flush().await;
                            self.link.close().await;
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }

                event = self.link.next_event() => {
                    self.handle_link_event(event).await;
                }

                Some(action) = timer_rx.recv() => {
                    self.controller.on_timer(action);
                }
            }
            self.flush().await;
        }

        tracing::info!("Board actor exited");
    }

    async fn handle_command(&mut self, cmd: BoardCommand) {
        match cmd {
            BoardCommand::Notify {
                notification,
                reply,
            } => {
                let result = self.notify(notification).await;
                let _ = reply.send(result);
            }
            BoardCommand::GetSnapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            BoardCommand::Subscribe { reply } => {
                let _ = reply.send((self.snapshot(), self.event_tx.subscribe()));
            }
            BoardCommand::Shutdown => {}
        }
    }

    async fn notify(&mut self, notification: UiNotification) -> Result<(), BoardError> {
        match notification {
            UiNotification::PositionChanged { fen } => self.controller.on_position_changed(fen),
            UiNotification::TurnChanged { player_turn } => {
                self.controller.on_turn_changed(player_turn)
            }
            UiNotification::LegalMoves { moves } => self.controller.on_legal_moves(&moves),
            UiNotification::LastMove { mv } => self.controller.on_last_move(&mv),
            UiNotification::NewGame => self.controller.new_game(),
            UiNotification::OptionsChanged { options } => {
                let settings = Settings::from_map(options).map_err(|e| {
                    tracing::warn!("Rejected settings update: {}", e);
                    BoardError::InvalidSettings(e.to_string())
                })?;
                self.apply_settings(settings).await;
            }
            UiNotification::Reconnect => {
                let was_parked = self.link.rearm();
                if was_parked || !self.link.is_open() {
                    tracing::info!("Reconnect requested");
                    self.connect().await;
                }
            }
        }
        Ok(())
    }

    async fn apply_settings(&mut self, settings: Settings) {
        let endpoint = settings.endpoint();
        let endpoint_changed = endpoint != self.controller.settings().endpoint();
        self.link.set_policy(settings.reconnect_policy());
        self.controller.apply_settings(settings);

        if endpoint_changed {
            tracing::info!("Engine endpoint changed, switching to {:?}", endpoint);
            self.controller.close();
            self.flush().await;
            self.link.replace_transport(transport_for(&endpoint)).await;
            self.controller.on_closed();
            self.connect().await;
        }
    }

    async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Transport(TransportEvent::Opened) => self.controller.on_open(),
            LinkEvent::Transport(TransportEvent::Line(line)) => self.controller.on_line(&line),
            LinkEvent::Transport(TransportEvent::Error(e)) => {
                tracing::warn!("Engine transport error: {}", e);
            }
            LinkEvent::Transport(TransportEvent::Closed) => {
                tracing::info!("Engine connection closed");
                self.link.close().await;
                if self.controller.on_closed() {
                    self.schedule_retry();
                }
            }
            LinkEvent::RetryDue => {
                tracing::info!(
                    "Reconnecting to engine (attempt {})",
                    self.link.supervisor().attempts()
                );
                self.connect().await;
            }
        }
    }

    async fn connect(&mut self) {
        if let Err(e) = self.link.connect().await {
            tracing::warn!("Failed to connect to {}: {}", self.link.describe(), e);
            self.schedule_retry();
        }
    }

    fn schedule_retry(&mut self) {
        let decision = self.link.schedule_retry();
        let attempt = self.link.supervisor().attempts();
        self.controller.on_retry_scheduled(decision, attempt);
    }

    /// Carry out everything the controller produced.
    async fn flush(&mut self) {
        for output in self.controller.take_outputs() {
            match output {
                Output::Send(cmd) => self.link.send(&cmd).await,
                Output::Emit(effect) => {
                    let _ = self.event_tx.send(effect);
                }
                Output::Schedule { delay, action } => {
                    let timer_tx = self.timer_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = timer_tx.send(action).await;
                    });
                }
            }
        }
    }

    fn snapshot(&self) -> BoardSnapshot {
        self.controller.snapshot(&self.id, &self.link.describe())
    }
}
