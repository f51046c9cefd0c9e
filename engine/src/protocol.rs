//! UCI conversation state machine.
//!
//! [`EngineProtocol`] does no I/O. Callers feed it transport and engine
//! signals, collect the commands it wants sent with
//! [`EngineProtocol::take_outgoing`], and run the continuations it hands
//! back when readiness or a stop completes. At most one `go` is ever
//! outstanding.

use std::collections::VecDeque;

use crate::continuation::ContinuationQueue;
use crate::uci::{EngineCommand, EngineOption, GoParams};

/// Externally visible protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    Idle,
    AwaitingHandshake,
    Ready,
    Evaluating,
    Stopping,
    Reconnecting,
}

/// How an engine family acknowledges `stop`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopAck {
    /// The engine answers `stop` with a final `bestmove`.
    #[default]
    BestMove,
    /// No acknowledgement is observed; the stop counts as complete at once.
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("an evaluation is already in flight")]
    AlreadyEvaluating,
}

/// What a `bestmove` line means for the conversation.
#[derive(Debug, PartialEq, Eq)]
pub enum BestMoveOutcome<C> {
    /// Terminal line of the running search.
    Accepted,
    /// Acknowledges an outstanding stop; the continuations must now run.
    StopCompleted(Vec<C>),
    /// No search was in flight.
    Unexpected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Idle,
    AwaitingHandshake,
    Ready,
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Search {
    Idle,
    Running,
    Stopping,
}

#[derive(Debug)]
pub struct EngineProtocol<C> {
    link: Link,
    search: Search,
    stop_ack: StopAck,
    options: Vec<EngineOption>,
    deferred: VecDeque<EngineCommand>,
    outgoing: Vec<EngineCommand>,
    ready: ContinuationQueue<C>,
    stopped: ContinuationQueue<C>,
    ready_probe_sent: bool,
    closing: bool,
}

impl<C> EngineProtocol<C> {
    pub fn new(stop_ack: StopAck, options: Vec<EngineOption>) -> Self {
        Self {
            link: Link::Idle,
            search: Search::Idle,
            stop_ack,
            options,
            deferred: VecDeque::new(),
            outgoing: Vec::new(),
            ready: ContinuationQueue::new(),
            stopped: ContinuationQueue::new(),
            ready_probe_sent: false,
            closing: false,
        }
    }

    pub fn state(&self) -> ProtocolState {
        match (self.link, self.search) {
            (Link::Idle, _) => ProtocolState::Idle,
            (Link::AwaitingHandshake, _) => ProtocolState::AwaitingHandshake,
            (Link::Reconnecting, _) => ProtocolState::Reconnecting,
            (Link::Ready, Search::Idle) => ProtocolState::Ready,
            (Link::Ready, Search::Running) => ProtocolState::Evaluating,
            (Link::Ready, Search::Stopping) => ProtocolState::Stopping,
        }
    }

    /// True from `go` until the terminal `bestmove` or a completed stop.
    pub fn is_evaluating(&self) -> bool {
        self.search != Search::Idle
    }

    /// True once the handshake has been acknowledged on the live connection.
    pub fn is_ready(&self) -> bool {
        self.link == Link::Ready
    }

    pub fn pending_ready(&self) -> usize {
        self.ready.len()
    }

    pub fn pending_stop(&self) -> usize {
        self.stopped.len()
    }

    pub fn set_stop_ack(&mut self, stop_ack: StopAck) {
        self.stop_ack = stop_ack;
    }

    /// Replace the engine options. A ready engine gets them immediately;
    /// otherwise they go out with the next handshake.
    pub fn set_options(&mut self, options: Vec<EngineOption>) {
        if options == self.options {
            return;
        }
        self.options = options;
        if self.link == Link::Ready {
            let commands: Vec<_> = self.options.iter().map(EngineOption::to_command).collect();
            self.outgoing.extend(commands);
        }
    }

    /// Commands to write to the transport, in order.
    pub fn take_outgoing(&mut self) -> Vec<EngineCommand> {
        std::mem::take(&mut self.outgoing)
    }

    /// Queue a command, deferring it until the handshake completes.
    pub fn send(&mut self, cmd: EngineCommand) {
        if self.link == Link::Ready {
            self.outgoing.push(cmd);
        } else {
            tracing::debug!("Deferring command until ready: {}", cmd);
            self.deferred.push_back(cmd);
        }
    }

    /// The transport opened: start the handshake.
    pub fn on_open(&mut self) {
        tracing::debug!("Transport open, sending handshake");
        self.link = Link::AwaitingHandshake;
        self.search = Search::Idle;
        self.closing = false;
        self.ready_probe_sent = false;
        self.outgoing.push(EngineCommand::Uci);
    }

    /// `uciok` arrived.
    pub fn on_handshake(&mut self) {
        if self.link != Link::AwaitingHandshake {
            tracing::debug!("Ignoring handshake ack in state {:?}", self.state());
            return;
        }
        tracing::debug!("Handshake acknowledged, engine ready");
        self.link = Link::Ready;
        let options: Vec<_> = self.options.iter().map(EngineOption::to_command).collect();
        self.outgoing.extend(options);
        self.outgoing.extend(self.deferred.drain(..));
        if !self.ready.is_empty() {
            self.probe_ready();
        }
    }

    /// Run `then` at the next `readyok`.
    pub fn when_ready(&mut self, then: C) {
        self.ready.push(then);
        if self.link == Link::Ready {
            self.probe_ready();
        }
    }

    fn probe_ready(&mut self) {
        if !self.ready_probe_sent {
            self.ready_probe_sent = true;
            self.outgoing.push(EngineCommand::IsReady);
        }
    }

    /// `readyok` arrived: every continuation queued so far, in FIFO order.
    pub fn on_ready_ack(&mut self) -> Vec<C> {
        self.ready_probe_sent = false;
        self.ready.drain()
    }

    /// Submit a position and start searching it.
    pub fn request_evaluation(
        &mut self,
        position: EngineCommand,
        go: GoParams,
    ) -> Result<(), ProtocolError> {
        if self.is_evaluating() {
            tracing::error!(
                "Evaluation requested while another is in flight ({:?})",
                self.state()
            );
            return Err(ProtocolError::AlreadyEvaluating);
        }
        self.send(position);
        self.send(EngineCommand::Go(go));
        self.search = Search::Running;
        Ok(())
    }

    /// Drive any running search to a stop, then run `then`.
    ///
    /// Returns the continuations that may run right away: all of them when
    /// nothing was in flight or the engine family never acknowledges stops.
    pub fn request_stop(&mut self, then: C) -> Vec<C> {
        self.stopped.push(then);
        match self.search {
            Search::Idle => self.stopped.drain(),
            Search::Stopping => Vec::new(),
            Search::Running => {
                tracing::debug!("Stopping running search");
                self.send(EngineCommand::Stop);
                self.send(EngineCommand::UciNewGame);
                match self.stop_ack {
                    StopAck::BestMove => {
                        self.search = Search::Stopping;
                        Vec::new()
                    }
                    StopAck::Immediate => {
                        self.search = Search::Idle;
                        self.stopped.drain()
                    }
                }
            }
        }
    }

    /// `bestmove` arrived.
    pub fn on_best_move(&mut self) -> BestMoveOutcome<C> {
        match self.search {
            Search::Running => {
                self.search = Search::Idle;
                BestMoveOutcome::Accepted
            }
            Search::Stopping => {
                tracing::debug!("Stop acknowledged");
                self.search = Search::Idle;
                BestMoveOutcome::StopCompleted(self.stopped.drain())
            }
            Search::Idle => BestMoveOutcome::Unexpected,
        }
    }

    /// Begin an intentional shutdown.
    pub fn close(&mut self) {
        self.closing = true;
        if matches!(self.link, Link::Ready | Link::AwaitingHandshake) {
            self.outgoing.push(EngineCommand::Quit);
        }
    }

    /// The transport closed or failed. Returns true when the loss was not
    /// intentional and the connection should be re-established.
    ///
    /// Work waiting on a stop is carried over to the next readiness so it is
    /// never lost with the connection.
    pub fn on_closed(&mut self) -> bool {
        self.search = Search::Idle;
        self.ready_probe_sent = false;
        self.ready.absorb_front(&mut self.stopped);
        if self.closing {
            self.link = Link::Idle;
            false
        } else {
            tracing::debug!("Connection lost, awaiting reconnect");
            self.link = Link::Reconnecting;
            true
        }
    }
}
