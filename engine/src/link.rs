//! A transport plus its reconnect schedule, as one awaitable event source.

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::supervisor::{ReconnectPolicy, RetryDecision, Supervisor};
use crate::transport::{Transport, TransportError, TransportEvent};
use crate::uci::EngineCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Transport(TransportEvent),
    /// A scheduled reconnect attempt is due.
    RetryDue,
}

pub struct EngineLink {
    transport: Box<dyn Transport>,
    events: Option<mpsc::Receiver<TransportEvent>>,
    supervisor: Supervisor,
    retry_at: Option<Instant>,
}

impl EngineLink {
    pub fn new(transport: Box<dyn Transport>, policy: ReconnectPolicy) -> Self {
        Self {
            transport,
            events: None,
            supervisor: Supervisor::new(policy),
            retry_at: None,
        }
    }

    pub fn describe(&self) -> String {
        self.transport.describe()
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn set_policy(&mut self, policy: ReconnectPolicy) {
        self.supervisor.set_policy(policy);
    }

    /// Replace the transport. The old one is closed first.
    pub async fn replace_transport(&mut self, transport: Box<dyn Transport>) {
        self.transport.close().await;
        self.events = None;
        self.transport = transport;
    }

    /// Open the transport. Success clears the failure counter.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        self.retry_at = None;
        let events = self.transport.open().await?;
        self.events = Some(events);
        self.supervisor.on_connected();
        tracing::info!("Connected to engine at {}", self.transport.describe());
        Ok(())
    }

    pub async fn send(&mut self, cmd: &EngineCommand) {
        self.transport.send(&cmd.to_string()).await;
    }

    pub async fn close(&mut self) {
        self.retry_at = None;
        self.events = None;
        self.transport.close().await;
    }

    /// Ask the supervisor whether to try again, arming the retry timer if so.
    pub fn schedule_retry(&mut self) -> RetryDecision {
        let decision = self.supervisor.next_attempt();
        if let RetryDecision::RetryAfter(delay) = decision {
            self.retry_at = Some(Instant::now() + delay);
        }
        decision
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_at.is_some()
    }

    /// Re-arm a supervisor that gave up. Returns true if it had.
    pub fn rearm(&mut self) -> bool {
        let was_parked = self.supervisor.is_parked();
        self.supervisor.rearm();
        was_parked
    }

    /// Wait for the next transport event or retry deadline. Never resolves
    /// while there is neither a live stream nor a pending retry.
    ///
    /// Cancel safe: nothing is awaited after an event is taken. On `Closed`
    /// the caller releases the transport with [`EngineLink::close`].
    pub async fn next_event(&mut self) -> LinkEvent {
        let retry_at = self.retry_at;
        tokio::select! {
            event = recv_or_pending(&mut self.events) => {
                let event = event.unwrap_or(TransportEvent::Closed);
                if event == TransportEvent::Closed {
                    self.events = None;
                }
                LinkEvent::Transport(event)
            }
            _ = sleep_or_pending(retry_at) => {
                self.retry_at = None;
                LinkEvent::RetryDue
            }
        }
    }
}

async fn recv_or_pending(
    events: &mut Option<mpsc::Receiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_or_pending(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
