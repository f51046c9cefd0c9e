//! Line-oriented links to an engine.
//!
//! Every transport delivers whole lines in arrival order on a fresh event
//! channel per successful [`Transport::open`], followed by exactly one
//! `Closed` (possibly preceded by `Error`) when the link ends.

mod channel;
mod process;
mod tcp;

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

pub use channel::{in_process, ChannelTransport, InProcessListener, WorkerConnection};
pub use process::{find_stockfish_path, ProcessTransport};
pub use tcp::TcpTransport;

const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Line(String),
    Closed,
    Error(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine executable not found")]
    EngineNotFound,

    #[error("Engine process has no stdin")]
    NoStdin,

    #[error("Engine process has no stdout")]
    NoStdout,

    #[error("Engine worker is gone")]
    WorkerGone,
}

/// A duplex line link to one engine instance.
#[async_trait]
pub trait Transport: Send {
    /// Establish the link. A successful open yields the event stream for
    /// this connection; `Opened` is always its first event.
    async fn open(&mut self) -> Result<mpsc::Receiver<TransportEvent>, TransportError>;

    /// Write one line. Has no effect when the link is not open.
    async fn send(&mut self, line: &str);

    /// Tear the link down. The event stream ends with `Closed`.
    async fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Human readable target, for logs.
    fn describe(&self) -> String;
}

/// Where the engine lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Local executable. `None` probes the usual install locations.
    Process { path: Option<PathBuf> },
    /// Remote engine speaking UCI over a socket, as `host:port`.
    Tcp { addr: String },
}

pub fn transport_for(endpoint: &Endpoint) -> Box<dyn Transport> {
    match endpoint {
        Endpoint::Process { path } => Box::new(ProcessTransport::new(path.clone())),
        Endpoint::Tcp { addr } => Box::new(TcpTransport::new(addr.clone())),
    }
}

/// Forward lines from `reader` as events until EOF or a read error, then
/// emit `Closed`. Blank lines are dropped; trailing `\r` is stripped.
pub(crate) fn spawn_line_reader<R>(reader: R, events: mpsc::Sender<TransportEvent>, label: String)
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim_end();
                    if trimmed.is_empty() {
                        continue;
                    }
                    tracing::trace!("UCI << {}", trimmed);
                    if events
                        .send(TransportEvent::Line(trimmed.to_string()))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::warn!("{} closed its output", label);
                    break;
                }
                Err(e) => {
                    tracing::error!("Error reading from {}: {}", label, e);
                    let _ = events.send(TransportEvent::Error(e.to_string())).await;
                    break;
                }
            }
        }
        let _ = events.send(TransportEvent::Closed).await;
        tracing::debug!("Reader for {} exiting", label);
    });
}

pub(crate) fn event_channel() -> (mpsc::Sender<TransportEvent>, mpsc::Receiver<TransportEvent>) {
    mpsc::channel(EVENT_BUFFER)
}
