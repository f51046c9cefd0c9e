use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::{event_channel, Transport, TransportError, TransportEvent};

const LINE_BUFFER: usize = 256;

/// One accepted in-process connection, seen from the engine worker's side.
pub struct WorkerConnection {
    /// Lines the client sent, without trailing newline.
    pub commands: mpsc::Receiver<String>,
    /// Lines to deliver to the client. Dropping this closes the connection.
    pub lines: mpsc::Sender<String>,
}

/// Worker side of an in-process engine link. Each client `open` shows up
/// here as a new [`WorkerConnection`].
pub struct InProcessListener {
    incoming: mpsc::Receiver<WorkerConnection>,
}

impl InProcessListener {
    /// Wait for the next connection. `None` once the client side is gone.
    pub async fn accept(&mut self) -> Option<WorkerConnection> {
        self.incoming.recv().await
    }
}

/// Client side of an engine running on a task in this process.
pub struct ChannelTransport {
    connect: mpsc::Sender<WorkerConnection>,
    commands: Option<mpsc::Sender<String>>,
    shutdown: Option<oneshot::Sender<()>>,
}

/// Create a connected client transport and worker listener pair.
pub fn in_process() -> (ChannelTransport, InProcessListener) {
    let (connect, incoming) = mpsc::channel(4);
    (
        ChannelTransport {
            connect,
            commands: None,
            shutdown: None,
        },
        InProcessListener { incoming },
    )
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn open(&mut self) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        self.close().await;

        let (cmd_tx, cmd_rx) = mpsc::channel(LINE_BUFFER);
        let (line_tx, mut line_rx) = mpsc::channel::<String>(LINE_BUFFER);
        self.connect
            .send(WorkerConnection {
                commands: cmd_rx,
                lines: line_tx,
            })
            .await
            .map_err(|_| TransportError::WorkerGone)?;

        let (events_tx, events_rx) = event_channel();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let _ = events_tx.send(TransportEvent::Opened).await;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    line = line_rx.recv() => match line {
                        Some(line) => {
                            tracing::trace!("UCI << {}", line);
                            if events_tx.send(TransportEvent::Line(line)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                    _ = &mut shutdown_rx => break,
                }
            }
            let _ = events_tx.send(TransportEvent::Closed).await;
        });

        self.commands = Some(cmd_tx);
        self.shutdown = Some(shutdown_tx);
        Ok(events_rx)
    }

    async fn send(&mut self, line: &str) {
        let Some(commands) = self.commands.as_ref() else {
            tracing::warn!("Dropping line for closed in-process engine: {}", line);
            return;
        };
        tracing::trace!("UCI >> {}", line);
        if commands.send(line.to_string()).await.is_err() {
            tracing::warn!("In-process engine stopped reading");
        }
    }

    async fn close(&mut self) {
        self.commands = None;
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }

    fn is_open(&self) -> bool {
        self.commands.is_some()
    }

    fn describe(&self) -> String {
        "in-process".to_string()
    }
}
