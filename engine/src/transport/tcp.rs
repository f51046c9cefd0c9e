use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use super::{event_channel, spawn_line_reader, Transport, TransportError, TransportEvent};

/// Remote engine reached over a TCP socket carrying UCI lines.
pub struct TcpTransport {
    /// `host:port`, resolved on every connect.
    addr: String,
    writer: Option<OwnedWriteHalf>,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            writer: None,
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(&mut self) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        self.close().await;

        tracing::info!("Connecting to engine at {}", self.addr);
        let stream = TcpStream::connect(self.addr.as_str()).await.map_err(|e| {
            tracing::warn!("Failed to connect to {}: {}", self.addr, e);
            TransportError::Io(e)
        })?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();

        let (tx, rx) = event_channel();
        let _ = tx.send(TransportEvent::Opened).await;
        spawn_line_reader(BufReader::new(read_half), tx, self.describe());

        self.writer = Some(write_half);
        Ok(rx)
    }

    async fn send(&mut self, line: &str) {
        let Some(writer) = self.writer.as_mut() else {
            tracing::warn!("Dropping line for closed engine socket: {}", line);
            return;
        };
        tracing::trace!("UCI >> {}", line);
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        if let Err(e) = writer.write_all(&buf).await {
            tracing::error!("Failed to write to engine socket: {}", e);
        }
    }

    async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.shutdown().await;
        }
    }

    fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}
