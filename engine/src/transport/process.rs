use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::mpsc;

use super::{event_channel, spawn_line_reader, Transport, TransportError, TransportEvent};

/// Engine running as a local child process, spoken to over stdio.
pub struct ProcessTransport {
    path: Option<PathBuf>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl ProcessTransport {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            child: None,
            stdin: None,
        }
    }

    fn resolve_path(&self) -> Result<PathBuf, TransportError> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => find_stockfish_path().ok_or(TransportError::EngineNotFound),
        }
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    async fn open(&mut self) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        self.close().await;

        let path = self.resolve_path()?;
        tracing::info!("Spawning engine at {:?}", path);
        let mut child = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn engine: {}", e);
                TransportError::Io(e)
            })?;

        let stdin = child.stdin.take().ok_or(TransportError::NoStdin)?;
        let stdout = child.stdout.take().ok_or(TransportError::NoStdout)?;

        let (tx, rx) = event_channel();
        let _ = tx.send(TransportEvent::Opened).await;
        spawn_line_reader(BufReader::new(stdout), tx, path.display().to_string());

        self.child = Some(child);
        self.stdin = Some(stdin);
        Ok(rx)
    }

    async fn send(&mut self, line: &str) {
        let Some(stdin) = self.stdin.as_mut() else {
            tracing::warn!("Dropping line for closed engine process: {}", line);
            return;
        };
        tracing::trace!("UCI >> {}", line);
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        if let Err(e) = stdin.write_all(&buf).await {
            tracing::error!("Failed to write to engine stdin: {}", e);
            return;
        }
        if let Err(e) = stdin.flush().await {
            tracing::error!("Failed to flush engine stdin: {}", e);
        }
    }

    async fn close(&mut self) {
        // Dropping stdin gives the engine EOF on its input.
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            if tokio::time::timeout(Duration::from_secs(1), child.wait())
                .await
                .is_err()
            {
                tracing::debug!("Engine did not exit in time, killing it");
                let _ = child.kill().await;
            }
        }
    }

    fn is_open(&self) -> bool {
        self.stdin.is_some()
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("process:{}", path.display()),
            None => "process:stockfish".to_string(),
        }
    }
}

/// Find a Stockfish executable in common locations.
pub fn find_stockfish_path() -> Option<PathBuf> {
    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
        "stockfish", // In PATH
    ];

    for path_str in paths {
        let path = Path::new(path_str);
        if (path.exists() || path_str == "stockfish")
            && std::process::Command::new(path_str)
                .arg("--help")
                .output()
                .is_ok()
        {
            return Some(PathBuf::from(path_str));
        }
    }

    None
}
