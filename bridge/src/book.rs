//! Opening-book lookup used to label book moves.

use std::collections::HashSet;
use std::path::Path;

pub trait OpeningBook: Send + Sync {
    /// True when the position is a known book position.
    fn contains(&self, fen: &str) -> bool;
}

/// No book: nothing is ever a book position.
pub struct NoBook;

impl OpeningBook for NoBook {
    fn contains(&self, _fen: &str) -> bool {
        false
    }
}

/// Book positions listed one FEN per line. Positions compare on piece
/// placement, side to move, castling rights and en passant square; move
/// counters are ignored.
#[derive(Debug, Default)]
pub struct FenBook {
    positions: HashSet<String>,
}

impl FenBook {
    pub fn from_lines(text: &str) -> Self {
        let positions = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(position_key)
            .collect();
        Self { positions }
    }

    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        let book = Self::from_lines(&text);
        tracing::info!("Loaded {} book positions from {:?}", book.len(), path);
        Ok(book)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl OpeningBook for FenBook {
    fn contains(&self, fen: &str) -> bool {
        position_key(fen).is_some_and(|key| self.positions.contains(&key))
    }
}

fn position_key(fen: &str) -> Option<String> {
    let fields: Vec<&str> = fen.split_whitespace().take(4).collect();
    (fields.len() == 4).then(|| fields.join(" "))
}
