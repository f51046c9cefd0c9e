//! Move-token codec for the long algebraic notation engines speak
//! (`e2e4`, `e7e8q`).

use cozy_chess::{File, Move, Piece, Rank, Square};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveTokenError {
    #[error("Invalid move token: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion piece in: {0}")]
    InvalidPromotion(String),
}

/// Parse a move token. The first two characters are the origin square, the
/// next two the target square and an optional fifth character names the
/// promotion piece.
pub fn parse_uci_move(token: &str) -> Result<Move, MoveTokenError> {
    if !token.is_ascii() || !(4..=5).contains(&token.len()) {
        return Err(MoveTokenError::InvalidMove(token.to_string()));
    }

    let from = parse_square(&token[0..2])?;
    let to = parse_square(&token[2..4])?;
    let promotion = match token.as_bytes().get(4) {
        Some(&c) => Some(
            parse_promotion(c as char)
                .ok_or_else(|| MoveTokenError::InvalidPromotion(token.to_string()))?,
        ),
        None => None,
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Parse a square name such as `e4`.
pub fn parse_square(s: &str) -> Result<Square, MoveTokenError> {
    let mut chars = s.chars();
    let (Some(f), Some(r), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(MoveTokenError::InvalidSquare(s.to_string()));
    };

    let file = ('a'..='h')
        .position(|c| c == f)
        .map(File::index)
        .ok_or_else(|| MoveTokenError::InvalidSquare(s.to_string()))?;
    let rank = ('1'..='8')
        .position(|c| c == r)
        .map(Rank::index)
        .ok_or_else(|| MoveTokenError::InvalidSquare(s.to_string()))?;

    Ok(Square::new(file, rank))
}

fn parse_promotion(c: char) -> Option<Piece> {
    match c {
        'q' => Some(Piece::Queen),
        'r' => Some(Piece::Rook),
        'b' => Some(Piece::Bishop),
        'n' => Some(Piece::Knight),
        _ => None,
    }
}

/// Format a move as its engine token (`e2e4`, `e7e8q`).
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format_square(mv.from);
    s.push_str(&format_square(mv.to));
    if let Some(piece) = mv.promotion {
        s.push(format_piece(piece));
    }
    s
}

/// Format a square as `e4`.
pub fn format_square(sq: Square) -> String {
    let file = (b'a' + sq.file() as u8) as char;
    let rank = (b'1' + sq.rank() as u8) as char;
    format!("{}{}", file, rank)
}

/// Lowercase piece letter used in promotion suffixes.
pub fn format_piece(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}
