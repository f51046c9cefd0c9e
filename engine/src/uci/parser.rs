use chess::{parse_uci_move, CandidateMove, Score};
use cozy_chess::Move;

use super::UciError;

/// Incoming line from a UCI engine, classified.
#[derive(Debug, Clone)]
pub enum UciMessage {
    Id { name: String, value: String },
    /// `uciok`: the handshake is acknowledged.
    UciOk,
    /// `readyok`: the engine is idle and ready.
    ReadyOk,
    /// Terminal line of a search. `mv` is `None` for `bestmove (none)`.
    BestMove { mv: Option<Move>, ponder: Option<Move> },
    Info(EngineInfo),
}

/// Engine analysis information from one `info` line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<Move>,
    pub multipv: Option<u32>,
    pub currmove: Option<Move>,
    pub hashfull: Option<u16>,
    pub nps: Option<u64>,
}

impl EngineInfo {
    /// A candidate move, if this line jointly carries a depth, a score and a
    /// principal variation. Anything less is partial output and yields `None`.
    pub fn to_candidate(&self) -> Option<CandidateMove> {
        let depth = self.depth?;
        let score = self.score?;
        CandidateMove::new(self.pv.clone(), score, depth, self.multipv.unwrap_or(1))
    }
}

/// Parse one line of engine output.
pub fn parse_uci_message(line: &str) -> Result<UciMessage, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(UciError::MalformedMessage(line.to_string()));
            }
            Ok(UciMessage::Id {
                name: tokens[1].to_string(),
                value: tokens[2..].join(" "),
            })
        }

        Some(&"bestmove") => {
            let mv = match tokens.get(1) {
                Some(&"(none)") => None,
                Some(token) => Some(parse_uci_move(token)?),
                None => return Err(UciError::MalformedMessage(line.to_string())),
            };
            let ponder = match (tokens.get(2), tokens.get(3)) {
                (Some(&"ponder"), Some(token)) => parse_uci_move(token).ok(),
                _ => None,
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..]))),

        _ => Err(UciError::UnknownMessage(line.to_string())),
    }
}

/// Parse the fields of an `info` line. Unknown keywords and unparseable
/// values are skipped rather than rejected.
fn parse_info_line(tokens: &[&str]) -> EngineInfo {
    let mut info = EngineInfo::default();
    let mut i = 0;

    while i < tokens.len() {
        let value = tokens.get(i + 1).copied();
        match tokens[i] {
            "depth" => info.depth = value.and_then(|s| s.parse().ok()),
            "seldepth" => info.seldepth = value.and_then(|s| s.parse().ok()),
            "time" => info.time_ms = value.and_then(|s| s.parse().ok()),
            "nodes" => info.nodes = value.and_then(|s| s.parse().ok()),
            "nps" => info.nps = value.and_then(|s| s.parse().ok()),
            "multipv" => info.multipv = value.and_then(|s| s.parse().ok()),
            "hashfull" => info.hashfull = value.and_then(|s| s.parse().ok()),
            "currmove" => info.currmove = value.and_then(|s| parse_uci_move(s).ok()),
            "score" => {
                let raw = tokens.get(i + 2).and_then(|s| s.parse::<i32>().ok());
                info.score = match (value, raw) {
                    (Some("cp"), Some(cp)) => Some(Score::Centipawns(cp)),
                    (Some("mate"), Some(m)) => Some(Score::Mate(m)),
                    _ => None,
                };
                // Optional bound qualifier after the value.
                i += match tokens.get(i + 3) {
                    Some(&"lowerbound") | Some(&"upperbound") => 4,
                    _ => 3,
                };
                continue;
            }
            "pv" => {
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    match parse_uci_move(tokens[i]) {
                        Ok(mv) => info.pv.push(mv),
                        Err(_) => break,
                    }
                    i += 1;
                }
                continue;
            }
            // Free text runs to the end of the line.
            "string" => break,
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    info
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
            | "refutation"
            | "currline"
    )
}
