//! Typed engine and decision settings.
//!
//! The settings collaborator speaks a flat key/value map. Keys are the
//! kebab-case field names of [`Settings`]; missing keys take the defaults
//! below and every decoded map is validated before it is used.

mod source;

use std::path::PathBuf;
use std::time::Duration;

use engine::{Endpoint, EngineOption, GoParams, ReconnectPolicy, StopAck};
use serde::{Deserialize, Serialize};

pub use source::{FileSettingsSource, SettingsSource, SettingsStore, StaticSettingsSource};

use crate::board::timing::Jitter;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Settings source unavailable")]
    Unavailable,
}

/// How the engine acknowledges `stop`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopAckMode {
    #[default]
    Bestmove,
    Immediate,
}

impl From<StopAckMode> for StopAck {
    fn from(mode: StopAckMode) -> Self {
        match mode {
            StopAckMode::Bestmove => StopAck::BestMove,
            StopAckMode::Immediate => StopAck::Immediate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Socket transport when true, child process otherwise.
    pub api_stockfish: bool,
    pub url_api_stockfish: String,
    pub engine_path: Option<PathBuf>,
    pub num_cores: u32,
    /// Hash table size in MB.
    pub hashtable_ram: u32,
    pub depth: u32,
    pub multipv: u32,
    /// Mate horizon in moves. Zero disables the mate shortcut and
    /// high-mate-chance.
    pub mate_finder_value: u32,
    pub highmatechance: bool,
    pub legit_auto_move: bool,
    pub auto_move_time: u64,
    pub auto_move_time_random: u64,
    pub auto_move_time_random_div: u64,
    pub auto_move_time_random_multi: u64,
    /// Percent chance that the top move is played as is.
    pub best_move_chance: u32,
    pub random_best_move: bool,
    pub premove_enabled: bool,
    pub max_premoves: u32,
    pub premove_time: u64,
    pub premove_time_random: u64,
    pub premove_time_random_div: u64,
    pub premove_time_random_multi: u64,
    pub show_hints: bool,
    pub move_analysis: bool,
    pub depth_bar: bool,
    pub evaluation_bar: bool,
    pub stop_ack: StopAckMode,
    pub drop_stale_moves: bool,
    pub fallback_move_delay: u64,
    pub reconnect_base_delay: u64,
    pub reconnect_max_delay: u64,
    pub reconnect_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_stockfish: true,
            url_api_stockfish: "localhost:8000".to_string(),
            engine_path: None,
            num_cores: 1,
            hashtable_ram: 1024,
            depth: 15,
            multipv: 3,
            mate_finder_value: 5,
            highmatechance: false,
            legit_auto_move: false,
            auto_move_time: 5000,
            auto_move_time_random: 2000,
            auto_move_time_random_div: 10,
            auto_move_time_random_multi: 1000,
            best_move_chance: 30,
            random_best_move: false,
            premove_enabled: false,
            max_premoves: 3,
            premove_time: 1000,
            premove_time_random: 500,
            premove_time_random_div: 100,
            premove_time_random_multi: 1,
            show_hints: true,
            move_analysis: true,
            depth_bar: true,
            evaluation_bar: true,
            stop_ack: StopAckMode::Bestmove,
            drop_stale_moves: true,
            fallback_move_delay: 1000,
            reconnect_base_delay: 2000,
            reconnect_max_delay: 10_000,
            reconnect_attempts: 5,
        }
    }
}

impl Settings {
    /// Decode and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Decode and validate a full replacement map.
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_value(serde_json::Value::Object(map))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=99).contains(&self.depth) {
            return Err(invalid("depth", format!("{} not in 1..=99", self.depth)));
        }
        if !(1..=10).contains(&self.multipv) {
            return Err(invalid("multipv", format!("{} not in 1..=10", self.multipv)));
        }
        if self.best_move_chance > 100 {
            return Err(invalid(
                "best-move-chance",
                format!("{} is not a percentage", self.best_move_chance),
            ));
        }
        if self.reconnect_max_delay < self.reconnect_base_delay {
            return Err(invalid(
                "reconnect-max-delay",
                "must not be below reconnect-base-delay".to_string(),
            ));
        }
        if self.api_stockfish && tcp_address(&self.url_api_stockfish).is_empty() {
            return Err(invalid("url-api-stockfish", "empty address".to_string()));
        }
        Ok(())
    }

    /// Options issued to the engine after every handshake.
    pub fn engine_options(&self) -> Vec<EngineOption> {
        vec![
            EngineOption::new("Threads", self.num_cores.clamp(1, 16)),
            EngineOption::new("Hash", self.hashtable_ram.clamp(1, 2048)),
            EngineOption::new("MultiPV", self.multipv),
        ]
    }

    pub fn go_params(&self) -> GoParams {
        GoParams::depth(self.depth)
    }

    pub fn endpoint(&self) -> Endpoint {
        if self.api_stockfish {
            Endpoint::Tcp {
                addr: tcp_address(&self.url_api_stockfish).to_string(),
            }
        } else {
            Endpoint::Process {
                path: self.engine_path.clone(),
            }
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(self.reconnect_base_delay),
            max_delay: Duration::from_millis(self.reconnect_max_delay),
            max_attempts: self.reconnect_attempts,
        }
    }

    pub fn auto_move_jitter(&self) -> Jitter {
        Jitter {
            base: self.auto_move_time,
            random: self.auto_move_time_random,
            div: self.auto_move_time_random_div,
            multi: self.auto_move_time_random_multi,
        }
    }

    pub fn premove_jitter(&self) -> Jitter {
        Jitter {
            base: self.premove_time,
            random: self.premove_time_random,
            div: self.premove_time_random_div,
            multi: self.premove_time_random_multi,
        }
    }

    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_move_delay)
    }
}

fn invalid(key: &'static str, reason: String) -> SettingsError {
    SettingsError::Invalid { key, reason }
}

/// `host:port` from a configured URL, tolerating a `ws://` or `tcp://`
/// scheme and a trailing path.
fn tcp_address(url: &str) -> &str {
    let rest = url
        .strip_prefix("ws://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);
    rest.split('/').next().unwrap_or(rest).trim()
}
