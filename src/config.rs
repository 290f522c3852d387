//! Runtime configuration, read from the environment (after `.env`).

use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::blockchain::{BASE_REWARD, DEFAULT_BLOCK_CAPACITY, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};

/// Which end of the hex hash must carry the run of zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowDirection {
    #[default]
    Leading,
    Trailing,
}

impl PowDirection {
    /// True when `hash` carries `difficulty` zero characters at this end.
    pub fn is_satisfied(self, hash: &str, difficulty: u32) -> bool {
        let n = difficulty as usize;
        if n > hash.len() {
            return false;
        }
        match self {
            PowDirection::Leading => hash.chars().take(n).all(|c| c == '0'),
            PowDirection::Trailing => hash.chars().rev().take(n).all(|c| c == '0'),
        }
    }
}

impl FromStr for PowDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leading" => Ok(PowDirection::Leading),
            "trailing" => Ok(PowDirection::Trailing),
            other => Err(format!("unknown pow direction '{other}'")),
        }
    }
}

/// How many reward transactions a mining pass issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardPolicy {
    /// One reward per produced block, even when no entry in the pass verified.
    #[default]
    PerBlock,
    /// One reward per approved transaction, carried in the same block.
    PerTransaction,
}

impl FromStr for RewardPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_block" | "block" => Ok(RewardPolicy::PerBlock),
            "per_transaction" | "transaction" => Ok(RewardPolicy::PerTransaction),
            other => Err(format!("unknown reward policy '{other}'")),
        }
    }
}

/// Rules applied while sealing a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningPolicy {
    pub direction: PowDirection,
    pub capacity: usize,
    /// `None` searches until a nonce is found.
    pub max_attempts: Option<u64>,
}

impl Default for MiningPolicy {
    fn default() -> Self {
        Self {
            direction: PowDirection::Leading,
            capacity: DEFAULT_BLOCK_CAPACITY,
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub difficulty: u32,
    pub reward: i64,
    pub capacity: usize,
    pub direction: PowDirection,
    pub reward_policy: RewardPolicy,
    pub max_mining_attempts: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            reward: BASE_REWARD,
            capacity: DEFAULT_BLOCK_CAPACITY,
            direction: PowDirection::default(),
            reward_policy: RewardPolicy::default(),
            max_mining_attempts: None,
        }
    }
}

impl LedgerConfig {
    pub fn new(difficulty: u32, reward: i64) -> Self {
        Self {
            difficulty,
            reward,
            ..Self::default()
        }
    }

    /// Read `LEDGER_*` variables, falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            difficulty: reachable_difficulty(env_or("LEDGER_DIFFICULTY", defaults.difficulty)),
            reward: env_or("LEDGER_REWARD", defaults.reward),
            capacity: env_or("LEDGER_BLOCK_CAPACITY", defaults.capacity),
            direction: env_or("LEDGER_POW_DIRECTION", defaults.direction),
            reward_policy: env_or("LEDGER_REWARD_POLICY", defaults.reward_policy),
            max_mining_attempts: env::var("LEDGER_MAX_MINING_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    pub fn mining_policy(&self) -> MiningPolicy {
        MiningPolicy {
            direction: self.direction,
            capacity: self.capacity,
            max_attempts: self.max_mining_attempts,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Snapshot file loaded at startup and rewritten after mining.
    pub data_file: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 8080),
            data_file: env::var("LEDGER_DATA_FILE").ok().map(PathBuf::from),
        }
    }
}

// A run longer than the hash can never be mined.
fn reachable_difficulty(difficulty: u32) -> u32 {
    if difficulty > MAX_DIFFICULTY {
        warn!("LEDGER_DIFFICULTY={difficulty} can never be met, using {MAX_DIFFICULTY}");
        return MAX_DIFFICULTY;
    }
    difficulty
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("ignoring unparsable {key}={raw}");
            default
        }),
        Err(_) => default,
    }
}
