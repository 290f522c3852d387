use actix_web::HttpResponse;
use log::error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::blockchain::{Block, ChainState, Ledger, MiningReport, Recovery};
use crate::config::{PowDirection, RewardPolicy};
use crate::error::{BlockError, LedgerError};
use crate::transaction::Transaction;

/// Shared application state: one ledger behind a mutex, plus where to persist it.
pub struct AppState {
    pub ledger: Mutex<Ledger>,
    pub data_file: Option<PathBuf>,
}

impl AppState {
    pub fn new(ledger: Ledger, data_file: Option<PathBuf>) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            data_file,
        }
    }

    /// Write the chain to the configured snapshot file, if any.
    /// Failures are logged; the in-memory ledger stays authoritative.
    pub fn persist(&self, ledger: &Ledger) {
        if let Some(path) = &self.data_file {
            if let Err(e) = ledger.snapshot().save(path) {
                error!("failed to save snapshot to {}: {e}", path.display());
            }
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a ledger error onto an HTTP response.
pub fn error_response(err: &LedgerError) -> HttpResponse {
    let body = ErrorResponse {
        error: err.to_string(),
    };
    match err {
        LedgerError::Admission(_)
        | LedgerError::Crypto(_)
        | LedgerError::Transaction(_)
        | LedgerError::Block(BlockError::CapacityExceeded { .. }) => {
            HttpResponse::BadRequest().json(body)
        }
        LedgerError::SequenceFault { .. } => HttpResponse::Conflict().json(body),
        LedgerError::Block(BlockError::MiningTimeout { .. }) => {
            HttpResponse::ServiceUnavailable().json(body)
        }
        LedgerError::TamperFault { .. }
        | LedgerError::Block(BlockError::UnreachableDifficulty { .. }) => {
            HttpResponse::InternalServerError().json(body)
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub difficulty: u32,
    pub chain: &'a [Block],
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
    pub status: ChainState,
}

#[derive(Serialize)]
pub struct RecoverResponse {
    pub recovery: Recovery,
    pub length: usize,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty: u32,
}

/* ---------- TX API Models ---------- */

/// Dev convenience: the server signs with the supplied key.
#[derive(Deserialize)]
pub struct SignTxRequest {
    pub source: String,
    pub destination: String,
    pub amount: i64,
    pub private_key: String,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub digest: String,
}

#[derive(Serialize)]
pub struct MempoolResponse {
    pub size: usize,
    pub transactions: Vec<String>, // list digests for brevity
}

/* ---------- Faucet API Models (dev) ---------- */

#[derive(Deserialize)]
pub struct FaucetRequest {
    pub address: String,
    pub amount: i64,
}

#[derive(Serialize)]
pub struct FaucetResponse {
    pub address: String,
    pub amount: i64,
    pub mempool_size: usize,
}

/* ---------- Mining API Models ---------- */

#[derive(Deserialize)]
pub struct MineRequest {
    pub miner_address: String,
}

#[derive(Serialize)]
pub struct MineResponse {
    #[serde(flatten)]
    pub report: MiningReport,
    pub height: usize,
    pub difficulty: u32,
}

/* ---------- Account API Models ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: i128,
}

#[derive(Serialize)]
pub struct HistoryResponse<'a> {
    pub address: String,
    pub transactions: Vec<&'a Transaction>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: u32,
    pub reward: i64,
    pub blocks_mined: u64,
    pub capacity: usize,
    pub direction: PowDirection,
    pub reward_policy: RewardPolicy,
    pub mempool_size: usize,
}
