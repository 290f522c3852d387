//! Single-authority Proof-of-Work ledger.
//!
//! Blocks of signed transfers are sealed by a nonce search, linked by hash,
//! and re-validated after every append. Balances are derived from the chain.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod transaction;
pub mod wallet;

pub use blockchain::{Block, ChainAuthority, ChainState, Ledger, MiningReport, Recovery};
pub use config::{LedgerConfig, PowDirection, RewardPolicy};
pub use error::{AdmissionError, BlockError, LedgerError};
pub use transaction::Transaction;
