pub mod authority;
pub mod block;
pub mod model;
pub mod snapshot;

pub use authority::ChainAuthority;
pub use block::Block;
pub use model::{ChainState, Ledger, MiningReport, Recovery};
pub use snapshot::LedgerSnapshot;

/// Default Proof-of-Work difficulty (number of zero hex characters).
pub const DEFAULT_DIFFICULTY: u32 = 3;

/// Reward paid per issuance (dev value).
pub const BASE_REWARD: i64 = 50;

/// Maximum transactions a block may carry, rewards included.
pub const DEFAULT_BLOCK_CAPACITY: usize = 1000;

/// Smallest capacity that still leaves room for one entry plus its reward.
pub const MIN_BLOCK_CAPACITY: usize = 2;

/// Difficulty grows by one while `blocks_mined / difficulty / 10` reaches this.
pub const DIFFICULTY_RAMP_FACTOR: u64 = 10;

/// Hex SHA-256 digests are 64 characters; no nonce satisfies a longer run.
pub const MAX_DIFFICULTY: u32 = 64;
