use chrono::Utc;
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Instant;

use super::MAX_DIFFICULTY;
use crate::config::{MiningPolicy, PowDirection};
use crate::error::BlockError;
use crate::transaction::Transaction;
use crate::wallet::sha256;

/// Length of the random lowercase seed hashed into a genesis `previous_hash`.
const GENESIS_SEED_LEN: usize = 30;

/// A single block in the chain holding a batch of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub previous_hash: String,
    pub hash: String, // Cached hash of the block
    pub nonce: u64,   // Proof-of-Work nonce
    pub difficulty: u32,
    pub transactions: Vec<Transaction>,
    pub sealed_at: i64, // Unix millis (UTC)
}

impl Block {
    /// Create and mine the genesis block, linked to a random seed digest.
    pub fn genesis(difficulty: u32, policy: &MiningPolicy) -> Result<Self, BlockError> {
        let mut rng = rand::thread_rng();
        let seed: String = (0..GENESIS_SEED_LEN)
            .map(|_| rng.gen_range(b'a'..=b'z') as char)
            .collect();
        let previous_hash = hex::encode(sha256(seed.as_bytes()));
        Self::new(previous_hash, difficulty, Vec::new(), policy)
    }

    /// Create a block atop `previous_hash` and seal it with Proof-of-Work.
    /// Blocks the caller until a nonce is found or the attempt budget runs out.
    pub fn new(
        previous_hash: String,
        difficulty: u32,
        transactions: Vec<Transaction>,
        policy: &MiningPolicy,
    ) -> Result<Self, BlockError> {
        if transactions.len() > policy.capacity {
            return Err(BlockError::CapacityExceeded {
                len: transactions.len(),
                capacity: policy.capacity,
            });
        }
        if difficulty > MAX_DIFFICULTY {
            return Err(BlockError::UnreachableDifficulty {
                difficulty,
                max: MAX_DIFFICULTY,
            });
        }

        let mut block = Self {
            previous_hash,
            hash: String::new(),
            nonce: 0,
            difficulty,
            transactions,
            sealed_at: Utc::now().timestamp_millis(),
        };
        block.hash = block.compute_hash();
        block.mine(policy)?;
        Ok(block)
    }

    /// Compute the SHA-256 hash of this block from its previous hash,
    /// timestamp, transaction set and nonce (never the `hash` field itself).
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}:", self.previous_hash, self.sealed_at).as_bytes());
        for tx in &self.transactions {
            hasher.update(
                format!(
                    "{}:{}:{}:{}:{}:{}|",
                    tx.source, tx.destination, tx.amount, tx.created_at, tx.digest, tx.signature
                )
                .as_bytes(),
            );
        }
        hasher.update(self.nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Increment the nonce until the hash meets the difficulty predicate.
    fn mine(&mut self, policy: &MiningPolicy) -> Result<(), BlockError> {
        let started = Instant::now();
        let mut attempts: u64 = 0;

        while !policy.direction.is_satisfied(&self.hash, self.difficulty) {
            if policy.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(BlockError::MiningTimeout {
                    difficulty: self.difficulty,
                    attempts,
                });
            }
            self.nonce = self.nonce.wrapping_add(1);
            self.hash = self.compute_hash();
            attempts += 1;
        }

        info!(
            "Block hash = {} is mined in {:.3} seconds ({} attempts)",
            self.hash,
            started.elapsed().as_secs_f64(),
            attempts
        );
        Ok(())
    }

    /// The cached hash matches the content and meets this block's difficulty.
    /// (Does NOT validate chain linkage.)
    pub fn is_sealed(&self, direction: PowDirection) -> bool {
        self.hash == self.compute_hash() && direction.is_satisfied(&self.hash, self.difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::Block;
    use crate::config::{MiningPolicy, PowDirection};
    use crate::error::BlockError;
    use crate::transaction::Transaction;
    use crate::wallet::Wallet;

    fn sample_tx() -> Transaction {
        let w = Wallet::generate();
        let mut tx = Transaction::create(&w.address, "addr", 1, &w.secret_key).unwrap();
        tx.approve().unwrap();
        tx
    }

    #[test]
    fn genesis_is_sealed_and_empty() {
        let b = Block::genesis(1, &MiningPolicy::default()).unwrap();
        assert!(b.transactions.is_empty());
        assert_eq!(b.previous_hash.len(), 64);
        assert!(b.is_sealed(PowDirection::Leading));
    }

    #[test]
    fn mining_produces_leading_zeros() {
        let b = Block::new("prev".into(), 2, vec![sample_tx()], &MiningPolicy::default()).unwrap();
        assert!(b.hash.starts_with("00"));
        assert_eq!(b.hash, b.compute_hash());
        assert!(b.is_sealed(PowDirection::Leading));
    }

    #[test]
    fn mining_produces_trailing_zeros() {
        let policy = MiningPolicy {
            direction: PowDirection::Trailing,
            ..MiningPolicy::default()
        };
        let b = Block::new("prev".into(), 2, vec![sample_tx()], &policy).unwrap();
        assert!(b.hash.ends_with("00"));
        assert!(b.is_sealed(PowDirection::Trailing));
    }

    #[test]
    fn invalid_when_mutated() {
        let mut b = Block::new("prev".into(), 1, vec![sample_tx()], &MiningPolicy::default()).unwrap();
        let old_hash = b.hash.clone();

        b.transactions[0].amount = 1_000;

        assert_ne!(old_hash, b.compute_hash());
        assert!(!b.is_sealed(PowDirection::Leading));
    }

    #[test]
    fn rejects_more_transactions_than_capacity() {
        let policy = MiningPolicy {
            capacity: 1,
            ..MiningPolicy::default()
        };
        let err = Block::new("prev".into(), 0, vec![sample_tx(), sample_tx()], &policy).unwrap_err();
        assert_eq!(err, BlockError::CapacityExceeded { len: 2, capacity: 1 });
    }

    #[test]
    fn bounded_search_times_out() {
        let policy = MiningPolicy {
            max_attempts: Some(10),
            ..MiningPolicy::default()
        };
        let err = Block::new("prev".into(), 64, Vec::new(), &policy).unwrap_err();
        assert_eq!(
            err,
            BlockError::MiningTimeout {
                difficulty: 64,
                attempts: 10
            }
        );
    }

    #[test]
    fn difficulty_beyond_hash_length_is_refused() {
        let err = Block::new("prev".into(), 65, Vec::new(), &MiningPolicy::default()).unwrap_err();
        assert_eq!(
            err,
            BlockError::UnreachableDifficulty {
                difficulty: 65,
                max: 64
            }
        );
    }
}
