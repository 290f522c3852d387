use log::{debug, error, info, warn};
use serde::Serialize;

use super::{
    Block, ChainAuthority, DIFFICULTY_RAMP_FACTOR, LedgerSnapshot, MAX_DIFFICULTY, MIN_BLOCK_CAPACITY,
};
use crate::config::{LedgerConfig, RewardPolicy};
use crate::error::{AdmissionError, LedgerError, Result};
use crate::transaction::Transaction;

/// Outcome of a full validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChainState {
    Consistent,
    TamperDetected { index: usize },
    SequenceBroken { index: usize },
}

/// What re-validation had to do to get the chain consistent again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Recovery {
    Intact,
    Truncated { dropped: usize },
    /// Every block was dropped and a fresh genesis took their place.
    GenesisRegenerated { dropped: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MiningReport {
    /// Hashes of the blocks sealed, in order.
    pub hashes: Vec<String>,
    pub approved: usize,
    pub rejected: usize,
    pub rewards: usize,
    /// Set when re-validation truncated the chain during the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Recovery>,
}

/// Single-authority Proof-of-Work ledger: chain, mempool and policy.
#[derive(Debug)]
pub struct Ledger {
    pub chain: Vec<Block>,
    difficulty: u32,
    reward: i64,
    mempool: Vec<Transaction>,
    authority: ChainAuthority,
    config: LedgerConfig,
    blocks_mined: u64,
}

impl Ledger {
    /// Initialize a ledger with a fresh authority and a mined genesis block.
    pub fn new(mut config: LedgerConfig) -> Result<Self> {
        if config.capacity < MIN_BLOCK_CAPACITY {
            warn!(
                "Block capacity {} is too small, using {}",
                config.capacity, MIN_BLOCK_CAPACITY
            );
            config.capacity = MIN_BLOCK_CAPACITY;
        }

        let genesis = Block::genesis(config.difficulty, &config.mining_policy())?;
        let ledger = Self {
            chain: vec![genesis],
            difficulty: config.difficulty,
            reward: config.reward,
            mempool: Vec::new(),
            authority: ChainAuthority::generate(),
            config,
            blocks_mined: 0,
        };

        info!("Ledger has been initialized...");
        info!(
            "Block hashing difficulty is {} ({:?}). Block reward is {} ({:?}).",
            ledger.difficulty, ledger.config.direction, ledger.reward, ledger.config.reward_policy
        );
        info!("Block transaction capacity is {}", ledger.config.capacity);
        Ok(ledger)
    }

    /// Rebuild a ledger from a saved chain. The chain must validate as-is;
    /// a new authority is generated since its secret is never persisted.
    pub fn from_snapshot(snapshot: LedgerSnapshot, mut config: LedgerConfig) -> Result<Self> {
        config.direction = snapshot.direction;
        config.capacity = config.capacity.max(MIN_BLOCK_CAPACITY);

        let ledger = Self {
            chain: snapshot.chain,
            difficulty: snapshot.difficulty,
            reward: snapshot.reward,
            mempool: Vec::new(),
            authority: ChainAuthority::generate(),
            config,
            blocks_mined: snapshot.blocks_mined,
        };
        ledger.validate_chain()?;

        info!(
            "Ledger restored with {} blocks at difficulty {}",
            ledger.len(),
            ledger.difficulty
        );
        Ok(ledger)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            chain: self.chain.clone(),
            difficulty: self.difficulty,
            reward: self.reward,
            blocks_mined: self.blocks_mined,
            direction: self.config.direction,
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Ledger should always have at least the genesis block")
    }

    /// Mine a block atop the tip, append it and re-validate the whole chain.
    pub fn append_block(&mut self, transactions: Vec<Transaction>) -> Result<Recovery> {
        self.seal(transactions)?;
        self.revalidate()
    }

    fn seal(&mut self, transactions: Vec<Transaction>) -> Result<&Block> {
        let block = Block::new(
            self.last_block().hash.clone(),
            self.difficulty,
            transactions,
            &self.config.mining_policy(),
        )?;

        self.chain.push(block);
        self.blocks_mined += 1;
        self.reevaluate_difficulty();
        Ok(self.last_block())
    }

    // Size-driven ramp: one step per hundred blocks per difficulty level.
    fn reevaluate_difficulty(&mut self) {
        if self.difficulty == 0 {
            return;
        }
        while self.difficulty < MAX_DIFFICULTY
            && self.blocks_mined / u64::from(self.difficulty) / DIFFICULTY_RAMP_FACTOR
                >= DIFFICULTY_RAMP_FACTOR
        {
            self.difficulty += 1;
            info!(
                "Difficulty raised to {} after {} mined blocks",
                self.difficulty, self.blocks_mined
            );
        }
    }

    fn revalidate(&mut self) -> Result<Recovery> {
        match self.validate_chain() {
            Ok(()) => Ok(Recovery::Intact),
            Err(LedgerError::SequenceFault { .. }) => self.recover(),
            Err(e) => Err(e),
        }
    }

    /// Check every block's hash against its contents and every adjacent link.
    /// Reports the first fault found; never modifies the chain.
    pub fn validate_chain(&self) -> Result<()> {
        if self.chain.is_empty() {
            warn!("SequenceFault: the chain has no genesis block");
            return Err(LedgerError::SequenceFault { index: 0 });
        }

        for (i, block) in self.chain.iter().enumerate() {
            if !block.is_sealed(self.config.direction) {
                error!(
                    "CRITICAL TamperFault: changed block properties found at index {i}! \
                     The block is corrupted, switch to a backup copy of the chain."
                );
                return Err(LedgerError::TamperFault { index: i });
            }

            if let Some(next) = self.chain.get(i + 1) {
                if block.hash != next.previous_hash {
                    warn!("SequenceFault: block {} does not link to block {}", i + 1, i);
                    return Err(LedgerError::SequenceFault { index: i + 1 });
                }
            }
        }

        debug!("Chain of {} blocks is consistent", self.chain.len());
        Ok(())
    }

    pub fn status(&self) -> ChainState {
        match self.validate_chain() {
            Err(LedgerError::TamperFault { index }) => ChainState::TamperDetected { index },
            Err(LedgerError::SequenceFault { index }) => ChainState::SequenceBroken { index },
            _ => ChainState::Consistent,
        }
    }

    /// Drop tip blocks until the chain links up again. Tampering is returned,
    /// not repaired. An exhausted chain is reset to a brand-new genesis.
    pub fn recover(&mut self) -> Result<Recovery> {
        match self.validate_chain() {
            Ok(()) => return Ok(Recovery::Intact),
            Err(LedgerError::SequenceFault { .. }) => {}
            Err(e) => return Err(e),
        }

        let mut dropped = 0;
        while self.chain.pop().is_some() {
            dropped += 1;
            if self.chain.is_empty() {
                break;
            }
            warn!(
                "SequenceFault: trying to recover the chain to the previous version. Last block index is {}",
                self.chain.len() - 1
            );
            match self.validate_chain() {
                Ok(()) => {
                    info!("Chain recovered after dropping {dropped} block(s)");
                    return Ok(Recovery::Truncated { dropped });
                }
                Err(LedgerError::SequenceFault { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        error!(
            "CRITICAL: there is no block left after dropping {dropped}! \
             Creating a new genesis block, all chain history is lost."
        );
        self.chain = vec![Block::genesis(self.difficulty, &self.config.mining_policy())?];
        Ok(Recovery::GenesisRegenerated { dropped })
    }

    /// Admit a signed transfer into the mempool.
    /// Signatures are checked later, when the entry is mined.
    pub fn add_transaction(&mut self, tx: Transaction) -> std::result::Result<(), AdmissionError> {
        if tx.amount <= 0 {
            warn!("Transaction amount can't be zero or a negative value! ({})", tx.amount);
            return Err(AdmissionError::NonPositiveAmount(tx.amount));
        }

        if tx.is_approved() {
            warn!("Transaction {} was already approved, only pending ones are admitted", tx.digest);
            return Err(AdmissionError::NotPending(tx.digest));
        }

        // TODO: subtract the source's pending mempool spends before comparing.
        let available = self.balance(&tx.source);
        if available < i128::from(tx.amount) {
            warn!(
                "Insufficient balance in the source! {} needs: {}",
                tx.source,
                i128::from(tx.amount) - available
            );
            return Err(AdmissionError::InsufficientBalance {
                address: tx.source,
                available,
                requested: tx.amount,
            });
        }

        info!("A new transaction has been added to the mempool: {}", tx.digest);
        self.mempool.push(tx);
        Ok(())
    }

    /// Queue an authority-signed transfer, skipping balance checks.
    /// For tests and administration only.
    pub fn force_transaction(&mut self, destination: &str, amount: i64) -> Result<()> {
        if amount <= 0 {
            warn!("Forced transaction amount can't be zero or a negative value! ({amount})");
            return Err(AdmissionError::NonPositiveAmount(amount).into());
        }
        let tx = self.authority.issue(destination, amount)?;
        self.mempool.push(tx);
        info!("A forced transaction is added to the mempool. Amount: {amount}");
        Ok(())
    }

    /// Mine the whole mempool, one block per pass, paying `reward_address`.
    ///
    /// Entries whose signature does not verify against their source are
    /// dropped. Rewards follow the configured [`RewardPolicy`]. When
    /// re-validation truncates the chain the sealed pass is lost with it; its
    /// entries go back to the mempool and are mined again atop the recovered tip.
    pub fn handle_transactions(&mut self, reward_address: &str) -> Result<MiningReport> {
        let mut report = MiningReport::default();

        while !self.mempool.is_empty() {
            let take = self.pass_size().min(self.mempool.len());
            let batch: Vec<Transaction> = self.mempool.drain(..take).collect();
            let untouched = batch.clone();

            let mut rejected = 0;
            let mut included = Vec::with_capacity(batch.len() + 1);
            for mut tx in batch {
                match tx.verify_signature() {
                    Ok(true) => {
                        if tx.approve().is_err() {
                            debug!("Dropping already approved transaction {}", tx.digest);
                            rejected += 1;
                            continue;
                        }
                        debug!("Transaction is validated! -> {}", tx.digest);
                        included.push(tx);
                    }
                    Ok(false) => {
                        debug!("Dropping unverifiable transaction {}", tx.digest);
                        rejected += 1;
                    }
                    Err(e) => {
                        debug!("Dropping transaction {}: {e}", tx.digest);
                        rejected += 1;
                    }
                }
            }

            let approved = included.len();
            let rewards = match self.config.reward_policy {
                RewardPolicy::PerBlock => 1,
                RewardPolicy::PerTransaction => approved,
            };
            for _ in 0..rewards {
                let mut reward = self.authority.issue(reward_address, self.reward)?;
                reward.approve()?;
                included.push(reward);
            }

            let sealed = self.seal(included).map(|block| block.hash.clone());
            let hash = match sealed {
                Ok(hash) => hash,
                Err(e) => {
                    // Nothing was appended; put the pass back for a later attempt.
                    self.requeue(untouched);
                    return Err(e);
                }
            };

            let recovery = self.revalidate()?;
            if recovery != Recovery::Intact {
                warn!(
                    "Block {hash} was dropped by chain recovery ({recovery:?}), re-queuing its {} entries",
                    untouched.len()
                );
                report.recovery = Some(recovery);
                self.requeue(untouched);
                continue;
            }

            report.approved += approved;
            report.rejected += rejected;
            report.rewards += rewards;
            report.hashes.push(hash);
        }

        if !report.hashes.is_empty() {
            info!(
                "Mined {} block(s): {} approved, {} rejected, {} reward(s) to {}",
                report.hashes.len(),
                report.approved,
                report.rejected,
                report.rewards,
                reward_address
            );
        }
        Ok(report)
    }

    // Put a drained pass back at the front of the mempool, in its original order.
    fn requeue(&mut self, pass: Vec<Transaction>) {
        let rest = std::mem::replace(&mut self.mempool, pass);
        self.mempool.extend(rest);
    }

    // Mempool entries per block, leaving room for the rewards that pass adds.
    fn pass_size(&self) -> usize {
        match self.config.reward_policy {
            RewardPolicy::PerBlock => self.config.capacity - 1,
            RewardPolicy::PerTransaction => self.config.capacity / 2,
        }
    }

    /// Credits minus debits for `address` over every transaction in the chain.
    pub fn balance(&self, address: &str) -> i128 {
        let mut balance: i128 = 0;
        for tx in self.chain.iter().flat_map(|b| &b.transactions) {
            if tx.destination == address {
                balance += i128::from(tx.amount);
            }
            if tx.source == address {
                balance -= i128::from(tx.amount);
            }
        }
        balance
    }

    /// Chain transactions sent or received by `address`, oldest first.
    pub fn history(&self, address: &str) -> Vec<&Transaction> {
        self.chain
            .iter()
            .flat_map(|b| &b.transactions)
            .filter(|tx| tx.involves(address))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn reward(&self) -> i64 {
        self.reward
    }

    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined
    }

    pub fn mempool(&self) -> &[Transaction] {
        &self.mempool
    }

    pub fn authority(&self) -> &ChainAuthority {
        &self.authority
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}
