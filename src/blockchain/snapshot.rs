use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::Block;
use crate::config::PowDirection;
use crate::error::StorageError;

/// Everything needed to rebuild a ledger except the authority secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub chain: Vec<Block>,
    pub difficulty: u32,
    pub reward: i64,
    pub blocks_mined: u64,
    #[serde(default)]
    pub direction: PowDirection,
}

impl LedgerSnapshot {
    /// Write the snapshot as JSON, replacing `path` only once the write succeeded.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let tmp = path.with_extension("tmp");
        {
            let writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(writer, self)?;
        }
        fs::rename(&tmp, path)?;
        info!("Saved {} blocks to {}", self.chain.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Self = serde_json::from_reader(reader)?;
        info!("Loaded {} blocks from {}", snapshot.chain.len(), path.display());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::LedgerSnapshot;
    use crate::blockchain::Ledger;
    use crate::config::LedgerConfig;
    use crate::error::StorageError;
    use std::path::PathBuf;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pow_ledger_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn saved_chain_restores_balances() {
        let mut ledger = Ledger::new(LedgerConfig::new(1, 10)).unwrap();
        ledger.force_transaction("person1", 100).unwrap();
        ledger.handle_transactions("miner1").unwrap();

        let path = scratch_path("restore");
        ledger.snapshot().save(&path).unwrap();
        let snapshot = LedgerSnapshot::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let restored = Ledger::from_snapshot(snapshot, LedgerConfig::new(1, 10)).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.balance("person1"), 100);
        assert_eq!(restored.balance("miner1"), 10);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = LedgerSnapshot::load(&scratch_path("missing")).unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
