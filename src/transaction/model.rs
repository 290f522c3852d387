use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, TransactionError};
use crate::wallet::{sha256, sign_digest_hex, verify_signature_hex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Signed, waiting in the mempool.
    Pending,
    /// Included in a mined block; frozen from here on.
    Approved,
}

/// A signed value transfer between two addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub source: String,
    pub destination: String,
    pub amount: i64,
    pub created_at: i64, // Unix millis (UTC)
    /// Hex SHA-256 over source, destination, amount and `created_at`.
    pub digest: String,
    /// Hex DER ECDSA signature over `digest` by the source's key.
    pub signature: String,
    pub status: TxStatus,
}

impl Transaction {
    /// Build and sign a transfer stamped with the current instant.
    ///
    /// The amount is not checked here; the ledger does that at admission.
    pub fn create(
        source: impl Into<String>,
        destination: impl Into<String>,
        amount: i64,
        signer_secret_key: &str,
    ) -> Result<Self, CryptoError> {
        Self::create_at(
            source,
            destination,
            amount,
            signer_secret_key,
            Utc::now().timestamp_millis(),
        )
    }

    pub fn create_at(
        source: impl Into<String>,
        destination: impl Into<String>,
        amount: i64,
        signer_secret_key: &str,
        created_at: i64,
    ) -> Result<Self, CryptoError> {
        let source = source.into();
        let destination = destination.into();
        let digest = Self::digest_bytes(&source, &destination, amount, created_at);
        let signature = sign_digest_hex(signer_secret_key, digest)?;

        Ok(Self {
            source,
            destination,
            amount,
            created_at,
            digest: hex::encode(digest),
            signature,
            status: TxStatus::Pending,
        })
    }

    fn digest_bytes(source: &str, destination: &str, amount: i64, created_at: i64) -> [u8; 32] {
        let preimage = format!("{}:{}:{}:{}", source, destination, amount, created_at);
        sha256(preimage.as_bytes())
    }

    /// Digest recomputed from the four logical fields.
    pub fn recompute_digest(&self) -> String {
        hex::encode(Self::digest_bytes(
            &self.source,
            &self.destination,
            self.amount,
            self.created_at,
        ))
    }

    pub fn has_valid_digest(&self) -> bool {
        self.digest == self.recompute_digest()
    }

    /// Check `signature` over `digest` against `public_key`.
    pub fn verify(digest: &str, signature: &str, public_key: &str) -> Result<bool, CryptoError> {
        let bytes = hex::decode(digest).map_err(|_| CryptoError::InvalidHex("digest"))?;
        let msg32: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidDigest)?;
        verify_signature_hex(public_key, signature, msg32)
    }

    /// Verify this transfer against its claimed source.
    /// A digest that no longer matches the fields never verifies.
    pub fn verify_signature(&self) -> Result<bool, CryptoError> {
        if !self.has_valid_digest() {
            return Ok(false);
        }
        Self::verify(&self.digest, &self.signature, &self.source)
    }

    /// One-way Pending -> Approved transition.
    pub fn approve(&mut self) -> Result<(), TransactionError> {
        if self.status == TxStatus::Approved {
            return Err(TransactionError::AlreadyApproved(self.digest.clone()));
        }
        self.status = TxStatus::Approved;
        Ok(())
    }

    pub fn is_approved(&self) -> bool {
        self.status == TxStatus::Approved
    }

    pub fn involves(&self, address: &str) -> bool {
        self.source == address || self.destination == address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    #[test]
    fn digest_round_trips() {
        let alice = Wallet::generate();
        let tx = Transaction::create(&alice.address, "bob", 5, &alice.secret_key).unwrap();
        assert!(tx.has_valid_digest());
        assert_eq!(tx.status, TxStatus::Pending);
        assert!(tx.verify_signature().unwrap());
    }

    #[test]
    fn creation_instant_is_part_of_the_digest() {
        let alice = Wallet::generate();
        let a = Transaction::create_at(&alice.address, "bob", 5, &alice.secret_key, 1_000).unwrap();
        let b = Transaction::create_at(&alice.address, "bob", 5, &alice.secret_key, 1_001).unwrap();
        assert_ne!(a.digest, b.digest);
    }

    #[test]
    fn altered_amount_fails_verification() {
        let alice = Wallet::generate();
        let mut tx = Transaction::create(&alice.address, "bob", 5, &alice.secret_key).unwrap();
        tx.amount = 500;
        assert!(!tx.has_valid_digest());
        assert!(!tx.verify_signature().unwrap());
    }

    #[test]
    fn signature_by_someone_else_is_rejected() {
        let alice = Wallet::generate();
        let mallory = Wallet::generate();
        let tx = Transaction::create(&alice.address, "bob", 5, &mallory.secret_key).unwrap();
        assert!(!tx.verify_signature().unwrap());
    }

    #[test]
    fn non_key_source_is_a_decoding_error() {
        let alice = Wallet::generate();
        let tx = Transaction::create("person1", "bob", 5, &alice.secret_key).unwrap();
        assert!(tx.verify_signature().is_err());
    }

    #[test]
    fn approve_is_one_way() {
        let alice = Wallet::generate();
        let mut tx = Transaction::create(&alice.address, "bob", 5, &alice.secret_key).unwrap();
        tx.approve().unwrap();
        assert!(tx.is_approved());
        assert!(matches!(
            tx.approve(),
            Err(TransactionError::AlreadyApproved(_))
        ));
        assert!(tx.is_approved());
    }

    #[test]
    fn construction_does_not_police_amount() {
        let alice = Wallet::generate();
        let tx = Transaction::create(&alice.address, "bob", -3, &alice.secret_key).unwrap();
        assert_eq!(tx.amount, -3);
    }
}
