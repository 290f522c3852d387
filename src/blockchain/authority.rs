use crate::error::CryptoError;
use crate::transaction::Transaction;
use crate::wallet::generate_keypair_hex;

/// The single keypair allowed to mint value on a ledger: block rewards and
/// forced (administrative) transfers are signed with it.
#[derive(Clone)]
pub struct ChainAuthority {
    secret_key: String,
    public_key: String,
}

impl ChainAuthority {
    pub fn generate() -> Self {
        let (secret_key, public_key) = generate_keypair_hex();
        Self {
            secret_key,
            public_key,
        }
    }

    /// Hex compressed public key; also the authority's address.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Sign a transfer from the authority to `destination`.
    pub fn issue(&self, destination: &str, amount: i64) -> Result<Transaction, CryptoError> {
        Transaction::create(&self.public_key, destination, amount, &self.secret_key)
    }
}

// Keep the secret out of logs and panics.
impl std::fmt::Debug for ChainAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainAuthority")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}
