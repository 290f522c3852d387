use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// A spending identity. The address is the hex of the compressed public key,
/// so it doubles as the key that verifies the holder's signatures.
#[derive(Debug, Clone, Serialize)]
pub struct Wallet {
    pub secret_key: String,
    pub address: String,
}

impl Wallet {
    pub fn generate() -> Self {
        let (secret_key, address) = generate_keypair_hex();
        Self {
            secret_key,
            address,
        }
    }
}

/// Generate a new secp256k1 keypair and return (priv_hex, pub_hex_compressed).
/// The compressed public key hex is also the address.
pub fn generate_keypair_hex() -> (String, String) {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    (hex::encode(sk.secret_bytes()), hex::encode(pk.serialize()))
}

/// SHA-256 of `bytes`.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// Sign a 32-byte digest with a hex secret key; returns the hex DER signature.
pub fn sign_digest_hex(secret_hex: &str, msg32: [u8; 32]) -> Result<String, CryptoError> {
    let secp = Secp256k1::signing_only();

    let sk_bytes = hex::decode(secret_hex).map_err(|_| CryptoError::InvalidHex("secret key"))?;
    let sk = SecretKey::from_slice(&sk_bytes).map_err(|_| CryptoError::InvalidSecretKey)?;

    let msg = Message::from_slice(&msg32).map_err(|_| CryptoError::InvalidDigest)?;
    let sig = secp.sign_ecdsa(&msg, &sk);
    Ok(hex::encode(&sig.serialize_der()[..]))
}

/// Verify a signature (hex DER) against the given pubkey (hex, compressed) and message hash.
///
/// `Ok(false)` means the material is well formed but the signature does not
/// match; `Err` is reserved for encodings that cannot be decoded at all.
pub fn verify_signature_hex(
    pubkey_hex: &str,
    sig_hex: &str,
    msg32: [u8; 32],
) -> Result<bool, CryptoError> {
    let secp = Secp256k1::verification_only();

    let sig_bytes = hex::decode(sig_hex).map_err(|_| CryptoError::InvalidHex("signature"))?;
    let sig = Signature::from_der(&sig_bytes).map_err(|_| CryptoError::InvalidSignature)?;

    let pk = parse_public_key(pubkey_hex)?;

    let msg = Message::from_slice(&msg32).map_err(|_| CryptoError::InvalidDigest)?;
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}

fn parse_public_key(pubkey_hex: &str) -> Result<PublicKey, CryptoError> {
    let bytes = hex::decode(pubkey_hex).map_err(|_| CryptoError::InvalidHex("public key"))?;
    PublicKey::from_slice(&bytes).map_err(|_| CryptoError::InvalidPublicKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_a_compressed_pubkey() {
        let wallet = Wallet::generate();
        assert_eq!(wallet.address.len(), 66);
        assert!(parse_public_key(&wallet.address).is_ok());
        assert_eq!(wallet.secret_key.len(), 64);
    }

    #[test]
    fn signature_verifies_only_for_signer() {
        let alice = Wallet::generate();
        let bob = Wallet::generate();
        let digest = sha256(b"payload");

        let sig = sign_digest_hex(&alice.secret_key, digest).unwrap();
        assert!(verify_signature_hex(&alice.address, &sig, digest).unwrap());
        assert!(!verify_signature_hex(&bob.address, &sig, digest).unwrap());
        assert!(!verify_signature_hex(&alice.address, &sig, sha256(b"other")).unwrap());
    }

    #[test]
    fn malformed_material_is_a_decoding_error() {
        let alice = Wallet::generate();
        let digest = sha256(b"payload");
        let sig = sign_digest_hex(&alice.secret_key, digest).unwrap();

        assert_eq!(
            verify_signature_hex("person1", &sig, digest),
            Err(CryptoError::InvalidHex("public key"))
        );
        assert_eq!(
            verify_signature_hex(&alice.address, "abcd", digest),
            Err(CryptoError::InvalidSignature)
        );
        assert_eq!(
            sign_digest_hex("00", digest),
            Err(CryptoError::InvalidSecretKey)
        );
    }
}
