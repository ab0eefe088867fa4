use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::{OsRng, RngCore};

pub mod conditions;
pub mod transaction;

pub use conditions::{ed25519_condition, ed25519_condition_uri, Ed25519Fulfillment};
pub use transaction::{signing_payload, transaction_id, verify_transaction};

/// Raw length of an Ed25519 seed or verifying key.
pub const KEY_BYTES: usize = 32;
/// Raw length of an Ed25519 signature.
pub const SIGNATURE_BYTES: usize = 64;

/// Errors raised while handling keys, conditions or transaction proofs.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key is not valid base58: {0}")]
    InvalidBase58(#[from] bs58::decode::Error),
    #[error("key must be {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
    #[error("public key is not a valid Ed25519 point")]
    InvalidPublicKey,
    #[error("private key does not belong to public key {public_key}")]
    KeyMismatch { public_key: String },
    #[error("malformed fulfillment: {0}")]
    MalformedFulfillment(String),
    #[error("signature verification failed")]
    BadSignature,
    #[error("transaction id mismatch: expected {expected}, found {found}")]
    IdMismatch { expected: String, found: String },
    #[error("input {index} has no fulfillment")]
    MissingFulfillment { index: usize },
    #[error("input {index} is signed by {signer}, which is not among its owners")]
    UnauthorizedSigner { index: usize, signer: String },
    #[error("transaction serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

/// Encode raw key bytes in the ledger's base58 form.
pub fn encode_key(bytes: &[u8; KEY_BYTES]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a base58 key into its 32 raw bytes.
pub fn decode_key(encoded: &str) -> Result<[u8; KEY_BYTES]> {
    let raw = bs58::decode(encoded.trim()).into_vec()?;
    let actual = raw.len();
    raw.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        expected: KEY_BYTES,
        actual,
    })
}

/// Check that `encoded` is a well-formed Ed25519 public key.
pub fn decode_public_key(encoded: &str) -> Result<VerifyingKey> {
    let bytes = decode_key(encoded)?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)
}

/// Ed25519 key pair whose halves travel as base58 strings.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generate a new key pair
    pub fn generate() -> Self {
        let mut seed = [0u8; KEY_BYTES];
        OsRng.fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// Build a key pair from a raw 32-byte seed.
    pub fn from_seed(seed: [u8; KEY_BYTES]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Restore a key pair from a base58 private key.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        Ok(Self::from_seed(decode_key(private_key)?))
    }

    /// Restore a key pair and check it against the public key the caller claims.
    pub fn from_base58_pair(public_key: &str, private_key: &str) -> Result<Self> {
        let keypair = Self::from_private_key(private_key)?;
        let claimed = decode_key(public_key)?;
        if claimed != keypair.public_key_bytes() {
            return Err(CryptoError::KeyMismatch {
                public_key: public_key.to_string(),
            });
        }
        Ok(keypair)
    }

    /// Base58 public key.
    pub fn public_key(&self) -> String {
        encode_key(&self.public_key_bytes())
    }

    /// Base58 private key (the 32-byte seed).
    pub fn private_key(&self) -> String {
        encode_key(&self.signing_key.to_bytes())
    }

    pub fn public_key_bytes(&self) -> [u8; KEY_BYTES] {
        self.verifying_key.to_bytes()
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_BYTES] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Verify an Ed25519 signature over `message`.
pub fn verify_signature(
    public_key: &[u8; KEY_BYTES],
    message: &[u8],
    signature: &[u8; SIGNATURE_BYTES],
) -> Result<()> {
    let verifying_key =
        VerifyingKey::from_bytes(public_key).map_err(|_| CryptoError::InvalidPublicKey)?;
    let signature = Signature::from_bytes(signature);
    verifying_key
        .verify(message, &signature)
        .map_err(|_| CryptoError::BadSignature)
}
