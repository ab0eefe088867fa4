//! ed25519-sha-256 crypto-conditions.
//!
//! Outputs are guarded by a condition derived from the owner's public key,
//! and inputs carry the matching fulfillment: the public key plus a signature,
//! DER-encoded and rendered as unpadded base64url.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::{
    decode_public_key, encode_key, verify_signature, CryptoError, Keypair, Result, KEY_BYTES,
    SIGNATURE_BYTES,
};

/// Condition type name as it appears in output details and URIs.
pub const ED25519_CONDITION_TYPE: &str = "ed25519-sha-256";

/// Fixed cost of an Ed25519 condition.
pub const ED25519_COST: u64 = 131_072;

const FINGERPRINT_PREFIX: [u8; 4] = [0x30, 0x22, 0x80, 0x20];
const FULFILLMENT_TAG: u8 = 0xa4;
const FULFILLMENT_BODY_LEN: u8 = 0x64;
const PUBLIC_KEY_TAG: [u8; 2] = [0x80, 0x20];
const SIGNATURE_TAG: [u8; 2] = [0x81, 0x40];
const FULFILLMENT_LEN: usize = 2 + 2 + KEY_BYTES + 2 + SIGNATURE_BYTES;

/// Condition URI for an Ed25519 public key.
pub fn ed25519_condition_uri(public_key: &[u8; KEY_BYTES]) -> String {
    let mut fingerprint = Vec::with_capacity(FINGERPRINT_PREFIX.len() + KEY_BYTES);
    fingerprint.extend_from_slice(&FINGERPRINT_PREFIX);
    fingerprint.extend_from_slice(public_key);
    let digest = Sha256::digest(&fingerprint);
    format!(
        "ni:///sha-256;{}?fpt={}&cost={}",
        URL_SAFE_NO_PAD.encode(digest),
        ED25519_CONDITION_TYPE,
        ED25519_COST
    )
}

/// Output condition document for a base58 public key.
pub fn ed25519_condition(public_key: &str) -> Result<Value> {
    let bytes = decode_public_key(public_key)?.to_bytes();
    Ok(json!({
        "details": {
            "type": ED25519_CONDITION_TYPE,
            "public_key": encode_key(&bytes),
        },
        "uri": ed25519_condition_uri(&bytes),
    }))
}

/// A public key together with its signature over a transaction payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519Fulfillment {
    pub public_key: [u8; KEY_BYTES],
    pub signature: [u8; SIGNATURE_BYTES],
}

impl Ed25519Fulfillment {
    /// Sign `message` with `keypair`.
    pub fn sign(keypair: &Keypair, message: &[u8]) -> Self {
        Self {
            public_key: keypair.public_key_bytes(),
            signature: keypair.sign(message),
        }
    }

    pub fn to_der(&self) -> Vec<u8> {
        let mut der = Vec::with_capacity(FULFILLMENT_LEN);
        der.push(FULFILLMENT_TAG);
        der.push(FULFILLMENT_BODY_LEN);
        der.extend_from_slice(&PUBLIC_KEY_TAG);
        der.extend_from_slice(&self.public_key);
        der.extend_from_slice(&SIGNATURE_TAG);
        der.extend_from_slice(&self.signature);
        der
    }

    /// Render as the string stored in an input's `fulfillment` field.
    pub fn serialize_uri(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_der())
    }

    /// Parse an input's `fulfillment` string.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let der = URL_SAFE_NO_PAD
            .decode(uri.trim())
            .map_err(|e| CryptoError::MalformedFulfillment(format!("invalid base64url: {e}")))?;
        if der.len() != FULFILLMENT_LEN {
            return Err(CryptoError::MalformedFulfillment(format!(
                "expected {FULFILLMENT_LEN} bytes, got {}",
                der.len()
            )));
        }
        if der[0] != FULFILLMENT_TAG || der[1] != FULFILLMENT_BODY_LEN {
            return Err(CryptoError::MalformedFulfillment(
                "not an ed25519-sha-256 fulfillment".into(),
            ));
        }
        let key_start = 4;
        let sig_tag = key_start + KEY_BYTES;
        if der[2..key_start] != PUBLIC_KEY_TAG || der[sig_tag..sig_tag + 2] != SIGNATURE_TAG {
            return Err(CryptoError::MalformedFulfillment(
                "unexpected field tags".into(),
            ));
        }

        let mut public_key = [0u8; KEY_BYTES];
        public_key.copy_from_slice(&der[key_start..sig_tag]);
        let mut signature = [0u8; SIGNATURE_BYTES];
        signature.copy_from_slice(&der[sig_tag + 2..]);
        Ok(Self {
            public_key,
            signature,
        })
    }

    /// Base58 form of the signer's key.
    pub fn signer(&self) -> String {
        encode_key(&self.public_key)
    }

    /// URI of the condition this fulfillment satisfies.
    pub fn condition_uri(&self) -> String {
        ed25519_condition_uri(&self.public_key)
    }

    pub fn verify(&self, message: &[u8]) -> Result<()> {
        verify_signature(&self.public_key, message, &self.signature)
    }
}
