//! Transaction fingerprints and fulfillment checks.

use ledgerql_types::{canonical_json, Transaction};
use serde_json::Value;
use sha3::{Digest, Sha3_256};

use crate::{CryptoError, Ed25519Fulfillment, Result};

/// JSON body of `tx` with every input fulfillment blanked out.
fn unsigned_body(tx: &Transaction) -> Result<Value> {
    let mut body = serde_json::to_value(tx)?;
    if let Some(inputs) = body.get_mut("inputs").and_then(Value::as_array_mut) {
        for input in inputs {
            if let Some(fields) = input.as_object_mut() {
                fields.insert("fulfillment".into(), Value::Null);
            }
        }
    }
    Ok(body)
}

/// Content fingerprint: hex SHA3-256 of the unsigned body without `id`.
pub fn transaction_id(tx: &Transaction) -> Result<String> {
    let mut body = unsigned_body(tx)?;
    if let Some(fields) = body.as_object_mut() {
        fields.remove("id");
    }
    let digest = Sha3_256::digest(canonical_json(&body).as_bytes());
    Ok(hex::encode(digest))
}

/// Message every input fulfillment signs: the unsigned body including `id`.
pub fn signing_payload(tx: &Transaction) -> Result<String> {
    Ok(canonical_json(&unsigned_body(tx)?))
}

/// Recompute the id and check every input's fulfillment.
///
/// Only the signature and the signer's membership in `owners_before` are
/// checked; whether the signer really owns the consumed output is the
/// network's call.
pub fn verify_transaction(tx: &Transaction) -> Result<()> {
    let expected = transaction_id(tx)?;
    if expected != tx.id {
        return Err(CryptoError::IdMismatch {
            expected,
            found: tx.id.clone(),
        });
    }

    let payload = signing_payload(tx)?;
    for (index, input) in tx.inputs.iter().enumerate() {
        let uri = input
            .fulfillment
            .as_deref()
            .ok_or(CryptoError::MissingFulfillment { index })?;
        let fulfillment = Ed25519Fulfillment::from_uri(uri)?;
        let signer = fulfillment.signer();
        if !input.owners_before.iter().any(|owner| owner == &signer) {
            return Err(CryptoError::UnauthorizedSigner { index, signer });
        }
        fulfillment.verify(payload.as_bytes())?;
    }
    Ok(())
}
