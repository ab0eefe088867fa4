//! Client-side construction and signing of ledger transactions.
//!
//! Everything here is synchronous and performs no I/O, so a malformed key or
//! payload fails before the network is ever contacted.

use ledgerql_crypto::{
    ed25519_condition, signing_payload, transaction_id, verify_transaction, Ed25519Fulfillment,
    Keypair,
};
use ledgerql_types::{
    Fulfills, Input, Operation, Output, Transaction, DEFAULT_OUTPUT_AMOUNT, TRANSACTION_VERSION,
};
use serde_json::{json, Value};

use crate::error::ConstructionError;

/// Output index a transfer consumes. Only single-output transfers are built.
pub const TRANSFER_OUTPUT_INDEX: u32 = 0;

type Result<T> = std::result::Result<T, ConstructionError>;

fn check_payload(field: &'static str, value: &Value) -> Result<()> {
    if value.is_object() || value.is_null() {
        Ok(())
    } else {
        Err(ConstructionError::InvalidPayload { field })
    }
}

fn single_owner_output(public_key: &str, amount: String) -> Result<Output> {
    Ok(Output {
        condition: ed25519_condition(public_key)?,
        public_keys: vec![public_key.to_string()],
        amount,
    })
}

fn assign_id(mut tx: Transaction) -> Result<Transaction> {
    tx.id = transaction_id(&tx)?;
    Ok(tx)
}

/// Unsigned CREATE of `asset` owned by `issuer_public_key`.
pub fn build_create(issuer_public_key: &str, asset: Value, metadata: Value) -> Result<Transaction> {
    check_payload("asset", &asset)?;
    check_payload("metadata", &metadata)?;

    let output = single_owner_output(issuer_public_key, DEFAULT_OUTPUT_AMOUNT.to_string())?;
    assign_id(Transaction {
        id: String::new(),
        operation: Operation::Create,
        version: TRANSACTION_VERSION.to_string(),
        asset: json!({ "data": asset }),
        metadata,
        inputs: vec![Input {
            owners_before: vec![issuer_public_key.to_string()],
            fulfillment: None,
            fulfills: None,
        }],
        outputs: vec![output],
    })
}

/// Unsigned TRANSFER of output 0 of `source` to `recipient_public_key`.
///
/// The consumed amount is carried over unchanged; the network checks that it
/// balances.
pub fn build_transfer(
    source: &Transaction,
    recipient_public_key: &str,
    metadata: Value,
) -> Result<Transaction> {
    check_payload("metadata", &metadata)?;
    if source.id.is_empty() {
        return Err(ConstructionError::InvalidSource(
            "source transaction has no id".into(),
        ));
    }
    let consumed = source
        .outputs
        .get(TRANSFER_OUTPUT_INDEX as usize)
        .ok_or_else(|| {
            ConstructionError::InvalidSource(format!(
                "source transaction {} has no output {TRANSFER_OUTPUT_INDEX}",
                source.id
            ))
        })?;
    if consumed.public_keys.is_empty() {
        return Err(ConstructionError::InvalidSource(format!(
            "output {TRANSFER_OUTPUT_INDEX} of {} has no owners",
            source.id
        )));
    }
    let asset_id = source.asset_id().ok_or_else(|| {
        ConstructionError::InvalidSource(format!(
            "cannot determine the asset of transaction {}",
            source.id
        ))
    })?;

    let output = single_owner_output(recipient_public_key, consumed.amount.clone())?;
    assign_id(Transaction {
        id: String::new(),
        operation: Operation::Transfer,
        version: TRANSACTION_VERSION.to_string(),
        asset: json!({ "id": asset_id }),
        metadata,
        inputs: vec![Input {
            owners_before: consumed.public_keys.clone(),
            fulfillment: None,
            fulfills: Some(Fulfills {
                transaction_id: source.id.clone(),
                output_index: TRANSFER_OUTPUT_INDEX,
            }),
        }],
        outputs: vec![output],
    })
}

/// Fulfil every input of `tx` with `keypair`, then self-check the result.
pub fn sign(mut tx: Transaction, keypair: &Keypair) -> Result<Transaction> {
    let signer = keypair.public_key();
    if let Some(index) = tx
        .inputs
        .iter()
        .position(|input| !input.owners_before.contains(&signer))
    {
        return Err(ConstructionError::NotOwner { signer, index });
    }

    let payload = signing_payload(&tx)?;
    let fulfillment = Ed25519Fulfillment::sign(keypair, payload.as_bytes()).serialize_uri();
    for input in &mut tx.inputs {
        input.fulfillment = Some(fulfillment.clone());
    }
    verify_transaction(&tx)?;
    Ok(tx)
}

/// Build and sign a CREATE from base58 key material.
pub fn prepare_create(
    issuer_public_key: &str,
    issuer_private_key: &str,
    asset: Value,
    metadata: Value,
) -> Result<Transaction> {
    let keypair = Keypair::from_base58_pair(issuer_public_key, issuer_private_key)?;
    sign(build_create(&keypair.public_key(), asset, metadata)?, &keypair)
}

/// Build and sign a TRANSFER from base58 key material.
pub fn prepare_transfer(
    source: &Transaction,
    from_public_key: &str,
    from_private_key: &str,
    to_public_key: &str,
    metadata: Value,
) -> Result<Transaction> {
    let keypair = Keypair::from_base58_pair(from_public_key, from_private_key)?;
    sign(build_transfer(source, to_public_key, metadata)?, &keypair)
}
