use ledgerql_crypto::{
    signing_payload, transaction_id, verify_transaction, CryptoError, Ed25519Fulfillment, Keypair,
};
use ledgerql_types::Transaction;
use serde_json::json;

const DETERMINISTIC_SEED: [u8; 32] = [42u8; 32];

/// A TRANSFER committed on a live node.
fn ledger_transfer() -> Transaction {
    serde_json::from_value(json!({
        "inputs": [{
            "owners_before": ["FxEfUt9ArymGeCB99dZtfCUcsKwC29c8AHZ9EPnVWcyL"],
            "fulfills": {
                "transaction_id": "3b3fd7128580280052595b9bcda98895a851793cba77402ca4de0963be958c9e",
                "output_index": 0
            },
            "fulfillment": "pGSAIN4qAsNI5BTBBPG_-rku7U1_3LP3OQCOxJwYNVeYFDwXgUClHrUJn0R27q74iNfOu42TH8Dj1VJKiIlTv2fGdzwYKTpXt5J08dZa4_SI6yg1OajX3vVV3Dir1-qr_SGFwIwC"
        }],
        "outputs": [{
            "public_keys": ["FxEfUt9ArymGeCB99dZtfCUcsKwC29c8AHZ9EPnVWcyL"],
            "condition": {
                "details": {
                    "type": "ed25519-sha-256",
                    "public_key": "FxEfUt9ArymGeCB99dZtfCUcsKwC29c8AHZ9EPnVWcyL"
                },
                "uri": "ni:///sha-256;BX6oMTzQB_2xyFRExF1-w5ZwfuiWVzIfJAzVWyn7dCQ?fpt=ed25519-sha-256&cost=131072"
            },
            "amount": "1"
        }],
        "operation": "TRANSFER",
        "metadata": null,
        "asset": { "id": "3b3fd7128580280052595b9bcda98895a851793cba77402ca4de0963be958c9e" },
        "version": "1.0",
        "id": "b4b8bec52f56a327b6f2455d9dc6ee576a9ebe1eb7f564447c15dd5e2dd23b28"
    }))
    .expect("fixture transaction")
}

#[test]
fn ledger_transaction_id_is_reproduced() {
    let tx = ledger_transfer();
    assert_eq!(transaction_id(&tx).unwrap(), tx.id);
}

#[test]
fn ledger_fulfillment_verifies() {
    verify_transaction(&ledger_transfer()).expect("fixture must verify");
}

#[test]
fn tampered_metadata_changes_the_id() {
    let mut tx = ledger_transfer();
    tx.metadata = json!({ "mymetadata": "forged" });
    assert!(matches!(
        verify_transaction(&tx),
        Err(CryptoError::IdMismatch { .. })
    ));
}

#[test]
fn resigned_by_stranger_is_rejected() {
    let mut tx = ledger_transfer();
    let stranger = Keypair::from_seed(DETERMINISTIC_SEED);
    let payload = signing_payload(&tx).unwrap();
    tx.inputs[0].fulfillment =
        Some(Ed25519Fulfillment::sign(&stranger, payload.as_bytes()).serialize_uri());

    match verify_transaction(&tx) {
        Err(CryptoError::UnauthorizedSigner { index, signer }) => {
            assert_eq!(index, 0);
            assert_eq!(signer, stranger.public_key());
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn missing_fulfillment_is_reported() {
    let mut tx = ledger_transfer();
    tx.inputs[0].fulfillment = None;
    assert!(matches!(
        verify_transaction(&tx),
        Err(CryptoError::MissingFulfillment { index: 0 })
    ));
}

#[test]
fn fulfillments_do_not_affect_the_id() {
    let tx = ledger_transfer();
    let mut unsigned = tx.clone();
    unsigned.inputs[0].fulfillment = None;
    assert_eq!(transaction_id(&unsigned).unwrap(), tx.id);
    assert_eq!(signing_payload(&unsigned).unwrap(), signing_payload(&tx).unwrap());
}

#[test]
fn deterministic_keypair_generation_is_reproducible() {
    let first = Keypair::from_seed(DETERMINISTIC_SEED);
    let second = Keypair::from_seed(DETERMINISTIC_SEED);
    assert_eq!(first.public_key(), second.public_key());
    assert_eq!(first.sign(b"m"), second.sign(b"m"));
    assert_ne!(
        first.public_key(),
        Keypair::from_seed([7u8; 32]).public_key()
    );
}
