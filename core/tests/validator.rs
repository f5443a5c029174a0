mod common;

use cinder_core::{
    BuildRequest, MemoryStore, MockProver, PaymentRequest, TxBuilder, TxValidator,
    ValidationError,
};
use cinder_curve::CurveContext;
use cinder_privacy::FullKey;
use cinder_signature::{Schnorr, SignatureScheme};
use cinder_transaction::{ShieldedTransaction, TxKind};
use common::{RejectingProver, Wallet};
use rand::rngs::OsRng;

fn signed_payment(fee: u64) -> ShieldedTransaction {
    let mut store = MemoryStore::new();
    let mut sender = Wallet::new();
    sender.fund(&mut store, 60);
    sender.fund(&mut store, 60);
    let recipient = FullKey::random(&mut OsRng);

    let request = BuildRequest::new(
        sender.key.spending_key.clone(),
        vec![PaymentRequest {
            amount: 100,
            address: recipient.address,
        }],
        sender.anchors(&store),
        sender.notes.clone(),
        fee,
    )
    .unwrap();
    TxBuilder::new(CurveContext::global(), &MockProver)
        .build(request, &store, &mut OsRng)
        .unwrap()
}

fn validator() -> TxValidator<'static> {
    static PROVER: MockProver = MockProver;
    TxValidator::new(CurveContext::global(), &PROVER)
}

#[test]
fn test_valid_transaction() {
    let tx = signed_payment(10);
    assert_eq!(tx.kind(), TxKind::Normal);
    assert_eq!(validator().check(&tx), Ok(()));
}

#[test]
fn test_survives_wire_roundtrip() {
    let tx = signed_payment(10);
    let decoded = ShieldedTransaction::from_bytes(&tx.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, tx);
    assert!(validator().validate(&decoded));
}

#[test]
fn test_flipped_fee_byte_breaks_signature() {
    let tx = signed_payment(10);
    let mut bytes = tx.to_bytes().unwrap();
    // version u32, kind u8, lock_time u64, then fee u64
    bytes[20] ^= 0x01;

    let tampered = ShieldedTransaction::from_bytes(&bytes).unwrap();
    assert_eq!(tampered.fee(), 11);
    assert_eq!(
        validator().check(&tampered),
        Err(ValidationError::SignatureInvalid)
    );
}

#[test]
fn test_flipped_signature_byte() {
    let tx = signed_payment(0);
    let mut bytes = tx.to_bytes().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;

    let tampered = ShieldedTransaction::from_bytes(&bytes).unwrap();
    assert!(!validator().validate(&tampered));
}

#[test]
fn test_resigned_body_fails_proof() {
    let ctx = CurveContext::global();
    let tx = signed_payment(10);

    // a thief lowers the fee and re-signs under their own key
    let thief = Schnorr::new(ctx).keygen(&mut OsRng);
    let mut body = tx.into_unsigned();
    body.fee = 0;
    body.signing_pubkey = thief.public_key();
    let forged = body.sign(ctx, &thief, &mut OsRng).unwrap();

    assert!(forged.verify_signature(ctx));
    assert_eq!(
        validator().check(&forged),
        Err(ValidationError::ProofRejected { index: 0 })
    );
}

#[test]
fn test_swapped_commitment_fails_proof() {
    let ctx = CurveContext::global();
    let tx = signed_payment(10);
    let kp = Schnorr::new(ctx).keygen(&mut OsRng);

    let mut body = tx.into_unsigned();
    body.descriptors[0].commitments.swap(0, 1);
    body.signing_pubkey = kp.public_key();
    let forged = body.sign(ctx, &kp, &mut OsRng).unwrap();

    assert!(!validator().validate(&forged));
}

#[test]
fn test_repeated_descriptor_is_a_duplicate_nullifier() {
    let ctx = CurveContext::global();
    let tx = signed_payment(10);
    let kp = Schnorr::new(ctx).keygen(&mut OsRng);

    let mut body = tx.into_unsigned();
    let nullifier = body.descriptors[0].nullifiers[0];
    body.descriptors.push(body.descriptors[0].clone());
    body.signing_pubkey = kp.public_key();
    let forged = body.sign(ctx, &kp, &mut OsRng).unwrap();

    assert_eq!(
        validator().check(&forged),
        Err(ValidationError::DuplicateNullifier { nullifier })
    );
}

#[test]
fn test_reward_outside_salary() {
    let ctx = CurveContext::global();
    let tx = signed_payment(10);
    let kp = Schnorr::new(ctx).keygen(&mut OsRng);

    let mut body = tx.into_unsigned();
    body.descriptors[0].reward = 1;
    body.signing_pubkey = kp.public_key();
    let forged = body.sign(ctx, &kp, &mut OsRng).unwrap();

    assert_eq!(
        validator().check(&forged),
        Err(ValidationError::UnexpectedReward { index: 0 })
    );
}

#[test]
fn test_verifier_rejection_is_reported_per_descriptor() {
    let tx = signed_payment(10);
    let rejecting = TxValidator::new(CurveContext::global(), &RejectingProver);
    assert_eq!(
        rejecting.check(&tx),
        Err(ValidationError::ProofRejected { index: 0 })
    );
}

#[test]
fn test_stopped_verifier_is_unavailable() {
    let tx = signed_payment(10);
    let service = cinder_core::ProverService::start(MockProver::new(), 1);
    let handle = service.handle();
    service.shutdown();

    let result = TxValidator::new(CurveContext::global(), &handle).check(&tx);
    assert!(matches!(result, Err(ValidationError::ProverUnavailable(_))));
}
