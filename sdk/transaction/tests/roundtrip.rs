use cinder_curve::CurveContext;
use cinder_privacy::{Commitment, Nullifier};
use cinder_signature::{Schnorr, SignatureScheme};
use cinder_transaction::{
    JoinSplitDescriptor, ShieldedTransaction, TxKind, UnsignedTransaction, WireError,
};
use rand::rngs::OsRng;

fn descriptor(tag: u8, reward: u64) -> JoinSplitDescriptor {
    JoinSplitDescriptor {
        anchors: [[tag; 32], [tag ^ 0xff; 32]],
        nullifiers: [Nullifier([tag; 32]), Nullifier([tag.wrapping_add(1); 32])],
        commitments: [Commitment([tag.wrapping_add(2); 32]), Commitment([3u8; 32])],
        proof: vec![tag; 32],
        ciphertexts: [vec![tag; 88], vec![tag.wrapping_add(9); 88]],
        ephemeral_pubkey: [4u8; 32],
        h_sig_seed: [tag; 32],
        reward,
        macs: [[5u8; 32], [6u8; 32]],
    }
}

fn signed(ctx: &CurveContext, kind: TxKind, descriptors: Vec<JoinSplitDescriptor>) -> ShieldedTransaction {
    let kp = Schnorr::new(ctx).keygen(&mut OsRng);
    UnsignedTransaction {
        version: 1,
        kind,
        lock_time: 42,
        fee: 10,
        descriptors,
        signing_pubkey: kp.public_key(),
        shard_selector: 7,
    }
    .sign(ctx, &kp, &mut OsRng)
    .unwrap()
}

#[test]
fn transaction_roundtrips_byte_exactly() {
    let ctx = CurveContext::new();
    let tx = signed(&ctx, TxKind::Normal, vec![descriptor(1, 0), descriptor(2, 0)]);

    let bytes = tx.to_bytes().unwrap();
    assert_eq!(bytes.len(), tx.estimated_size());

    let decoded = ShieldedTransaction::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, tx);
    assert_eq!(decoded.to_bytes().unwrap(), bytes);
    assert!(decoded.verify_signature(&ctx));
}

#[test]
fn salary_transaction_roundtrips() {
    let ctx = CurveContext::new();
    let tx = signed(&ctx, TxKind::Salary, vec![descriptor(3, 500)]);

    let decoded = ShieldedTransaction::from_bytes(&tx.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded.kind(), TxKind::Salary);
    assert_eq!(decoded.descriptors()[0].reward, 500);
}

#[test]
fn every_truncation_rejected() {
    let ctx = CurveContext::new();
    let bytes = signed(&ctx, TxKind::Normal, vec![descriptor(1, 0)]).to_bytes().unwrap();

    for len in 0..bytes.len() {
        assert!(
            ShieldedTransaction::from_bytes(&bytes[..len]).is_err(),
            "prefix of {len} bytes decoded"
        );
    }
}

#[test]
fn trailing_bytes_rejected() {
    let ctx = CurveContext::new();
    let mut bytes = signed(&ctx, TxKind::Normal, vec![descriptor(1, 0)]).to_bytes().unwrap();
    bytes.extend_from_slice(&[0u8; 3]);

    assert!(matches!(
        ShieldedTransaction::from_bytes(&bytes),
        Err(WireError::TrailingBytes(3))
    ));
}

#[test]
fn unknown_kind_rejected() {
    let ctx = CurveContext::new();
    let mut bytes = signed(&ctx, TxKind::Normal, vec![descriptor(1, 0)]).to_bytes().unwrap();
    bytes[4] = 0x7f;

    assert!(matches!(
        ShieldedTransaction::from_bytes(&bytes),
        Err(WireError::UnknownKind(0x7f))
    ));
}

#[test]
fn descriptor_count_bounded() {
    let ctx = CurveContext::new();
    let mut bytes = signed(&ctx, TxKind::Normal, vec![descriptor(1, 0)]).to_bytes().unwrap();
    // count sits after version, kind, lock_time, fee, shard, pubkey
    let offset = 4 + 1 + 8 + 8 + 1 + 32;
    bytes[offset..offset + 4].copy_from_slice(&u32::MAX.to_be_bytes());

    assert!(matches!(
        ShieldedTransaction::from_bytes(&bytes),
        Err(WireError::DescriptorCount(_))
    ));
}
