//! Integration tests for the protocol primitives.
//!
//! These exercise the path a node takes when it boots: fetch the wallet
//! code from storage, verify it against the pin, derive wallet addresses,
//! and persist outbound messages (batch steps included) across a restart.

use std::path::Path;
use std::time::Duration;

use tip3_protocol::storage::{Checkpoint, LedgerDb};
use tip3_protocol::{
    derive_wallet_address, Address, CodeBlob, DeliveryFailure, DerivationContext, FeeTransform,
    GrantBatch, GrantEntry, HolderIdentity, Instruction, MessageValue, OutboundMessage, PublicKey,
    TemplatePin, TemplateStore, TokenMetadata, VerifiedTemplate,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn wallet_code() -> CodeBlob {
    CodeBlob::new(b"tip3 wallet code v1".to_vec())
}

fn metadata() -> TokenMetadata {
    TokenMetadata::new("Wrapped Ether", "WETH", 18)
}

fn holder(b: u8) -> HolderIdentity {
    HolderIdentity::from_pubkey(PublicKey::from_bytes([b; 32]))
}

/// Reopens a database just dropped. sled releases its file lock from a
/// background thread, so the first attempts can still find it held.
fn reopen(path: &Path) -> LedgerDb {
    for _ in 0..50 {
        if let Ok(db) = LedgerDb::open(path) {
            return db;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    LedgerDb::open(path).unwrap()
}

fn derive(template: &VerifiedTemplate, holder: &HolderIdentity) -> Address {
    let metadata = metadata();
    let ctx = DerivationContext {
        template,
        metadata: &metadata,
        root_address: Address::new(0, [0x10; 32]),
        root_pubkey: PublicKey::from_bytes([0xAA; 32]),
    };
    derive_wallet_address(holder, &ctx).1
}

// ---------------------------------------------------------------------------
// Templates & derivation
// ---------------------------------------------------------------------------

#[test]
fn stored_template_derives_the_same_wallets() {
    let db = LedgerDb::open_temporary().unwrap();
    let pin = TemplatePin::new(db.put(&wallet_code()).unwrap());

    let from_store = db.fetch_verified(&pin).unwrap();
    let in_memory = VerifiedTemplate::verify(wallet_code(), &pin).unwrap();
    assert_eq!(derive(&from_store, &holder(1)), derive(&in_memory, &holder(1)));
}

#[test]
fn a_different_template_moves_every_wallet() {
    let a = wallet_code();
    let b = CodeBlob::new(b"tip3 wallet code v2".to_vec());
    let ta = VerifiedTemplate::verify(a.clone(), &TemplatePin::of(&a)).unwrap();
    let tb = VerifiedTemplate::verify(b.clone(), &TemplatePin::of(&b)).unwrap();
    for i in 1..=8u8 {
        assert_ne!(derive(&ta, &holder(i)), derive(&tb, &holder(i)));
    }
}

#[test]
fn unpinned_template_is_refused() {
    let pin = TemplatePin::of(&wallet_code());
    assert!(VerifiedTemplate::verify(CodeBlob::new(b"other".to_vec()), &pin).is_err());
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[test]
fn outbound_messages_survive_json() {
    let msg = OutboundMessage::call(
        Address::new(0, [1; 32]),
        MessageValue::AllRemaining,
        Instruction::AcceptMint {
            tokens: 10,
            answer_to: Address::new(-1, [2; 32]),
            funds: 3,
            notify: Some(b"hello".to_vec()),
        },
    );
    let json = serde_json::to_string(&msg).unwrap();
    let recovered: OutboundMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, msg);
}

#[test]
fn batch_checkpoint_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let root = Address::new(0, [0x10; 32]);
    let batch = GrantBatch::new(
        vec![
            GrantEntry {
                pubkey: PublicKey::from_bytes([1; 32]),
                tokens: 100,
            },
            GrantEntry {
                pubkey: PublicKey::from_bytes([2; 32]),
                tokens: 200,
            },
        ],
        FeeTransform::new(9_000, 5),
    );
    let step = |b: GrantBatch| {
        OutboundMessage::call(
            root,
            MessageValue::Fixed(1),
            Instruction::ProcessBatchStep { batch: b },
        )
    };

    {
        let db = LedgerDb::open(dir.path()).unwrap();
        let first = db.next_sequence().unwrap();
        let mut start = Checkpoint::default();
        start.enqueue(first, &step(batch.clone())).unwrap();
        db.commit_step(start).unwrap();

        // Step 0 processed: its message is replaced by step 1.
        let second = db.next_sequence().unwrap();
        let mut after = Checkpoint::done(first);
        after.set_record(b"state-after-0".to_vec());
        after.enqueue(second, &step(batch.advanced())).unwrap();
        db.commit_step(after).unwrap();
    }

    let db = reopen(dir.path());
    let pending: Vec<(u64, OutboundMessage)> = db.pending().unwrap();
    assert_eq!(pending.len(), 1);
    match &pending[0].1.body {
        Some(Instruction::ProcessBatchStep { batch: resumed }) => {
            assert_eq!(resumed.cursor, 1);
            assert_eq!(resumed.batch_id, batch.batch_id);
        }
        other => panic!("expected a batch step, got {other:?}"),
    }
    assert_eq!(db.get_state_record().unwrap(), Some(b"state-after-0".to_vec()));
}

#[test]
fn only_bounceable_calls_report_failures() {
    let init_holder = holder(1);
    let template = VerifiedTemplate::verify(wallet_code(), &TemplatePin::of(&wallet_code())).unwrap();
    let metadata = metadata();
    let ctx = DerivationContext {
        template: &template,
        metadata: &metadata,
        root_address: Address::new(0, [0x10; 32]),
        root_pubkey: PublicKey::ZERO,
    };
    let (init, _) = derive_wallet_address(&init_holder, &ctx);

    let deploy = OutboundMessage::deploy(init.clone(), MessageValue::Fixed(1));
    assert!(DeliveryFailure::of(&deploy).is_none());

    let credit = OutboundMessage::deploy_and_call(
        init,
        MessageValue::Fixed(1),
        Instruction::AcceptMint {
            tokens: 5,
            answer_to: Address::new(0, [0x10; 32]),
            funds: 0,
            notify: None,
        },
    );
    let report = DeliveryFailure::of(&credit).unwrap();
    assert_eq!(report.dest, credit.dest);
}
