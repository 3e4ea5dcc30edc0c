//! Integration tests for batch grants.
//!
//! A tiny in-test host delivers the root's self-addressed step messages
//! back to it until the batch completes, recording every credit on the way.

use std::collections::HashMap;

use tip3_contracts::{BatchStep, CallContext, InitParams, RootContract, RootError};
use tip3_protocol::config::FUNDING_BALANCE_THRESHOLD;
use tip3_protocol::{
    Address, CodeBlob, GrantEntry, HolderIdentity, Instruction, OutboundMessage, PublicKey,
    TemplatePin, TokenMetadata,
};

const NOW: u64 = 1_700_000_000;
const RICH: u128 = FUNDING_BALANCE_THRESHOLD * 10;

fn root_address() -> Address {
    Address::new(0, [0x10; 32])
}

fn checker() -> Address {
    Address::new(0, [0x20; 32])
}

fn new_root(supply: u128) -> RootContract {
    let code = CodeBlob::new(b"tip3 wallet code v1".to_vec());
    let owner = PublicKey::from_bytes([0xAA; 32]);
    let params = InitParams {
        metadata: TokenMetadata::new("Token", "TOK", 9),
        root_pubkey: owner,
        root_owner: None,
        total_supply: supply,
        checker: checker(),
        receiver: Address::new(0, [0x30; 32]),
        eth_root: [0; 32],
        old_root: None,
        new_root: None,
        trusted: None,
        wallet_code: Some(code.clone()),
    };
    RootContract::initialize(
        root_address(),
        CodeBlob::new(b"root logic v1".to_vec()).hash(),
        TemplatePin::of(&code),
        params,
        &CallContext::external(owner, NOW, RICH),
    )
    .unwrap()
    .value
}

fn entry(b: u8, tokens: u128) -> GrantEntry {
    GrantEntry {
        pubkey: PublicKey::from_bytes([b; 32]),
        tokens,
    }
}

fn wallet_of(root: &RootContract, b: u8) -> Address {
    root.wallet_address_for(&HolderIdentity::from_pubkey(PublicKey::from_bytes([b; 32])))
        .unwrap()
}

fn owner_wallet(root: &RootContract) -> Address {
    root.wallet_address_for(&root.state().owner().as_holder())
        .unwrap()
}

/// What the host saw while driving a batch.
#[derive(Default)]
struct Delivered {
    credits: HashMap<Address, u128>,
    steps: Vec<BatchStep>,
}

/// Delivers self-addressed batch steps until none is left.
fn drive(root: &mut RootContract, mut outbox: Vec<OutboundMessage>) -> Delivered {
    let mut seen = Delivered::default();
    while !outbox.is_empty() {
        let msg = outbox.remove(0);
        if let Some(tokens) = msg.minted_tokens() {
            *seen.credits.entry(msg.dest).or_default() += tokens;
        }
        if let Some(Instruction::ProcessBatchStep { batch }) = msg.body {
            assert_eq!(msg.dest, root_address());
            let ctx = CallContext::internal(root_address(), NOW, RICH, 0);
            let receipt = root.process_batch_step(&ctx, batch).unwrap();
            seen.steps.push(receipt.value);
            outbox.extend(receipt.messages);
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Fee split
// ---------------------------------------------------------------------------

#[test]
fn batch_splits_each_entry_between_holder_and_owner() {
    let mut root = new_root(1_000);
    let ctx = CallContext::internal(checker(), NOW, RICH, 0);
    let started = root
        .start_batch(&ctx, vec![entry(1, 100), entry(2, 200)], 9_000, 5)
        .unwrap();

    let seen = drive(&mut root, started.messages);

    assert_eq!(seen.credits.get(&wallet_of(&root, 1)), Some(&5));
    assert_eq!(seen.credits.get(&wallet_of(&root, 2)), Some(&15));
    assert_eq!(seen.credits.get(&owner_wallet(&root)), Some(&(95 + 185)));
    assert_eq!(root.total_supply(), 1_300);
    assert_eq!(root.total_granted(), 300);

    assert_eq!(seen.steps.len(), 3);
    assert_eq!(
        seen.steps[0],
        BatchStep::Continued {
            cursor: 0,
            holder_share: 5,
            owner_share: 95
        }
    );
    assert_eq!(
        seen.steps[1],
        BatchStep::Continued {
            cursor: 1,
            holder_share: 15,
            owner_share: 185
        }
    );
    assert_eq!(
        seen.steps[2],
        BatchStep::Completed {
            batch_id: started.value
        }
    );
}

#[test]
fn degenerate_entries_go_entirely_to_the_owner() {
    let mut root = new_root(0);
    let ctx = CallContext::internal(checker(), NOW, RICH, 0);
    // adjusted = amount + 1 for every entry
    let started = root
        .start_batch(&ctx, vec![entry(1, 10), entry(2, 20)], 10_000, 1)
        .unwrap();

    let seen = drive(&mut root, started.messages);

    assert_eq!(seen.credits.get(&wallet_of(&root, 1)), None);
    assert_eq!(seen.credits.get(&wallet_of(&root, 2)), None);
    assert_eq!(seen.credits.get(&owner_wallet(&root)), Some(&30));
    assert_eq!(root.total_supply(), 30);
    assert_eq!(root.total_granted(), 30);
}

#[test]
fn empty_batch_completes_on_first_step() {
    let mut root = new_root(0);
    let ctx = CallContext::internal(checker(), NOW, RICH, 0);
    let started = root.start_batch(&ctx, Vec::new(), 0, 0).unwrap();

    let seen = drive(&mut root, started.messages);
    assert_eq!(
        seen.steps,
        vec![BatchStep::Completed {
            batch_id: started.value
        }]
    );
    assert!(seen.credits.is_empty());
}

#[test]
fn replayed_step_cannot_come_from_outside() {
    let mut root = new_root(0);
    let ctx = CallContext::internal(checker(), NOW, RICH, 0);
    let started = root.start_batch(&ctx, vec![entry(1, 10)], 0, 0).unwrap();
    let batch = match started.messages.last().and_then(|m| m.body.clone()) {
        Some(Instruction::ProcessBatchStep { batch }) => batch,
        other => panic!("expected a batch step, got {other:?}"),
    };

    let err = root.process_batch_step(&ctx, batch).unwrap_err();
    assert_eq!(err, RootError::Unauthorized);
    assert_eq!(root.total_supply(), 0);
}
