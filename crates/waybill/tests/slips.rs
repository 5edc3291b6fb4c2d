//! End-to-end routing slip scenarios over the unified API.

use waybill::core::{CommentEntry, Entry as _, ErrorKind, Link, ED25519_ALGORITHM};
use waybill::store::LabelStoreExt;
use waybill::ManagerError;
use waybill_testkit::TestFixture;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn linear_chain_lifecycle() {
    init_tracing();
    let fixture = TestFixture::new(&["acme.org"]);

    let e1 = fixture.add_comment("acme.org", "start");
    assert_eq!(e1.parent, None);
    assert!(e1.signature.is_some());
    fixture.verify("acme.org");

    let e2 = fixture.add_comment("acme.org", "next");
    assert_eq!(e2.parent, Some(e1.digest));
    assert!(e2.signature.is_some());

    let slip = fixture.manager.slip(&fixture.version, "acme.org").unwrap();
    // The signature migrated to the new tip.
    assert!(slip.lookup(&e1.digest).unwrap().signature.is_none());
    assert_eq!(slip.leaves(), vec![e2.digest]);
    fixture.verify("acme.org");
}

#[test]
fn cross_slip_link_verifies_transitively() {
    init_tracing();
    let fixture = TestFixture::new(&["acme.org", "other.org"]);

    fixture.add_comment("acme.org", "start");
    let e2 = fixture.add_comment("acme.org", "next");

    let linked = fixture.add_comment_with(
        "other.org",
        "references acme",
        &[Link::new("acme.org", e2.digest)],
        None,
    );
    // Names differ, so the link is kept rather than elided.
    assert_eq!(linked.links, vec![Link::new("acme.org", e2.digest)]);

    // Verifying other.org walks through acme.org's chain.
    fixture.verify("other.org");

    // Breaking the linked chain breaks the linking slip's verification.
    let mut label = fixture.label();
    let mut entries = label.get("acme.org").unwrap().to_vec();
    entries.remove(0);
    label.set("acme.org", entries);
    fixture
        .manager
        .store()
        .set_routing_slips(&fixture.version, &label)
        .unwrap();

    let err = fixture
        .manager
        .verify(&fixture.version, "other.org", true)
        .unwrap_err();
    assert_eq!(err.slip_kind(), Some(ErrorKind::Structural));
}

#[test]
fn merge_preserves_diverged_branches() {
    let fixture = TestFixture::new(&["acme.org"]);
    let registry = fixture.manager.registry();

    let e1 = fixture.add_comment("acme.org", "start");
    let base = fixture.label();

    // Two copies of the label extended independently from E1.
    let mut copy_a = base.clone();
    let mut slip_a = copy_a.slip("acme.org").unwrap();
    let e2a = slip_a
        .add(
            registry,
            ED25519_ALGORITHM,
            &CommentEntry::new("branch a"),
            &[],
            None,
            &base,
        )
        .unwrap()
        .clone();
    copy_a.set_slip(&slip_a);

    let mut copy_b = base.clone();
    let mut slip_b = copy_b.slip("acme.org").unwrap();
    let e2b = slip_b
        .add(
            registry,
            ED25519_ALGORITHM,
            &CommentEntry::new("branch b"),
            &[],
            None,
            &base,
        )
        .unwrap()
        .clone();
    copy_b.set_slip(&slip_b);

    // Reconcile copy A into the store, then copy B.
    assert!(fixture.manager.reconcile(&fixture.version, &copy_a).unwrap());
    assert!(fixture.manager.reconcile(&fixture.version, &copy_b).unwrap());

    let merged = fixture.manager.slip(&fixture.version, "acme.org").unwrap();
    assert_eq!(merged.len(), 3);
    let leaves = merged.leaves();
    assert_eq!(leaves.len(), 2);
    assert!(leaves.contains(&e2a.digest));
    assert!(leaves.contains(&e2b.digest));
    assert!(!leaves.contains(&e1.digest));

    // Both branches stay independently verifiable.
    fixture.verify("acme.org");

    // Reconciling either copy again is a no-op.
    assert!(!fixture.manager.reconcile(&fixture.version, &copy_a).unwrap());
}

#[test]
fn verify_succeeds_after_every_add() {
    let fixture = TestFixture::new(&["acme.org"]);
    for i in 0..8 {
        fixture.add_comment("acme.org", &format!("entry {i}"));
        fixture.verify("acme.org");
    }
}

#[test]
fn tampered_signature_in_stored_label_detected() {
    let fixture = TestFixture::new(&["acme.org"]);
    fixture.add_comment("acme.org", "first entry");

    // Rotate one hex character of the persisted signature.
    let mut label = fixture.label();
    let mut entries = label.get("acme.org").unwrap().to_vec();
    let signature = entries[0].signature.as_mut().unwrap();
    let mut rotated = signature.value.split_off(1);
    rotated.push('0');
    signature.value = rotated;
    label.set("acme.org", entries);
    fixture
        .manager
        .store()
        .set_routing_slips(&fixture.version, &label)
        .unwrap();

    let err = fixture
        .manager
        .verify(&fixture.version, "acme.org", true)
        .unwrap_err();
    assert_eq!(err.slip_kind(), Some(ErrorKind::Trust));

    // Content-only verification still passes: the chain itself is intact.
    fixture
        .manager
        .verify(&fixture.version, "acme.org", false)
        .unwrap();
}

#[test]
fn tampered_payload_in_stored_label_detected() {
    let fixture = TestFixture::new(&["acme.org"]);
    fixture.add_comment("acme.org", "original");
    fixture.add_comment("acme.org", "tip");

    let mut label = fixture.label();
    let mut entries = label.get("acme.org").unwrap().to_vec();
    entries[0].payload = CommentEntry::new("rewritten").to_generic().unwrap();
    label.set("acme.org", entries);
    fixture
        .manager
        .store()
        .set_routing_slips(&fixture.version, &label)
        .unwrap();

    let err = fixture
        .manager
        .verify(&fixture.version, "acme.org", true)
        .unwrap_err();
    assert_eq!(err.slip_kind(), Some(ErrorKind::ContentTampered));
}

#[test]
fn fork_requires_disambiguation_only_when_latest_is_interior() {
    let fixture = TestFixture::new(&["acme.org"]);
    let root = fixture.add_comment("acme.org", "root");
    let (_, right) = fixture.fork("acme.org", &root.digest, "left", "right");

    // Latest appended entry is a leaf: implicit extension works and picks it.
    let next = fixture.add_comment("acme.org", "continues right");
    assert_eq!(next.parent, Some(right));
}

#[test]
fn add_entry_failure_leaves_store_untouched() {
    let fixture = TestFixture::new(&["acme.org"]);
    fixture.add_comment("acme.org", "start");
    let before = fixture.label();

    let err = fixture
        .manager
        .add_entry(
            &fixture.version,
            "acme.org",
            "rot13",
            &CommentEntry::new("never lands"),
            &[],
            None,
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::Slip(_)));
    assert_eq!(fixture.label(), before);
}
