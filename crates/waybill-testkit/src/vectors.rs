//! Golden vectors for cross-implementation digest verification.
//!
//! Every implementation of the routing-slip format must produce identical
//! canonical bytes and digests for these entries. The expected values are
//! fixed independently of this codebase; a change in either is a breaking
//! change to the wire format.

use waybill_core::{
    CommentEntry, Entry as _, GenericEntry, HistoryEntry, Link, Timestamp,
};

/// A single golden vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    pub name: &'static str,
    pub description: &'static str,
    /// The entry, rebuilt through the public API.
    pub entry: HistoryEntry,
    /// Expected canonical bytes, as a string.
    pub canonical: String,
    /// Expected digest, algorithm-prefixed.
    pub digest: &'static str,
}

/// Expected digest of the root comment entry.
pub const ROOT_DIGEST: &str =
    "sha256:8dfd8784eabd750253ee198391ea85f82d6da3505eeea5a6fd0125cb8ebb54f4";

/// Expected digest of the chained comment entry.
pub const CHAINED_DIGEST: &str =
    "sha256:2b767090e3ea0629f8261d5cf8ec2ccf3c73400b19c45dea3cfe2978b5cc93de";

/// Expected digest of the cross-linked generic entry.
pub const LINKED_DIGEST: &str =
    "sha256:d5c8704341306bd465587aeadfb826690123dcb9d1b74cfe2f5afb51fe55e627";

/// Build all golden vectors.
pub fn golden_vectors() -> Vec<GoldenVector> {
    let ts = |s: &str| Timestamp::parse(s).expect("vector timestamp must parse");

    let root = HistoryEntry::new(
        CommentEntry::new("first entry")
            .to_generic()
            .expect("vector payload"),
        ts("2024-01-15T10:00:00Z"),
        None,
        Vec::new(),
    )
    .expect("vector entry");

    let chained = HistoryEntry::new(
        CommentEntry::new("next entry")
            .to_generic()
            .expect("vector payload"),
        ts("2024-01-15T10:00:05Z"),
        Some(root.digest),
        Vec::new(),
    )
    .expect("vector entry");

    let linked = HistoryEntry::new(
        GenericEntry::with_fields(
            "acme.org/test",
            [
                ("name".to_string(), "unit-tests".into()),
                ("status".to_string(), "passed".into()),
            ],
        )
        .expect("vector payload"),
        ts("2024-01-15T10:01:00Z"),
        None,
        vec![Link::new("acme.org", chained.digest)],
    )
    .expect("vector entry");

    vec![
        GoldenVector {
            name: "root_comment",
            description: "Minimal entry: comment payload, no parent, no links",
            canonical: concat!(
                r#"{"payload":{"comment":"first entry","type":"comment"},"#,
                r#""timestamp":"2024-01-15T10:00:00Z"}"#
            )
            .to_string(),
            digest: ROOT_DIGEST,
            entry: root,
        },
        GoldenVector {
            name: "chained_comment",
            description: "Entry extending the root through its parent digest",
            canonical: format!(
                r#"{{"parent":"{ROOT_DIGEST}","payload":{{"comment":"next entry","type":"comment"}},"timestamp":"2024-01-15T10:00:05Z"}}"#
            ),
            digest: CHAINED_DIGEST,
            entry: chained,
        },
        GoldenVector {
            name: "cross_linked_generic",
            description: "Generic typed payload with a cross-slip link",
            canonical: format!(
                r#"{{"links":[{{"digest":"{CHAINED_DIGEST}","name":"acme.org"}}],"payload":{{"name":"unit-tests","status":"passed","type":"acme.org/test"}},"timestamp":"2024-01-15T10:01:00Z"}}"#
            ),
            digest: LINKED_DIGEST,
            entry: linked,
        },
    ]
}
