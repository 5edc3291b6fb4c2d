//! Proptest generators for slip names and entry payloads.

use proptest::prelude::*;
use serde_json::Value;

use waybill_core::{CommentEntry, Entry as _, GenericEntry};

/// Plain issuer names: lowercase DNS-ish labels.
pub fn arb_slip_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9]{0,8}(\\.[a-z]{2,4}){1,2}")
        .expect("valid name regex")
}

/// Non-empty comment text without exotic control characters.
pub fn arb_comment_text() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[ -~]{1,64}").expect("valid text regex")
}

/// Scalar JSON values allowed in canonical payloads (no floats).
pub fn arb_scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        arb_comment_text().prop_map(Value::String),
    ]
}

/// Generic payloads with a fixed vendor type and random scalar fields.
pub fn arb_generic_entry() -> impl Strategy<Value = GenericEntry> {
    proptest::collection::btree_map("[a-z]{1,8}", arb_scalar_value(), 0..5).prop_map(|fields| {
        GenericEntry::with_fields(
            "vendor.example/report",
            fields.into_iter().filter(|(k, _)| k != "type"),
        )
        .expect("generated payload must be valid")
    })
}

/// Comment payloads.
pub fn arb_comment_entry() -> impl Strategy<Value = GenericEntry> {
    arb_comment_text().prop_map(|text| {
        CommentEntry::new(text)
            .to_generic()
            .expect("comment payload must convert")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use waybill_core::{canonical_entry_bytes, HistoryEntry, Timestamp};

    proptest! {
        #[test]
        fn prop_generated_names_parse(name in arb_slip_name()) {
            let issuer = waybill_core::Issuer::parse(&name).unwrap();
            prop_assert_eq!(issuer.normalized(), name);
        }

        #[test]
        fn prop_entry_digest_roundtrips_serde(payload in arb_generic_entry()) {
            let entry = HistoryEntry::new(
                payload,
                Timestamp::from_unix(1_705_312_800),
                None,
                Vec::new(),
            ).unwrap();
            let json = serde_json::to_string(&entry).unwrap();
            let back: HistoryEntry = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back.calculate_digest().unwrap(), entry.digest);
        }

        #[test]
        fn prop_canonical_bytes_deterministic(payload in arb_generic_entry()) {
            let entry = HistoryEntry::new(
                payload,
                Timestamp::from_unix(1_705_312_800),
                None,
                Vec::new(),
            ).unwrap();
            prop_assert_eq!(
                canonical_entry_bytes(&entry).unwrap(),
                canonical_entry_bytes(&entry).unwrap()
            );
        }
    }
}
