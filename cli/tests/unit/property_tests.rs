//! Property-based tests for critical validation and classification logic.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use proptest::prelude::*;

use clusterboot_cli::domain::config::{
    VALID_CONFIG_KEYS, validate_config_key, validate_config_value,
};
use clusterboot_cli::domain::instance::{
    InstanceRef, InstanceState, Readiness, Reservation, classify_poll, unique_instance_ids,
};
use clusterboot_cli::domain::session::{generate_session_id, validate_session_id};
use clusterboot_cli::domain::transfer::UploadSlot;

fn state_strategy() -> impl Strategy<Value = InstanceState> {
    prop_oneof![
        Just(InstanceState::Pending),
        Just(InstanceState::Running),
        Just(InstanceState::Terminated),
        Just(InstanceState::Unknown),
    ]
}

// ============================================================================
// Session IDs
// ============================================================================

proptest! {
    /// Generated IDs always pass validation.
    #[test]
    fn prop_session_id_is_valid(_seed in 0u32..100) {
        let id = generate_session_id();
        prop_assert!(validate_session_id(&id).is_ok(), "invalid id: {}", id);
    }

    /// Arbitrary strings without the prefix are rejected.
    #[test]
    fn prop_foreign_session_ids_rejected(id in "[a-z0-9-]{0,30}") {
        if !id.starts_with("cluster-") {
            prop_assert!(validate_session_id(&id).is_err());
        }
    }
}

#[test]
fn test_session_id_uniqueness_batch() {
    let ids: std::collections::HashSet<_> = (0..100).map(|_| generate_session_id()).collect();
    assert_eq!(ids.len(), 100, "duplicate IDs generated");
}

// ============================================================================
// Config validation
// ============================================================================

proptest! {
    /// Keys outside the whitelist are rejected.
    #[test]
    fn prop_arbitrary_keys_rejected(key in "[a-z]{1,20}\\.[a-z_]{1,20}") {
        if !VALID_CONFIG_KEYS.contains(&key.as_str()) {
            prop_assert!(validate_config_key(&key).is_err(), "accepted invalid key: {key}");
        }
    }

    /// Any positive port is accepted; zero is not.
    #[test]
    fn prop_ports(port in 0u16..=u16::MAX) {
        let ok = validate_config_value("transfer.port", &port.to_string()).is_ok();
        prop_assert_eq!(ok, port > 0);
    }

    /// Endpoints must start with '/'.
    #[test]
    fn prop_endpoint_needs_leading_slash(path in "[a-z]{1,10}") {
        prop_assert!(validate_config_value("transfer.endpoint", &path).is_err());
        let with_slash = format!("/{path}");
        prop_assert!(validate_config_value("transfer.endpoint", &with_slash).is_ok());
    }
}

// ============================================================================
// Readiness classification
// ============================================================================

proptest! {
    /// Ready count never exceeds the requested count, and all-ready is
    /// reported exactly when every expected instance is running with an
    /// address.
    #[test]
    fn prop_classify_poll_bounds(
        observed in proptest::collection::vec((0usize..8, state_strategy(), any::<bool>()), 0..16),
        expected_len in 1usize..6,
    ) {
        let expected: Vec<String> = (0..expected_len).map(|i| format!("i-{i}")).collect();
        let observed: Vec<InstanceRef> = observed
            .into_iter()
            .map(|(n, state, has_addr)| InstanceRef {
                id: format!("i-{n}"),
                state,
                public_address: has_addr.then(|| format!("10.0.0.{n}")),
            })
            .collect();

        match classify_poll(&expected, &observed) {
            Readiness::AllReady(addrs) => prop_assert_eq!(addrs.len(), expected_len),
            Readiness::Waiting { ready, requested } => {
                prop_assert!(ready < requested);
                prop_assert_eq!(requested, expected_len);
            }
        }
    }

    /// The reaped ID list is the de-duplicated union in first-seen order.
    #[test]
    fn prop_unique_ids_is_dedup_union(
        groups in proptest::collection::vec(proptest::collection::vec(0u8..10, 0..5), 0..5),
    ) {
        let reservations: Vec<Reservation> = groups
            .iter()
            .map(|g| Reservation {
                id: None,
                instances: g
                    .iter()
                    .map(|n| InstanceRef {
                        id: format!("i-{n}"),
                        state: InstanceState::Unknown,
                        public_address: None,
                    })
                    .collect(),
            })
            .collect();

        let mut expected: Vec<String> = Vec::new();
        for n in groups.iter().flatten() {
            let id = format!("i-{n}");
            if !expected.contains(&id) {
                expected.push(id);
            }
        }
        prop_assert_eq!(unique_instance_ids(&reservations), expected);
    }

    /// Slot file names are the bare ordinal.
    #[test]
    fn prop_slot_file_name_is_ordinal(n in 0usize..100_000) {
        prop_assert_eq!(UploadSlot::new(n).file_name(), n.to_string());
    }
}
