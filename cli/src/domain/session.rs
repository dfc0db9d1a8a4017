//! Persisted cluster session record.
//!
//! A `clusterboot up` run records the reservations it created here so a
//! later `clusterboot down` can reap them. Pure types and validation only.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::instance::{InstanceRef, InstanceState, Reservation, unique_instance_ids};

const SESSION_ID_PREFIX: &str = "cluster-";

/// One launch call, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<String>,
    pub instance_ids: Vec<String>,
}

impl From<&Reservation> for ReservationRecord {
    fn from(r: &Reservation) -> Self {
        Self {
            reservation_id: r.id.clone(),
            instance_ids: r.instance_ids().map(str::to_owned).collect(),
        }
    }
}

impl From<&ReservationRecord> for Reservation {
    /// Rebuilt reservations carry IDs only; state is unknown until polled.
    fn from(r: &ReservationRecord) -> Self {
        Self {
            id: r.reservation_id.clone(),
            instances: r
                .instance_ids
                .iter()
                .map(|id| InstanceRef {
                    id: id.clone(),
                    state: InstanceState::Unknown,
                    public_address: None,
                })
                .collect(),
        }
    }
}

/// Session state persisted to `~/.clusterboot/session.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Session identifier (e.g. "cluster-0123456789abcdef").
    pub session_id: String,
    /// Region the instances were launched in.
    pub region: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reservations: Vec<ReservationRecord>,
}

impl SessionState {
    /// Start an empty session record for `region`.
    #[must_use]
    pub fn new(region: &str) -> Self {
        Self {
            session_id: generate_session_id(),
            region: region.to_string(),
            created_at: Utc::now(),
            reservations: Vec::new(),
        }
    }

    /// Append a reservation created in this session.
    pub fn record(&mut self, reservation: &Reservation) {
        self.reservations.push(ReservationRecord::from(reservation));
    }

    /// Reservations in launch order, rebuilt for the reaper.
    #[must_use]
    pub fn to_reservations(&self) -> Vec<Reservation> {
        self.reservations.iter().map(Reservation::from).collect()
    }

    /// Every recorded instance ID, de-duplicated.
    #[must_use]
    pub fn instance_ids(&self) -> Vec<String> {
        unique_instance_ids(&self.to_reservations())
    }
}

/// Validates session ID format: `cluster-` followed by 16 hex characters.
///
/// # Errors
///
/// Returns an error if the ID doesn't match the expected format.
pub fn validate_session_id(id: &str) -> Result<()> {
    let valid = id
        .strip_prefix(SESSION_ID_PREFIX)
        .is_some_and(|hex| hex.len() == 16 && hex.chars().all(|c| c.is_ascii_hexdigit()));
    anyhow::ensure!(valid, "invalid session ID: {id}");
    Ok(())
}

/// Generate a unique session identifier.
///
/// Entropy sources: nanosecond timestamp and two independent `RandomState` hashes.
#[must_use]
pub fn generate_session_id() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u128(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
    );
    hasher.write_u64(RandomState::new().build_hasher().finish());
    hasher.write_u64(RandomState::new().build_hasher().finish());
    format!("{SESSION_ID_PREFIX}{:016x}", hasher.finish())
}
