//! Instance, reservation, and readiness types.
//!
//! Pure data and classification only. Every poll of the provider produces a
//! fresh `Vec<InstanceRef>` snapshot; nothing here is mutated in place.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one instance, as of the last poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Pending,
    Running,
    Terminated,
    Unknown,
}

impl InstanceState {
    /// Map a provider state name (`pending`, `running`, ...) onto the
    /// four states the provisioning loop distinguishes.
    #[must_use]
    pub fn from_provider(name: &str) -> Self {
        match name {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "shutting-down" | "terminated" | "stopping" | "stopped" => Self::Terminated,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Terminated => "terminated",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Snapshot of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRef {
    pub id: String,
    pub state: InstanceState,
    /// Only populated once the instance is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,
}

impl InstanceRef {
    /// The reachable address, if the instance is running and has one.
    #[must_use]
    pub fn ready_address(&self) -> Option<&str> {
        match self.state {
            InstanceState::Running => self.public_address.as_deref(),
            _ => None,
        }
    }
}

/// Instances created together by a single launch call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reservation {
    pub id: Option<String>,
    pub instances: Vec<InstanceRef>,
}

impl Reservation {
    /// IDs of the instances in this reservation, in launch order.
    pub fn instance_ids(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(|i| i.id.as_str())
    }
}

/// Union of every instance ID across `reservations`, first-seen order,
/// no duplicates.
#[must_use]
pub fn unique_instance_ids(reservations: &[Reservation]) -> Vec<String> {
    let mut seen = HashSet::new();
    reservations
        .iter()
        .flat_map(Reservation::instance_ids)
        .filter(|id| seen.insert(*id))
        .map(str::to_owned)
        .collect()
}

/// Result of evaluating one status poll against the launched IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Every launched instance is running; addresses in observed order.
    AllReady(Vec<String>),
    /// At least one instance is not ready yet.
    Waiting { ready: usize, requested: usize },
}

/// Classify one poll.
///
/// Only snapshots whose ID is in `expected` count, each ID at most once.
/// An expected ID missing from `observed` is not ready, and so is any
/// instance in a state other than running (including terminated ones,
/// which therefore keep the caller waiting).
#[must_use]
pub fn classify_poll(expected: &[String], observed: &[InstanceRef]) -> Readiness {
    let wanted: HashSet<&str> = expected.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut addresses = Vec::new();

    for instance in observed {
        let id = instance.id.as_str();
        if !wanted.contains(id) || !seen.insert(id) {
            continue;
        }
        if let Some(addr) = instance.ready_address() {
            addresses.push(addr.to_owned());
        }
    }

    if addresses.len() == wanted.len() {
        Readiness::AllReady(addresses)
    } else {
        Readiness::Waiting {
            ready: addresses.len(),
            requested: wanted.len(),
        }
    }
}
