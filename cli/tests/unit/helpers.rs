//! Shared test helpers: process output constructors and canned `aws` responses.

#![allow(dead_code)]

use std::process::{ExitStatus, Output};

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success, non-zero = failure).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
/// On Windows `ExitStatusExt::from_raw` takes the exit code directly.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Canned `aws ec2` responses ───────────────────────────────────────────────

/// `run-instances` output for a reservation of pending instances.
pub fn run_instances_json(reservation: &str, ids: &[&str]) -> Vec<u8> {
    let instances: Vec<_> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "InstanceId": id,
                "State": { "Code": 0, "Name": "pending" },
            })
        })
        .collect();
    serde_json::to_vec(&serde_json::json!({
        "ReservationId": reservation,
        "OwnerId": "123456789012",
        "Groups": [],
        "Instances": instances,
    }))
    .unwrap_or_default()
}

/// `describe-instances` output with one reservation per entry.
///
/// Each entry is `(id, state, public address)`.
pub fn describe_json(instances: &[(&str, &str, Option<&str>)]) -> Vec<u8> {
    let reservations: Vec<_> = instances
        .iter()
        .map(|(id, state, addr)| {
            let mut inst = serde_json::json!({
                "InstanceId": id,
                "State": { "Name": state },
            });
            if let Some(addr) = addr {
                inst["PublicIpAddress"] = serde_json::json!(addr);
            }
            serde_json::json!({ "Instances": [inst] })
        })
        .collect();
    serde_json::to_vec(&serde_json::json!({ "Reservations": reservations })).unwrap_or_default()
}
