//! Shared test helpers for cluster service tests.
//!
//! `ScriptedProvider` replays a fixed sequence of describe responses and
//! records every call it receives.

#![allow(clippy::expect_used)]

use std::sync::Mutex;

use anyhow::Result;

use crate::application::ports::{ComputeProvider, LaunchSpec};
use crate::domain::error::ClusterError;
use crate::domain::instance::{InstanceRef, InstanceState, Reservation};

pub fn running(id: &str, addr: &str) -> InstanceRef {
    InstanceRef {
        id: id.into(),
        state: InstanceState::Running,
        public_address: Some(addr.into()),
    }
}

pub fn pending(id: &str) -> InstanceRef {
    InstanceRef {
        id: id.into(),
        state: InstanceState::Pending,
        public_address: None,
    }
}

pub fn terminated(id: &str) -> InstanceRef {
    InstanceRef {
        id: id.into(),
        state: InstanceState::Terminated,
        public_address: None,
    }
}

pub const SPEC: LaunchSpec<'static> = LaunchSpec {
    image_id: "ami-130bdd69",
    instance_type: "t2.micro",
    key_name: "autodeploy-keypair",
    subnet_id: "subnet-c8221ac4",
};

/// Provider stub. Launches number instances `i-1`, `i-2`, ... across calls;
/// describe call `k` answers with `polls[k]` (the last entry repeats).
#[derive(Default)]
pub struct ScriptedProvider {
    polls: Vec<Vec<InstanceRef>>,
    fail_describe_at: Option<usize>,
    fail_terminate: Option<&'static str>,
    launched: Mutex<Vec<usize>>,
    described: Mutex<Vec<Vec<String>>>,
    terminated: Mutex<Vec<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(polls: Vec<Vec<InstanceRef>>) -> Self {
        Self {
            polls,
            ..Self::default()
        }
    }

    /// Make describe call number `call` (0-based) fail.
    pub fn failing_describe_at(mut self, call: usize) -> Self {
        self.fail_describe_at = Some(call);
        self
    }

    /// Make every terminate call fail with `message`.
    pub fn failing_terminate(mut self, message: &'static str) -> Self {
        self.fail_terminate = Some(message);
        self
    }

    pub fn reservation(id: &str, ids: &[&str]) -> Reservation {
        Reservation {
            id: Some(id.into()),
            instances: ids.iter().map(|i| pending(i)).collect(),
        }
    }

    pub fn launch_counts(&self) -> Vec<usize> {
        self.launched.lock().expect("mutex poisoned").clone()
    }

    pub fn describe_calls(&self) -> usize {
        self.described.lock().expect("mutex poisoned").len()
    }

    pub fn described_ids(&self) -> Vec<Vec<String>> {
        self.described.lock().expect("mutex poisoned").clone()
    }

    pub fn terminate_calls(&self) -> Vec<Vec<String>> {
        self.terminated.lock().expect("mutex poisoned").clone()
    }
}

impl ComputeProvider for ScriptedProvider {
    async fn run_instances(&self, _spec: &LaunchSpec<'_>, count: usize) -> Result<Reservation> {
        let mut launched = self.launched.lock().expect("mutex poisoned");
        let offset: usize = launched.iter().sum();
        launched.push(count);
        Ok(Reservation {
            id: Some(format!("r-{}", launched.len())),
            instances: (1..=count)
                .map(|n| pending(&format!("i-{}", offset + n)))
                .collect(),
        })
    }

    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<InstanceRef>> {
        let call = {
            let mut described = self.described.lock().expect("mutex poisoned");
            described.push(ids.to_vec());
            described.len() - 1
        };
        if self.fail_describe_at == Some(call) {
            return Err(ClusterError::Provider {
                operation: "describe-instances",
                message: "RequestLimitExceeded".into(),
            }
            .into());
        }
        Ok(self
            .polls
            .get(call)
            .or_else(|| self.polls.last())
            .cloned()
            .unwrap_or_default())
    }

    async fn terminate_instances(&self, ids: &[String]) -> Result<()> {
        self.terminated
            .lock()
            .expect("mutex poisoned")
            .push(ids.to_vec());
        match self.fail_terminate {
            Some(message) => Err(ClusterError::Provider {
                operation: "terminate-instances",
                message: message.into(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// `ProgressReporter` that records messages.
#[derive(Default)]
pub struct RecordingReporter {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("mutex poisoned").clone()
    }
}

impl crate::application::ports::ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.messages
            .lock()
            .expect("mutex poisoned")
            .push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.messages
            .lock()
            .expect("mutex poisoned")
            .push(format!("success: {message}"));
    }

    fn warn(&self, message: &str) {
        self.messages
            .lock()
            .expect("mutex poisoned")
            .push(format!("warn: {message}"));
    }
}
