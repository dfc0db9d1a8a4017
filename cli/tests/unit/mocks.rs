//! Hand-written mocks for port traits.
//!
//! Unexpected calls surface as errors naming the call, never as panics
//! inside async code.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use clusterboot_cli::application::ports::CommandRunner;

type Call = (String, Vec<String>);

/// `CommandRunner` that replays queued results and records every call.
#[derive(Clone, Default)]
pub struct MockCommandRunner {
    responses: Arc<Mutex<VecDeque<Result<Output>>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next call.
    pub fn respond(self, response: Result<Output>) -> Self {
        self.responses
            .lock()
            .expect("mutex poisoned")
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("mutex poisoned").clone()
    }

    /// Argument list of call `n`.
    pub fn args(&self, n: usize) -> Vec<String> {
        self.calls()
            .get(n)
            .map(|(_, args)| args.clone())
            .unwrap_or_default()
    }
}

impl CommandRunner for MockCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, Duration::from_secs(1))
            .await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.calls.lock().expect("mutex poisoned").push((
            program.to_string(),
            args.iter().map(ToString::to_string).collect(),
        ));
        self.responses
            .lock()
            .expect("mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("unexpected call: {program} {}", args.join(" "))))
    }
}
