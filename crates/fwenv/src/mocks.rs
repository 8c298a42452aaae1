//! Mock implementations for testing
//!
//! [`FakeRunner`] replays canned [`ToolOutput`]s and records every command
//! it was asked to run. Used by the unit tests here and, with the `mocks`
//! feature, by integration tests that drive the builders without the vendor
//! scripts installed.

#![cfg(any(test, feature = "mocks"))]

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::Result;
use crate::tool::{ToolCommand, ToolOutput, ToolRunner};

/// Replays queued outputs in order; once the queue is empty every call
/// succeeds with empty output.
#[derive(Debug, Default)]
pub struct FakeRunner {
    replies: RefCell<VecDeque<ToolOutput>>,
    calls: RefCell<Vec<ToolCommand>>,
}

impl FakeRunner {
    pub fn new(replies: Vec<ToolOutput>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Commands seen so far.
    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.borrow().clone()
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput> {
        self.calls.borrow_mut().push(cmd.clone());
        Ok(self.replies.borrow_mut().pop_front().unwrap_or_default())
    }
}
