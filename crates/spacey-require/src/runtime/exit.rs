// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Exit callbacks run when `process.exit()` is requested

use crate::error::{NodeError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A handler invoked with the exit code
pub type ExitHandler = Box<dyn FnMut(i32) -> Result<()> + Send>;

/// Runs registered exit handlers exactly once, in registration order.
///
/// Every handler runs even when an earlier one fails; failures are
/// reported together as [`NodeError::ExitHandlers`].
#[derive(Default)]
pub struct ExitCallbackExecutor {
    handlers: Mutex<Vec<ExitHandler>>,
    executed: AtomicBool,
}

impl ExitCallbackExecutor {
    /// Create an executor with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Handlers registered after execution never run.
    pub fn register<F>(&self, handler: F)
    where
        F: FnMut(i32) -> Result<()> + Send + 'static,
    {
        if self.has_executed() {
            tracing::warn!("exit handler registered after exit; ignoring");
            return;
        }
        self.handlers.lock().push(Box::new(handler));
    }

    /// Run all handlers. Subsequent calls do nothing.
    pub fn execute(&self, code: i32) -> Result<()> {
        if self.executed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let handlers = std::mem::take(&mut *self.handlers.lock());
        tracing::debug!(code, handlers = handlers.len(), "running exit handlers");

        let mut failures = Vec::new();
        for (index, mut handler) in handlers.into_iter().enumerate() {
            if let Err(e) = handler(code) {
                tracing::warn!(index, error = %e, "exit handler failed");
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NodeError::ExitHandlers(failures))
        }
    }

    /// Whether [`execute`](Self::execute) has been called
    pub fn has_executed(&self) -> bool {
        self.executed.load(Ordering::SeqCst)
    }

    /// Number of handlers waiting to run
    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Whether no handlers are waiting
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }
}
