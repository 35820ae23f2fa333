// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Process-wide runtime: global scope, resolver and callback queue

use crate::config::RequireConfig;
use crate::engine::{Scope, ScriptEngine, Value};
use crate::error::{NodeError, Result};
use crate::module_system::{HostResolution, ModulePathResolution, ModuleResolver};
use crate::modules::NativeContext;
use crate::runtime::{AsyncCallbackQueue, ExitCallbackExecutor};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest single wait while draining timers in [`NodeRuntime::run_file`]
const MAX_IDLE_WAIT: Duration = Duration::from_millis(100);

/// The Node.js-compatible runtime around a host script engine
pub struct NodeRuntime {
    /// The JavaScript engine
    engine: Arc<dyn ScriptEngine>,
    /// Top-level scope; `require`, `process` and the timers live here
    global: Scope,
    /// Module resolver and cache
    resolver: Arc<ModuleResolver>,
    /// Pending timer callbacks
    queue: Arc<AsyncCallbackQueue>,
    /// Handlers registered with `process.on("exit")`
    exit: Arc<ExitCallbackExecutor>,
    /// Exit code (set by process.exit())
    exit_code: Arc<RwLock<Option<i32>>>,
    /// Current working directory
    cwd: PathBuf,
}

impl NodeRuntime {
    /// Create a runtime whose fallback resolution searches the configured
    /// module paths and bundled modules
    pub fn new(engine: Arc<dyn ScriptEngine>, config: RequireConfig) -> Result<Self> {
        let host = Arc::new(ModulePathResolution::from_config(&config));
        Self::with_host(engine, config, host)
    }

    /// Create a runtime with an explicit fallback resolution
    pub fn with_host(
        engine: Arc<dyn ScriptEngine>,
        config: RequireConfig,
        host: Arc<dyn HostResolution>,
    ) -> Result<Self> {
        let global = Scope::global();
        let queue = Arc::new(AsyncCallbackQueue::new());
        let exit = Arc::new(ExitCallbackExecutor::new());
        let exit_code = Arc::new(RwLock::new(None));
        let cwd = config.resolved_working_dir();

        let ctx = NativeContext {
            engine: Arc::clone(&engine),
            global: global.clone(),
            queue: Arc::clone(&queue),
            exit: Arc::clone(&exit),
            exit_code: Arc::clone(&exit_code),
            argv: config.argv.clone(),
            env: config.env.clone(),
            working_dir: cwd.clone(),
        };

        let resolver = ModuleResolver::new(ctx, host, &config)?;
        resolver.install(&global);
        tracing::debug!(cwd = %cwd.display(), "runtime initialized");

        Ok(Self {
            engine,
            global,
            resolver,
            queue,
            exit,
            exit_code,
            cwd,
        })
    }

    /// `require(id)` from the top level
    pub fn require(&self, id: &str) -> Result<Value> {
        self.resolver.require(id, None)
    }

    /// Run a file as the main module, drain its timers and run the exit
    /// handlers. Returns the exit code.
    pub fn run_file(&self, path: &Path) -> Result<i32> {
        let abs_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        };

        if !abs_path.is_file() {
            return Err(NodeError::ModuleNotFound(abs_path.display().to_string()));
        }

        self.require(&abs_path.to_string_lossy())?;
        self.run_event_loop()?;

        let code = self.exit_code().unwrap_or(0);
        if !self.exit.has_executed() {
            self.exit.execute(code)?;
        }
        Ok(self.exit_code().unwrap_or(code))
    }

    /// Run every live callback due at or before `now`, in due order.
    /// Stops early once `process.exit()` has been called. Returns the
    /// number of callbacks run.
    pub fn run_due_callbacks(&self, now: Instant) -> Result<usize> {
        let mut ran = 0;
        for ready in self.queue.take_due(now) {
            if self.exit_code.read().is_some() {
                break;
            }
            // Cleared by an earlier callback in this batch
            if ready.is_cancelled() {
                continue;
            }
            tracing::trace!(timer = ready.id.0, "running callback");
            self.engine.call_function(&ready.callback, &[])?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Run callbacks until the queue is empty or the process exits
    fn run_event_loop(&self) -> Result<()> {
        loop {
            if self.exit_code.read().is_some() {
                break;
            }

            let now = Instant::now();
            self.run_due_callbacks(now)?;

            match self.queue.time_until_next(Instant::now()) {
                Some(wait) if wait > Duration::ZERO => {
                    std::thread::sleep(wait.min(MAX_IDLE_WAIT));
                }
                Some(_) => {}
                None => break,
            }
        }
        Ok(())
    }

    /// Exit code recorded by `process.exit()`, if it was called
    pub fn exit_code(&self) -> Option<i32> {
        *self.exit_code.read()
    }

    /// The top-level scope
    pub fn global(&self) -> &Scope {
        &self.global
    }

    /// The module resolver
    pub fn resolver(&self) -> &Arc<ModuleResolver> {
        &self.resolver
    }

    /// The timer callback queue
    pub fn queue(&self) -> &Arc<AsyncCallbackQueue> {
        &self.queue
    }

    /// The exit handler executor
    pub fn exit_executor(&self) -> &Arc<ExitCallbackExecutor> {
        &self.exit
    }
}

impl std::fmt::Debug for NodeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRuntime")
            .field("cwd", &self.cwd)
            .field("exit_code", &self.exit_code())
            .field("pending_callbacks", &self.queue.len())
            .finish()
    }
}
