// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Shared helpers for integration tests
//!
//! `TestEngine` runs a tiny line-oriented language instead of JavaScript:
//!
//! ```text
//! set <key> <value>          exports[key] = value
//! replace <value>            module.exports = value
//! require <id> as <key>      exports[key] = require(id)
//! count <name>               bump a counter on the engine
//! trace <label>              append to the engine's trace
//! throw <message>            fail with a script error
//! timeout <ms> <label>       setTimeout(() => trace label, ms)
//! on-exit <label>            process.on("exit", () => trace label)
//! exit <code>                process.exit(code)
//! ```

#![allow(dead_code)]

use parking_lot::Mutex;
use spacey_require::engine::{Scope, ScriptEngine, Value};
use spacey_require::{NodeError, NodeRuntime, RequireConfig, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Line-oriented engine recording what it ran
#[derive(Default)]
pub struct TestEngine {
    trace: Arc<Mutex<Vec<String>>>,
    counts: Mutex<HashMap<String, usize>>,
}

impl TestEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn trace(&self) -> Vec<String> {
        self.trace.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.counts.lock().get(name).copied().unwrap_or(0)
    }

    /// A native callback that appends `label` to the trace
    pub fn tracer(&self, label: &str) -> Value {
        let trace = Arc::clone(&self.trace);
        let label = label.to_string();
        Value::function("tracer", move |_| {
            trace.lock().push(label.clone());
            Ok(Value::Undefined)
        })
    }

    fn run_line(&self, scope: &Scope, line: &str, location: &str) -> Result<()> {
        let (op, rest) = line.split_once(' ').unwrap_or((line, ""));
        match op {
            "set" => {
                let (key, value) = rest.split_once(' ').unwrap_or((rest, ""));
                exports(scope, location)?.set(key, Value::from(value));
            }
            "replace" => {
                module(scope, location)?.set("exports", Value::from(rest));
            }
            "require" => {
                let (id, key) = rest
                    .split_once(" as ")
                    .ok_or_else(|| NodeError::script(location, "expected `require <id> as <key>`"))?;
                let require = lookup(scope, "require", location)?;
                let value = self.call_function(&require, &[Value::from(id)])?;
                exports(scope, location)?.set(key, value);
            }
            "count" => {
                *self.counts.lock().entry(rest.to_string()).or_default() += 1;
            }
            "trace" => {
                self.trace.lock().push(rest.to_string());
            }
            "throw" => return Err(NodeError::script(location, rest)),
            "timeout" => {
                let (ms, label) = rest.split_once(' ').unwrap_or((rest, ""));
                let ms: f64 = ms
                    .parse()
                    .map_err(|_| NodeError::script(location, "bad delay"))?;
                let set_timeout = lookup(scope, "setTimeout", location)?;
                self.call_function(&set_timeout, &[self.tracer(label), Value::Number(ms)])?;
            }
            "on-exit" => {
                let on = process_fn(scope, "on", location)?;
                self.call_function(&on, &[Value::from("exit"), self.tracer(rest)])?;
            }
            "exit" => {
                let code: f64 = rest
                    .parse()
                    .map_err(|_| NodeError::script(location, "bad exit code"))?;
                let exit = process_fn(scope, "exit", location)?;
                self.call_function(&exit, &[Value::Number(code)])?;
            }
            other => {
                return Err(NodeError::script(location, format!("unknown op `{}`", other)));
            }
        }
        Ok(())
    }
}

impl ScriptEngine for TestEngine {
    fn execute(&self, scope: &Scope, source: &str, location: &str) -> Result<Value> {
        for line in source.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.run_line(scope, line, location)?;
        }
        Ok(Value::Undefined)
    }
}

fn lookup(scope: &Scope, name: &str, location: &str) -> Result<Value> {
    scope
        .lookup(name)
        .ok_or_else(|| NodeError::script(location, format!("{} is not defined", name)))
}

fn module(scope: &Scope, location: &str) -> Result<spacey_require::JsObject> {
    lookup(scope, "module", location)?
        .as_object()
        .cloned()
        .ok_or_else(|| NodeError::script(location, "module is not an object"))
}

fn exports(scope: &Scope, location: &str) -> Result<spacey_require::JsObject> {
    module(scope, location)?
        .get("exports")
        .and_then(|v| v.as_object().cloned())
        .ok_or_else(|| NodeError::script(location, "module.exports is not an object"))
}

fn process_fn(scope: &Scope, name: &str, location: &str) -> Result<Value> {
    lookup(scope, "process", location)?
        .as_object()
        .and_then(|process| process.get(name))
        .ok_or_else(|| NodeError::script(location, format!("process.{} is not defined", name)))
}

/// Install a test subscriber; honours RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A scratch directory, canonicalized so paths compare equal to the
/// resolver's output
pub fn fixture() -> (TempDir, PathBuf) {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().canonicalize().unwrap();
    (tmp, root)
}

/// Write `contents` to `root/rel`, creating parent directories
pub fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// A config whose top-level requires resolve inside `root`
pub fn config(root: &Path) -> RequireConfig {
    RequireConfig {
        working_dir: Some(root.to_path_buf()),
        ..RequireConfig::default()
    }
}

/// A runtime over a fresh [`TestEngine`]
pub fn runtime(config: RequireConfig) -> (NodeRuntime, Arc<TestEngine>) {
    let engine = TestEngine::new();
    let runtime = NodeRuntime::new(engine.clone(), config).unwrap();
    (runtime, engine)
}

/// `exports[key]` of a module's exports object
pub fn prop(exports: &Value, key: &str) -> Value {
    exports
        .as_object()
        .and_then(|obj| obj.get(key))
        .unwrap_or_default()
}
