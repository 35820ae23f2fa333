// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Node.js `child_process` module (synchronous subset)

use crate::engine::{JsObject, Value};
use crate::error::{NodeError, Result};
use crate::modules::{NativeContext, NativeModule, string_arg};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// The `child_process` native module
pub struct ChildProcessModule;

impl NativeModule for ChildProcessModule {
    fn id(&self) -> &'static str {
        "child_process"
    }

    fn build(&self, ctx: &NativeContext) -> Result<Value> {
        Ok(Value::Object(create_module(ctx.working_dir.clone())))
    }
}

/// Create the child_process module exports. Commands run in `cwd`.
pub fn create_module(cwd: PathBuf) -> JsObject {
    let exports = JsObject::new();

    let exec_cwd = cwd.clone();
    exports.set(
        "execSync",
        Value::function("execSync", move |args| {
            let command = string_arg(args, 0, "command")?;
            let stdout = exec_sync(command, &exec_cwd)?;
            Ok(Value::String(String::from_utf8_lossy(&stdout).to_string()))
        }),
    );

    exports.set(
        "spawnSync",
        Value::function("spawnSync", move |args| {
            let command = string_arg(args, 0, "command")?;
            let argv: Vec<String> = args
                .get(1)
                .and_then(Value::as_object)
                .map(|arr| arr.array_items().iter().map(|v| v.to_string()).collect())
                .unwrap_or_default();
            let result = spawn_sync(command, &argv, &cwd)?;

            let obj = JsObject::new();
            obj.set("stdout", Value::String(String::from_utf8_lossy(&result.stdout).to_string()));
            obj.set("stderr", Value::String(String::from_utf8_lossy(&result.stderr).to_string()));
            obj.set(
                "status",
                result.status.map_or(Value::Null, |code| Value::Number(code as f64)),
            );
            Ok(Value::Object(obj))
        }),
    );

    exports
}

/// Result of [`spawn_sync`]
#[derive(Debug)]
pub struct SpawnResult {
    /// Captured stdout
    pub stdout: Vec<u8>,
    /// Captured stderr
    pub stderr: Vec<u8>,
    /// Exit status, `None` when killed by a signal
    pub status: Option<i32>,
}

/// Execute a shell command synchronously and return its stdout. A
/// non-zero exit status is an error.
pub fn exec_sync(command: &str, cwd: &Path) -> Result<Vec<u8>> {
    let shell = if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };

    let output = Command::new(shell.0)
        .arg(shell.1)
        .arg(command)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| NodeError::Process(format!("Failed to execute command: {}", e)))?;

    if !output.status.success() {
        return Err(NodeError::Process(format!(
            "Command failed with exit code: {:?}",
            output.status.code()
        )));
    }

    Ok(output.stdout)
}

/// Spawn a process synchronously, capturing its output
pub fn spawn_sync(command: &str, args: &[String], cwd: &Path) -> Result<SpawnResult> {
    let output = Command::new(command)
        .args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| NodeError::Process(format!("Failed to spawn process: {}", e)))?;

    Ok(SpawnResult {
        stdout: output.stdout,
        stderr: output.stderr,
        status: output.status.code(),
    })
}
