// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Node.js `process` global object

use crate::engine::{JsObject, Value};
use crate::error::{NodeError, Result};
use crate::modules::{NativeContext, NativeModule, string_arg};
use std::sync::Arc;
use std::time::Duration;

/// The `process` native module, also bound as a global
pub struct ProcessModule;

impl NativeModule for ProcessModule {
    fn id(&self) -> &'static str {
        "process"
    }

    fn build(&self, ctx: &NativeContext) -> Result<Value> {
        Ok(Value::Object(create_process_object(ctx)))
    }

    fn is_global(&self) -> bool {
        true
    }
}

/// Create the process object
pub fn create_process_object(ctx: &NativeContext) -> JsObject {
    let process = JsObject::new();

    // process.argv
    let argv = std::iter::once("spacey".to_string())
        .chain(ctx.argv.iter().cloned())
        .map(Value::String);
    process.set("argv", Value::Object(JsObject::from_array(argv)));

    // process.env
    let env = JsObject::new();
    for (key, value) in &ctx.env {
        env.set(key.clone(), Value::String(value.clone()));
    }
    process.set("env", Value::Object(env));

    process.set("pid", Value::Number(std::process::id() as f64));

    #[cfg(unix)]
    {
        process.set(
            "ppid",
            Value::Number(nix::unistd::getppid().as_raw() as f64),
        );
    }
    #[cfg(not(unix))]
    {
        process.set("ppid", Value::Number(0.0));
    }

    process.set("platform", Value::String(get_platform().to_string()));
    process.set("arch", Value::String(get_arch().to_string()));
    process.set("version", Value::String(format!("v{}", crate::NODE_API_VERSION)));

    let versions = JsObject::new();
    versions.set("node", Value::String(crate::NODE_API_VERSION.to_string()));
    versions.set("spacey", Value::String(crate::VERSION.to_string()));
    process.set("versions", Value::Object(versions));

    // process.cwd()
    let cwd = ctx.working_dir.display().to_string();
    process.set(
        "cwd",
        Value::function("cwd", move |_| Ok(Value::String(cwd.clone()))),
    );

    // process.exit(code)
    let exit = Arc::clone(&ctx.exit);
    let exit_code = Arc::clone(&ctx.exit_code);
    process.set(
        "exit",
        Value::function("exit", move |args| {
            let code = args
                .first()
                .and_then(Value::as_number)
                .filter(|n| n.is_finite())
                .map_or(0, |n| n as i32);
            {
                let mut slot = exit_code.write();
                if slot.is_none() {
                    *slot = Some(code);
                }
            }
            tracing::debug!(code, "process.exit called");
            exit.execute(code)?;
            Ok(Value::Undefined)
        }),
    );

    // process.on(event, listener)
    let exit = Arc::clone(&ctx.exit);
    let engine = Arc::clone(&ctx.engine);
    process.set(
        "on",
        Value::function("on", move |args| {
            let event = string_arg(args, 0, "event")?;
            let listener = match args.get(1) {
                Some(f) if f.is_function() => f.clone(),
                _ => return Err(NodeError::type_error("listener must be a function")),
            };
            if event != "exit" {
                tracing::warn!(event, "ignoring listener for unsupported process event");
                return Ok(Value::Undefined);
            }
            let engine = Arc::clone(&engine);
            exit.register(move |code| {
                engine
                    .call_function(&listener, &[Value::Number(code as f64)])
                    .map(|_| ())
            });
            Ok(Value::Undefined)
        }),
    );

    // process.nextTick(callback)
    let queue = Arc::clone(&ctx.queue);
    process.set(
        "nextTick",
        Value::function("nextTick", move |args| match args.first() {
            Some(callback) if callback.is_function() => {
                queue.set_timeout(callback.clone(), Duration::ZERO);
                Ok(Value::Undefined)
            }
            _ => Err(NodeError::type_error("nextTick: callback must be a function")),
        }),
    );

    process
}

/// Get the platform string
fn get_platform() -> &'static str {
    if cfg!(target_os = "windows") {
        "win32"
    } else if cfg!(target_os = "macos") {
        "darwin"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else if cfg!(target_os = "freebsd") {
        "freebsd"
    } else if cfg!(target_os = "openbsd") {
        "openbsd"
    } else {
        "unknown"
    }
}

/// Get the architecture string
fn get_arch() -> &'static str {
    if cfg!(target_arch = "x86_64") {
        "x64"
    } else if cfg!(target_arch = "x86") {
        "ia32"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else if cfg!(target_arch = "arm") {
        "arm"
    } else {
        "unknown"
    }
}
