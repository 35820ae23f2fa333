// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Timer functions: setTimeout, setInterval and their clear counterparts.

use crate::engine::{Scope, Value};
use crate::error::{NodeError, Result};
use crate::runtime::{AsyncCallbackQueue, TimerId};
use std::sync::Arc;
use std::time::Duration;

/// Create all timer-related global functions
pub fn create_timer_functions(queue: Arc<AsyncCallbackQueue>) -> Vec<(&'static str, Value)> {
    let mut functions = Vec::new();

    // setTimeout(callback, delay)
    let q = Arc::clone(&queue);
    functions.push((
        "setTimeout",
        Value::function("setTimeout", move |args| {
            let callback = callback_arg(args, "setTimeout")?;
            let id = q.set_timeout(callback, delay_arg(args));
            Ok(Value::Number(id.0 as f64))
        }),
    ));

    // clearTimeout(timeoutId)
    let q = Arc::clone(&queue);
    functions.push((
        "clearTimeout",
        Value::function("clearTimeout", move |args| {
            if let Some(id) = timer_id_arg(args) {
                q.cancel(id);
            }
            Ok(Value::Undefined)
        }),
    ));

    // setInterval(callback, delay)
    let q = Arc::clone(&queue);
    functions.push((
        "setInterval",
        Value::function("setInterval", move |args| {
            let callback = callback_arg(args, "setInterval")?;
            let id = q.set_interval(callback, delay_arg(args));
            Ok(Value::Number(id.0 as f64))
        }),
    ));

    // clearInterval(intervalId)
    let q = queue;
    functions.push((
        "clearInterval",
        Value::function("clearInterval", move |args| {
            if let Some(id) = timer_id_arg(args) {
                q.cancel(id);
            }
            Ok(Value::Undefined)
        }),
    ));

    functions
}

/// Define the timer functions on `scope`
pub fn install(scope: &Scope, queue: &Arc<AsyncCallbackQueue>) {
    for (name, function) in create_timer_functions(Arc::clone(queue)) {
        scope.define(name, function);
    }
}

fn callback_arg(args: &[Value], caller: &str) -> Result<Value> {
    match args.first() {
        Some(callback) if callback.is_function() => Ok(callback.clone()),
        _ => Err(NodeError::type_error(format!(
            "{}: callback must be a function",
            caller
        ))),
    }
}

/// Largest delay Node accepts; anything above runs after 1 ms
const TIMEOUT_MAX_MS: f64 = 2_147_483_647.0;

fn delay_arg(args: &[Value]) -> Duration {
    let ms = args.get(1).and_then(Value::as_number).unwrap_or(0.0);
    // NaN fails both comparisons
    if ms > TIMEOUT_MAX_MS {
        Duration::from_millis(1)
    } else if ms > 0.0 {
        Duration::from_micros((ms * 1000.0) as u64)
    } else {
        Duration::ZERO
    }
}

fn timer_id_arg(args: &[Value]) -> Option<TimerId> {
    args.first()
        .and_then(Value::as_number)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| TimerId(n as u64))
}
