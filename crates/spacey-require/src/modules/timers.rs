// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Node.js `timers` module

use crate::engine::{JsObject, Value};
use crate::error::Result;
use crate::globals::timers::create_timer_functions;
use crate::modules::{NativeContext, NativeModule};
use std::sync::Arc;

/// The `timers` native module: the timer globals as a module object
pub struct TimersModule;

impl NativeModule for TimersModule {
    fn id(&self) -> &'static str {
        "timers"
    }

    fn build(&self, ctx: &NativeContext) -> Result<Value> {
        let exports = JsObject::new();
        for (name, function) in create_timer_functions(Arc::clone(&ctx.queue)) {
            exports.set(name, function);
        }
        Ok(Value::Object(exports))
    }
}
