// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Node.js `vm` module

use crate::engine::{JsObject, Scope, ScriptEngine, Value};
use crate::error::Result;
use crate::modules::{NativeContext, NativeModule, string_arg};
use std::sync::Arc;

/// Location reported for code run through `vm`
pub const VM_LOCATION: &str = "evalmachine.<anonymous>";

/// The `vm` native module
pub struct VmModule;

impl NativeModule for VmModule {
    fn id(&self) -> &'static str {
        "vm"
    }

    fn build(&self, ctx: &NativeContext) -> Result<Value> {
        Ok(Value::Object(create_module(
            Arc::clone(&ctx.engine),
            ctx.global.clone(),
        )))
    }
}

/// Create the vm module exports
pub fn create_module(engine: Arc<dyn ScriptEngine>, global: Scope) -> JsObject {
    let exports = JsObject::new();

    // vm.runInThisContext(code)
    let this_engine = Arc::clone(&engine);
    exports.set(
        "runInThisContext",
        Value::function("runInThisContext", move |args| {
            let code = string_arg(args, 0, "code")?;
            this_engine.execute(&global, code, VM_LOCATION)
        }),
    );

    // vm.runInNewContext(code, sandbox?)
    exports.set(
        "runInNewContext",
        Value::function("runInNewContext", move |args| {
            let code = string_arg(args, 0, "code")?;
            let sandbox = args
                .get(1)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let scope = Scope::with_bindings(sandbox);
            engine.execute(&scope, code, VM_LOCATION)
        }),
    );

    exports
}
