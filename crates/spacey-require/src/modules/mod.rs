// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Built-in native modules
//!
//! Native modules are built once, when the resolver is created, and are
//! returned by `require()` before any filesystem lookup happens. They are
//! never cached by URI or routed through extension handlers.

pub mod child_process;
pub mod fs;
pub mod timers;
pub mod vm;

use crate::engine::{Scope, ScriptEngine, Value};
use crate::error::{NodeError, Result};
use crate::globals::process::ProcessModule;
use crate::runtime::{AsyncCallbackQueue, ExitCallbackExecutor};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a native module may bind to when it is built
#[derive(Clone)]
pub struct NativeContext {
    /// The script engine
    pub engine: Arc<dyn ScriptEngine>,
    /// The process-wide global scope
    pub global: Scope,
    /// Timer callbacks, drained by the host's event loop
    pub queue: Arc<AsyncCallbackQueue>,
    /// Handlers run by `process.exit()`
    pub exit: Arc<ExitCallbackExecutor>,
    /// Exit code requested by `process.exit()`
    pub exit_code: Arc<RwLock<Option<i32>>>,
    /// `process.argv` after the executable name
    pub argv: Vec<String>,
    /// `process.env`
    pub env: BTreeMap<String, String>,
    /// `process.cwd()` and base of top-level relative requires
    pub working_dir: PathBuf,
}

/// A built-in capability module
pub trait NativeModule: Send + Sync {
    /// The id it is required by (`"fs"`)
    fn id(&self) -> &'static str;

    /// Build the module object. Called exactly once per resolver.
    fn build(&self, ctx: &NativeContext) -> Result<Value>;

    /// Whether the module is also bound onto the global scope under its id
    fn is_global(&self) -> bool {
        false
    }
}

/// Native modules by id, built once
#[derive(Debug, Default)]
pub struct NativeModuleRegistry {
    modules: HashMap<String, Value>,
}

impl NativeModuleRegistry {
    /// Build every descriptor and publish global ones onto the global scope
    pub fn build(descriptors: &[Box<dyn NativeModule>], ctx: &NativeContext) -> Result<Self> {
        let mut modules = HashMap::new();
        for descriptor in descriptors {
            let id = descriptor.id();
            if modules.contains_key(id) {
                return Err(NodeError::DuplicateNativeModule(id.to_string()));
            }
            let module = descriptor.build(ctx)?;
            if descriptor.is_global() {
                ctx.global.define(id, module.clone());
            }
            tracing::trace!(id, "built native module");
            modules.insert(id.to_string(), module);
        }
        Ok(Self { modules })
    }

    /// Get a native module by id
    pub fn get(&self, id: &str) -> Option<Value> {
        self.modules.get(id).cloned()
    }

    /// Whether `id` names a native module
    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.modules.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// The built-in native modules: fs, process, child_process, vm, timers
pub fn builtin_modules() -> Vec<Box<dyn NativeModule>> {
    vec![
        Box::new(fs::FsModule),
        Box::new(ProcessModule),
        Box::new(child_process::ChildProcessModule),
        Box::new(vm::VmModule),
        Box::new(timers::TimersModule),
    ]
}

/// A required string argument
pub(crate) fn string_arg<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a str> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        NodeError::type_error(format!(
            "The \"{}\" argument must be of type string. Received {}",
            name,
            args.get(index).map_or("undefined", Value::type_of)
        ))
    })
}

/// An optional string argument, or the `key` property of an options object
pub(crate) fn option_arg(args: &[Value], index: usize, key: &str) -> Option<String> {
    match args.get(index)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(options) => options.get(key).and_then(|v| v.as_str().map(str::to_string)),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Engine that rejects everything; enough for building native modules
    pub struct NullEngine;

    impl ScriptEngine for NullEngine {
        fn execute(&self, _scope: &Scope, _source: &str, location: &str) -> Result<Value> {
            Err(NodeError::script(location, "no engine"))
        }
    }

    pub fn context() -> NativeContext {
        NativeContext {
            engine: Arc::new(NullEngine),
            global: Scope::global(),
            queue: Arc::new(AsyncCallbackQueue::new()),
            exit: Arc::new(ExitCallbackExecutor::new()),
            exit_code: Arc::new(RwLock::new(None)),
            argv: vec!["script.js".to_string()],
            env: BTreeMap::from([("HOME".to_string(), "/home/node".to_string())]),
            working_dir: PathBuf::from("/srv/app"),
        }
    }

    /// Call a function-valued property of a module object
    pub fn call(module: &Value, name: &str, args: &[Value]) -> Result<Value> {
        let function = module
            .as_object()
            .and_then(|obj| obj.get(name))
            .unwrap_or_default();
        NullEngine.call_function(&function, args)
    }
}
