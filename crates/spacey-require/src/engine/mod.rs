// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Boundary with the host JavaScript engine
//!
//! The module system never parses or runs JavaScript itself. Everything it
//! needs from an engine is expressed by [`ScriptEngine`]:
//!
//! - compile and run a source string in a given scope
//! - call a function value
//! - derive a fresh module scope from a parent scope
//! - create objects for `module` / `exports`

mod scope;
mod value;

pub use scope::{ModuleLocation, ModuleScope, Scope};
pub use value::{Callable, FunctionKind, JsObject, NativeFn, ScriptFunction, Value};

use crate::error::{NodeError, Result};

/// A script engine the module system can drive
pub trait ScriptEngine: Send + Sync {
    /// Compile and run `source` in `scope`. `location` names the source in
    /// diagnostics (usually the file path).
    fn execute(&self, scope: &Scope, source: &str, location: &str) -> Result<Value>;

    /// Call a function value with the given arguments.
    fn call_function(&self, function: &Value, args: &[Value]) -> Result<Value> {
        match function {
            Value::Function(callable) => match callable.kind() {
                FunctionKind::Native(f) => f(args),
                FunctionKind::Script(handle) => Err(NodeError::type_error(format!(
                    "script function {:?} ({}) cannot be called by this engine",
                    handle,
                    callable.name()
                ))),
            },
            other => Err(NodeError::type_error(format!(
                "{} is not a function",
                other.type_of()
            ))),
        }
    }

    /// Create a fresh scope for a module body, derived from `parent`.
    fn create_scope(&self, parent: &Scope, location: &ModuleLocation) -> ModuleScope {
        ModuleScope::new(Scope::child(parent), location.clone())
    }

    /// Create an empty object.
    fn new_object(&self) -> JsObject {
        JsObject::new()
    }
}
