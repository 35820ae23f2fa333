// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Values exchanged with the host script engine.

use crate::error::Result;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A JavaScript value as seen from the module system.
///
/// Objects and functions are shared references: cloning a value never
/// copies the underlying object, so the exports published by a module keep
/// their identity for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Object reference
    Object(JsObject),
    /// Function reference
    Function(Arc<Callable>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Wrap a native closure as a function value.
    pub fn function<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(Arc::new(Callable::native(name, f)))
    }

    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if this value is null or undefined.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns true if this value is a function.
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Borrow the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The object reference, if this is an object.
    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The callable, if this is a function.
    pub fn as_function(&self) -> Option<&Arc<Callable>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Converts the value to a boolean (ToBoolean).
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Object(_) | Value::Function(_) => true,
        }
    }

    /// Returns the type of this value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Function(func) => write!(f, "function {}() {{ [native code] }}", func.name()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<JsObject> for Value {
    fn from(obj: JsObject) -> Self {
        Value::Object(obj)
    }
}

#[derive(Default)]
struct ObjectData {
    properties: HashMap<String, Value>,
    read_only: HashSet<String>,
}

/// A shared, mutable property bag.
///
/// Equality is reference identity, never structural.
#[derive(Clone, Default)]
pub struct JsObject(Arc<RwLock<ObjectData>>);

impl JsObject {
    /// Create an empty object
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an array-like object (`"0"`, `"1"`, ..., `length`)
    pub fn from_array(values: impl IntoIterator<Item = Value>) -> Self {
        let obj = Self::new();
        let mut len = 0usize;
        for (i, value) in values.into_iter().enumerate() {
            obj.set(i.to_string(), value);
            len = i + 1;
        }
        obj.set("length", Value::Number(len as f64));
        obj
    }

    /// Read the elements of an array-like object.
    pub fn array_items(&self) -> Vec<Value> {
        let len = self
            .get("length")
            .and_then(|v| v.as_number())
            .unwrap_or(0.0) as usize;
        (0..len)
            .map(|i| self.get(&i.to_string()).unwrap_or_default())
            .collect()
    }

    /// Get a property
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().properties.get(key).cloned()
    }

    /// Set a property. Returns false (and leaves the value untouched) when
    /// the property is read-only.
    pub fn set(&self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        let mut data = self.0.write();
        if data.read_only.contains(&key) {
            return false;
        }
        data.properties.insert(key, value);
        true
    }

    /// Define a read-only, non-deletable property
    pub fn define_read_only(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let mut data = self.0.write();
        data.properties.insert(key.clone(), value);
        data.read_only.insert(key);
    }

    /// Check if a property exists
    pub fn has(&self, key: &str) -> bool {
        self.0.read().properties.contains_key(key)
    }

    /// Property names, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.0.read().properties.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.0.read().properties.len()
    }

    /// Whether the object has no properties
    pub fn is_empty(&self) -> bool {
        self.0.read().properties.is_empty()
    }

    /// Reference identity
    pub fn ptr_eq(&self, other: &JsObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsObject")
            .field("keys", &self.keys())
            .finish()
    }
}

/// Native function signature
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Opaque handle to a function owned by the script engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptFunction(pub u64);

/// How a function is implemented
#[derive(Clone)]
pub enum FunctionKind {
    /// Implemented in Rust
    Native(NativeFn),
    /// Implemented in script; only the engine can invoke it
    Script(ScriptFunction),
}

/// A callable value, with its own properties (e.g. `require.resolve`)
pub struct Callable {
    name: String,
    kind: FunctionKind,
    properties: JsObject,
}

impl Callable {
    /// Create a native function
    pub fn native<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: FunctionKind::Native(Arc::new(f)),
            properties: JsObject::new(),
        }
    }

    /// Wrap an engine-owned script function
    pub fn script(name: impl Into<String>, handle: ScriptFunction) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::Script(handle),
            properties: JsObject::new(),
        }
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Implementation kind
    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    /// Properties attached to the function object
    pub fn properties(&self) -> &JsObject {
        &self.properties
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FunctionKind::Native(_) => "native",
            FunctionKind::Script(_) => "script",
        };
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}
