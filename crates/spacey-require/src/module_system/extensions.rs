// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Per-extension loaders (`require.extensions`)

use crate::engine::{JsObject, ModuleLocation, Value};
use crate::error::{NodeError, Result};
use crate::module_system::resolver::ModuleResolver;
use std::path::Path;
use std::sync::Arc;

/// A resolved file about to be loaded
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest<'a> {
    /// The id passed to require()
    pub id: &'a str,
    /// Absolute path of the resolved file
    pub path: &'a Path,
    /// The requiring module, if any
    pub caller: Option<&'a ModuleLocation>,
}

/// Strategy for loading one kind of file
pub trait ExtensionHandler: Send + Sync {
    /// Load the file and produce its exports
    fn load(&self, resolver: &ModuleResolver, request: &LoadRequest<'_>) -> Result<Value>;
}

/// Compiles and runs the file through the script engine (`.js`)
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptHandler;

impl ExtensionHandler for ScriptHandler {
    fn load(&self, resolver: &ModuleResolver, request: &LoadRequest<'_>) -> Result<Value> {
        resolver.compile(request.id, request.path)
    }
}

/// Registered but unimplemented extension (`.json`, `.node`).
///
/// Fails with [`NodeError::NotImplementedExtension`] unless `ignore` is
/// set, in which case a fresh empty exports object is returned so scripts
/// can probe for optional modules.
#[derive(Debug, Clone)]
pub struct UnimplementedHandler {
    extension: String,
    ignore: bool,
}

impl UnimplementedHandler {
    /// Create a handler for `extension`
    pub fn new(extension: impl Into<String>, ignore: bool) -> Self {
        Self {
            extension: extension.into(),
            ignore,
        }
    }
}

impl ExtensionHandler for UnimplementedHandler {
    fn load(&self, _resolver: &ModuleResolver, request: &LoadRequest<'_>) -> Result<Value> {
        if self.ignore {
            tracing::warn!(
                path = %request.path.display(),
                extension = %self.extension,
                "ignoring unimplemented extension; returning empty exports"
            );
            return Ok(Value::Object(JsObject::new()));
        }
        Err(NodeError::NotImplementedExtension(self.extension.clone()))
    }
}

/// Ordered extension -> handler table. Registration order is the order
/// extensions are tried in.
#[derive(Clone, Default)]
pub struct ExtensionHandlerTable {
    handlers: Vec<(String, Arc<dyn ExtensionHandler>)>,
}

impl ExtensionHandlerTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// `.js` compiles, `.json` and `.node` are unimplemented
    pub fn with_defaults(ignore_unimplemented: bool) -> Self {
        let mut table = Self::new();
        table.register(".js", Arc::new(ScriptHandler));
        table.register(".json", Arc::new(UnimplementedHandler::new(".json", ignore_unimplemented)));
        table.register(".node", Arc::new(UnimplementedHandler::new(".node", ignore_unimplemented)));
        table
    }

    /// Register a handler. Re-registering an extension replaces its handler
    /// but keeps its position.
    pub fn register(&mut self, extension: &str, handler: Arc<dyn ExtensionHandler>) {
        let extension = normalize(extension);
        match self.handlers.iter_mut().find(|(ext, _)| *ext == extension) {
            Some(slot) => slot.1 = handler,
            None => self.handlers.push((extension, handler)),
        }
    }

    /// Handler for an extension (with or without the leading dot)
    pub fn get(&self, extension: &str) -> Option<Arc<dyn ExtensionHandler>> {
        let extension = normalize(extension);
        self.handlers
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, handler)| Arc::clone(handler))
    }

    /// Whether an extension is registered
    pub fn contains(&self, extension: &str) -> bool {
        self.get(extension).is_some()
    }

    /// Handler for a path's own extension
    pub fn for_path(&self, path: &Path) -> Option<Arc<dyn ExtensionHandler>> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get(ext))
    }

    /// Registered extensions, in registration order
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|(ext, _)| ext.as_str())
    }

    /// Number of registered extensions
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no extensions are registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

fn normalize(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}
