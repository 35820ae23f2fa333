// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution scopes and module locations.

use crate::engine::value::{JsObject, Value};
use crate::error::{NodeError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// A lexical scope: a bindings object plus an optional parent.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: JsObject,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    /// Create a top-level (global) scope
    pub fn global() -> Self {
        Self::default()
    }

    /// Create a scope whose lookups fall back to `parent`
    pub fn child(parent: &Scope) -> Self {
        Self {
            bindings: JsObject::new(),
            parent: Some(Arc::new(parent.clone())),
        }
    }

    /// Create a root scope backed by an existing bindings object
    pub fn with_bindings(bindings: JsObject) -> Self {
        Self {
            bindings,
            parent: None,
        }
    }

    /// The bindings object of this scope (not including parents)
    pub fn bindings(&self) -> &JsObject {
        &self.bindings
    }

    /// The parent scope, if any
    pub fn parent(&self) -> Option<&Scope> {
        self.parent.as_deref()
    }

    /// Bind a name in this scope
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.bindings.set(name, value);
    }

    /// Look a name up, walking parent scopes
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current.bindings.get(name) {
                return Some(value);
            }
            scope = current.parent();
        }
        None
    }
}

/// Where a module lives: its own URI and the base used to resolve the
/// relative ids it requires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleLocation {
    uri: Url,
    base: Url,
}

impl ModuleLocation {
    /// Build a location from explicit URIs
    pub fn new(uri: Url, base: Url) -> Self {
        Self { uri, base }
    }

    /// Location of a file on disk. An existing file gets its parent directory
    /// as base; anything else is its own base.
    pub fn from_path(path: &Path) -> Result<Self> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let uri = Url::from_file_path(&path).map_err(|_| NodeError::InvalidPath(path.clone()))?;
        let base = match path.parent() {
            Some(dir) if path.is_file() => Url::from_directory_path(dir)
                .map_err(|_| NodeError::InvalidPath(dir.to_path_buf()))?,
            _ => Url::from_directory_path(&path).map_err(|_| NodeError::InvalidPath(path.clone()))?,
        };
        Ok(Self { uri, base })
    }

    /// Canonical URI of the module
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Base URI for relative resolution
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The module file, if the URI is a `file:` URI
    pub fn file_path(&self) -> Option<PathBuf> {
        self.uri.to_file_path().ok()
    }

    /// The directory a module's relative requires start from: the module
    /// path itself when it is a directory, its parent otherwise.
    pub fn base_dir(&self) -> Option<PathBuf> {
        let path = self.file_path()?;
        if path.is_dir() {
            Some(path)
        } else {
            path.parent().map(Path::to_path_buf)
        }
    }
}

/// The scope a module body executes in
#[derive(Debug, Clone)]
pub struct ModuleScope {
    scope: Scope,
    location: ModuleLocation,
}

impl ModuleScope {
    /// Pair a scope with the location of the module it belongs to
    pub fn new(scope: Scope, location: ModuleLocation) -> Self {
        Self { scope, location }
    }

    /// The underlying scope
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The module's location
    pub fn location(&self) -> &ModuleLocation {
        &self.location
    }
}
