// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - reads and compiles script modules

use crate::config::RequireConfig;
use crate::engine::{ModuleLocation, Scope, ScriptEngine, Value};
use crate::error::{NodeError, Result};
use crate::module_system::cache::ModuleRecord;
use crate::module_system::resolver::ModuleResolver;
use parking_lot::Mutex;
use std::path::Path;
use url::Url;

/// Scripts run around every module body, in the module's own scope
#[derive(Debug, Clone, Default)]
pub struct ExecHooks {
    pre: Option<String>,
    post: Option<String>,
}

impl ExecHooks {
    /// Hooks from explicit sources
    pub fn new(pre: Option<String>, post: Option<String>) -> Self {
        Self { pre, post }
    }

    /// Hooks from `pre_exec` / `post_exec`
    pub fn from_config(config: &RequireConfig) -> Self {
        Self::new(config.pre_exec.clone(), config.post_exec.clone())
    }

    fn run_pre(&self, engine: &dyn ScriptEngine, scope: &Scope) -> Result<()> {
        run_hook(engine, scope, self.pre.as_deref(), "<pre-exec>")
    }

    fn run_post(&self, engine: &dyn ScriptEngine, scope: &Scope) -> Result<()> {
        run_hook(engine, scope, self.post.as_deref(), "<post-exec>")
    }
}

fn run_hook(engine: &dyn ScriptEngine, scope: &Scope, source: Option<&str>, name: &str) -> Result<()> {
    if let Some(source) = source {
        engine.execute(scope, source, name)?;
    }
    Ok(())
}

/// Marks a module as executing until dropped
struct LoadingGuard<'a> {
    loading: &'a Mutex<Vec<Url>>,
}

impl<'a> LoadingGuard<'a> {
    fn enter(loading: &'a Mutex<Vec<Url>>, uri: &Url) -> Result<Self> {
        let mut stack = loading.lock();
        if stack.contains(uri) {
            let chain: Vec<_> = stack.iter().map(Url::as_str).chain([uri.as_str()]).collect();
            return Err(NodeError::CircularDependency(chain.join(" -> ")));
        }
        stack.push(uri.clone());
        Ok(Self { loading })
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.loading.lock().pop();
    }
}

impl ModuleResolver {
    /// Compile and run a script module, or return its cached exports.
    ///
    /// The module body runs in a fresh scope holding `exports`, `module`,
    /// `require`, `__filename` and `__dirname`, between the pre- and
    /// post-exec hooks. `module.exports` is read back afterwards and
    /// published to the cache; nothing is cached when any step fails.
    pub fn compile(&self, id: &str, path: &Path) -> Result<Value> {
        let location = ModuleLocation::from_path(path)?;
        if let Some(record) = self.cache.get(location.uri()) {
            tracing::trace!(id, uri = %location.uri(), "module cache hit");
            return Ok(record.exports);
        }

        let _guard = LoadingGuard::enter(&self.loading, location.uri())?;
        let filename = location
            .file_path()
            .unwrap_or_else(|| path.to_path_buf());
        let source = std::fs::read_to_string(&filename)?;
        tracing::debug!(id, path = %filename.display(), "compiling module");

        let module_scope = self.engine.create_scope(&self.global, &location);
        let scope = module_scope.scope();

        let exports = self.engine.new_object();
        let module = self.engine.new_object();
        module.define_read_only("id", Value::from(id));
        module.define_read_only("uri", Value::from(location.uri().as_str()));
        module.set("exports", Value::Object(exports.clone()));

        scope.define("exports", Value::Object(exports));
        scope.define("module", Value::Object(module.clone()));
        scope.define("require", self.require_function(Some(location.clone())));
        scope.define("__filename", Value::String(filename.display().to_string()));
        if let Some(dir) = location.base_dir() {
            scope.define("__dirname", Value::String(dir.display().to_string()));
        }

        self.hooks.run_pre(self.engine.as_ref(), scope)?;
        self.engine
            .execute(scope, &source, &filename.display().to_string())?;
        self.hooks.run_post(self.engine.as_ref(), scope)?;

        let record = self.cache.publish(ModuleRecord {
            id: id.to_string(),
            location,
            exports: module.get("exports").unwrap_or_default(),
        });
        Ok(record.exports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_guard_detects_cycles() {
        let loading = Mutex::new(Vec::new());
        let a = Url::parse("file:///a.js").unwrap();
        let b = Url::parse("file:///b.js").unwrap();

        let _outer = LoadingGuard::enter(&loading, &a).unwrap();
        {
            let _inner = LoadingGuard::enter(&loading, &b).unwrap();
            let err = LoadingGuard::enter(&loading, &a).err().unwrap();
            assert_eq!(
                err.to_string(),
                "Circular dependency detected: file:///a.js -> file:///b.js -> file:///a.js"
            );
        }
        assert_eq!(loading.lock().len(), 1);
    }
}
