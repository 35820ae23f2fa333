// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution (Node.js algorithm)
//!
//! For every `require(id)` the strategies below are tried in order; the
//! first one that finds something wins:
//!
//! 1. native modules (`fs`, `process`, ...), before any filesystem access
//! 2. absolute ids with each registered extension (`id.js`, `idindex.js`, ...)
//! 3. relative ids with each registered extension, from the caller's directory
//! 4. an existing file whose own extension is registered
//! 5. a directory whose package.json declares `main`
//! 6. `node_modules` under the nearest module roots of the caller
//! 7. the host's fallback resolution
//!
//! In sandboxed mode the file found by steps 2-7 must also pass the
//! [`ModuleSandbox`].

use crate::config::RequireConfig;
use crate::engine::{Callable, ModuleLocation, Scope, ScriptEngine, Value};
use crate::error::{NodeError, Result};
use crate::globals::timers;
use crate::module_system::cache::ModuleCache;
use crate::module_system::extensions::{
    ExtensionHandler, ExtensionHandlerTable, LoadRequest, ScriptHandler,
};
use crate::module_system::host::{HostResolution, ModuleSandbox};
use crate::module_system::loader::ExecHooks;
use crate::module_system::package::{PACKAGE_DESCRIPTOR, PackageDescriptor, find_module_root};
use crate::modules::{self, NativeContext, NativeModule, NativeModuleRegistry};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use url::Url;

/// How many module roots are searched for `node_modules`
const NODE_MODULES_ATTEMPTS: usize = 2;

/// Nesting limit for package entry points that point at other packages
const MAX_ENTRY_DEPTH: usize = 16;

/// Classification of a require() id. Computed for every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleIdKind {
    /// `/a/b`
    Absolute,
    /// `./a`, `../a`, `.`, `..`
    Relative,
    /// `lodash`, `lib/util`
    Bare,
}

impl ModuleIdKind {
    /// Classify an id
    pub fn of(id: &str) -> Self {
        if id.starts_with('/') || Path::new(id).is_absolute() {
            Self::Absolute
        } else if id.starts_with("./") || id.starts_with("../") || id == "." || id == ".." {
            Self::Relative
        } else {
            Self::Bare
        }
    }

    /// Absolute or relative
    pub fn is_path(self) -> bool {
        !matches!(self, Self::Bare)
    }
}

/// Result of module resolution
#[derive(Debug, Clone)]
pub enum Resolved {
    /// Native module, already built
    Native(Value),
    /// A file to load through the extension handlers
    File(PathBuf),
}

/// The require() service: native modules, extension handlers and the
/// module cache, plus the resolution algorithm tying them together.
pub struct ModuleResolver {
    this: Weak<ModuleResolver>,
    pub(crate) engine: Arc<dyn ScriptEngine>,
    pub(crate) global: Scope,
    pub(crate) cache: ModuleCache,
    natives: NativeModuleRegistry,
    extensions: ExtensionHandlerTable,
    host: Arc<dyn HostResolution>,
    sandbox: Option<ModuleSandbox>,
    pub(crate) hooks: ExecHooks,
    working_dir: PathBuf,
    /// Modules currently executing, innermost last
    pub(crate) loading: Mutex<Vec<Url>>,
}

impl ModuleResolver {
    /// Create a resolver with the built-in native modules and the default
    /// extension handlers, and install `process` and the timer functions
    /// into the context's global scope.
    pub fn new(
        ctx: NativeContext,
        host: Arc<dyn HostResolution>,
        config: &RequireConfig,
    ) -> Result<Arc<Self>> {
        Self::with_parts(
            ctx,
            host,
            config,
            modules::builtin_modules(),
            ExtensionHandlerTable::with_defaults(config.ignore_unimplemented_extensions),
        )
    }

    /// Create a resolver with explicit native modules and extension handlers
    pub fn with_parts(
        ctx: NativeContext,
        host: Arc<dyn HostResolution>,
        config: &RequireConfig,
        native_modules: Vec<Box<dyn NativeModule>>,
        extensions: ExtensionHandlerTable,
    ) -> Result<Arc<Self>> {
        let natives = NativeModuleRegistry::build(&native_modules, &ctx)?;
        timers::install(&ctx.global, &ctx.queue);
        tracing::debug!(natives = ?natives.ids(), "module resolver ready");

        Ok(Arc::new_cyclic(|this| Self {
            this: this.clone(),
            engine: ctx.engine,
            global: ctx.global,
            cache: ModuleCache::new(),
            natives,
            extensions,
            host,
            sandbox: ModuleSandbox::from_config(config),
            hooks: ExecHooks::from_config(config),
            working_dir: ctx.working_dir,
            loading: Mutex::new(Vec::new()),
        }))
    }

    /// Bind `require` into a scope, resolving relative ids against the
    /// configured working directory.
    pub fn install(&self, scope: &Scope) {
        scope.define("require", self.require_function(None));
    }

    /// Load a module and return its exports
    pub fn require(&self, id: &str, caller: Option<&ModuleLocation>) -> Result<Value> {
        match self.resolve(id, caller)? {
            Resolved::Native(exports) => Ok(exports),
            Resolved::File(path) => self.load_file(id, &path, caller),
        }
    }

    /// Resolve without loading (`require.resolve`)
    pub fn resolve(&self, id: &str, caller: Option<&ModuleLocation>) -> Result<Resolved> {
        if let Some(native) = self.natives.get(id) {
            tracing::trace!(id, "native module");
            return Ok(Resolved::Native(native));
        }
        let path = match self.locate(id, caller, 0)? {
            Some(path) => path,
            None => self.fallback(id, caller)?,
        };
        if let Some(sandbox) = &self.sandbox {
            sandbox.check(id, &path)?;
        }
        Ok(Resolved::File(path))
    }

    /// The module cache
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Native modules
    pub fn natives(&self) -> &NativeModuleRegistry {
        &self.natives
    }

    /// Extension handlers
    pub fn extensions(&self) -> &ExtensionHandlerTable {
        &self.extensions
    }

    /// The global scope modules are created under
    pub fn global(&self) -> &Scope {
        &self.global
    }

    /// Steps 2-6
    fn locate(&self, id: &str, caller: Option<&ModuleLocation>, depth: usize) -> Result<Option<PathBuf>> {
        let kind = ModuleIdKind::of(id);

        let found = match kind {
            ModuleIdKind::Absolute => self.try_extensions(id, None),
            ModuleIdKind::Relative => self.try_extensions(id, Some(&self.base_dir(caller))),
            ModuleIdKind::Bare => None,
        };
        if let Some(path) = found {
            tracing::debug!(id, path = %path.display(), "resolved with extension");
            return Ok(Some(path));
        }

        let target = self.id_path(id, kind, caller);
        if target.is_file() && self.extensions.for_path(&target).is_some() {
            tracing::debug!(id, path = %target.display(), "resolved file with registered extension");
            return Ok(Some(target));
        }

        if target.is_dir() {
            let descriptor = target.join(PACKAGE_DESCRIPTOR);
            if descriptor.is_file() {
                // A package directory claims the id: without `main` only
                // the host fallback is left
                let Some(main) = PackageDescriptor::read(&descriptor)?.main else {
                    tracing::debug!(id, dir = %target.display(), "package directory without main");
                    return Ok(None);
                };
                let entry = target.join(&main);
                tracing::debug!(id, entry = %entry.display(), "resolved package directory");
                return self.resolve_entry(&entry, caller, depth).map(Some);
            }
        }

        if kind == ModuleIdKind::Bare {
            if let Some(base) = caller.and_then(ModuleLocation::base_dir) {
                return self.locate_in_node_modules(id, &base, caller, depth);
            }
        }

        Ok(None)
    }

    /// Try `id + ext`, then `id + "index" + ext`, for each registered
    /// extension in order.
    fn try_extensions(&self, id: &str, base: Option<&Path>) -> Option<PathBuf> {
        if !ModuleIdKind::of(id).is_path() {
            return None;
        }
        let rooted = |name: String| match base {
            Some(base) => base.join(name),
            None => PathBuf::from(name),
        };
        self.extensions.extensions().find_map(|ext| {
            [format!("{}{}", id, ext), format!("{}index{}", id, ext)]
                .into_iter()
                .map(&rooted)
                .find(|path| path.is_file())
        })
    }

    /// Where `id` points on disk before any extension is added
    fn id_path(&self, id: &str, kind: ModuleIdKind, caller: Option<&ModuleLocation>) -> PathBuf {
        match kind {
            ModuleIdKind::Absolute => PathBuf::from(id),
            ModuleIdKind::Relative => self.base_dir(caller).join(id),
            ModuleIdKind::Bare => self.working_dir.join(id),
        }
    }

    /// Directory relative ids start from
    fn base_dir(&self, caller: Option<&ModuleLocation>) -> PathBuf {
        caller
            .and_then(ModuleLocation::base_dir)
            .unwrap_or_else(|| self.working_dir.clone())
    }

    /// Step 6: `<root>/node_modules/<id>` for the nearest module roots
    fn locate_in_node_modules(
        &self,
        id: &str,
        base: &Path,
        caller: Option<&ModuleLocation>,
        depth: usize,
    ) -> Result<Option<PathBuf>> {
        let mut start = Some(base.to_path_buf());
        for _ in 0..NODE_MODULES_ATTEMPTS {
            let Some(root) = start.as_deref().and_then(find_module_root) else {
                break;
            };
            let package_dir = root.join("node_modules").join(id);
            let descriptor = package_dir.join(PACKAGE_DESCRIPTOR);
            if descriptor.exists() {
                let package = PackageDescriptor::read(&descriptor)?;
                let main = package.main_or_default();
                let mut entry = package_dir.join(main);
                if !entry.exists() {
                    entry = package_dir.join(format!("{}.js", main));
                }
                tracing::debug!(id, root = %root.display(), entry = %entry.display(), "resolved from node_modules");
                return self.resolve_entry(&entry, caller, depth).map(Some);
            }
            start = root.parent().map(Path::to_path_buf);
        }
        Ok(None)
    }

    /// Resolve a package entry point by re-entering resolution with its
    /// absolute path, falling back to the host. Directories are entered
    /// as `dir/` so their index file is found.
    fn resolve_entry(&self, entry: &Path, caller: Option<&ModuleLocation>, depth: usize) -> Result<PathBuf> {
        if depth >= MAX_ENTRY_DEPTH {
            return Err(NodeError::CircularDependency(entry.display().to_string()));
        }
        let mut id = entry.to_string_lossy().into_owned();
        if entry.is_dir() && !id.ends_with('/') {
            id.push('/');
        }
        match self.locate(&id, caller, depth + 1)? {
            Some(path) => Ok(path),
            None => self.host.resolve(&id, caller),
        }
    }

    /// Step 7, plus the extension fallback for ids like `util` meaning a
    /// sibling `util.js`.
    fn fallback(&self, id: &str, caller: Option<&ModuleLocation>) -> Result<PathBuf> {
        tracing::trace!(id, "falling back to host resolution");
        match self.host.resolve(id, caller) {
            Ok(path) => Ok(path),
            Err(e) if e.is_not_found() && ModuleIdKind::of(id) != ModuleIdKind::Relative => {
                let sibling = caller
                    .and_then(ModuleLocation::base_dir)
                    .map(|base| base.join(format!("{}.js", id)))
                    .filter(|path| path.is_file());
                match sibling {
                    Some(sibling) => {
                        tracing::debug!(id, path = %sibling.display(), "retrying with sibling script");
                        self.host.resolve(&sibling.to_string_lossy(), caller)
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load a resolved file with the handler for its extension. Files with
    /// unregistered extensions are compiled as scripts.
    fn load_file(&self, id: &str, path: &Path, caller: Option<&ModuleLocation>) -> Result<Value> {
        let request = LoadRequest { id, path, caller };
        match self.extensions.for_path(path) {
            Some(handler) => handler.load(self, &request),
            None => ScriptHandler.load(self, &request),
        }
    }

    /// The `require` function bound for a module at `location`
    pub(crate) fn require_function(&self, location: Option<ModuleLocation>) -> Value {
        let this = self.this.clone();
        let caller = location.clone();
        let require = Callable::native("require", move |args| {
            let resolver = upgrade(&this)?;
            resolver.require(&id_argument(args)?, caller.as_ref())
        });

        let this = self.this.clone();
        require.properties().set(
            "resolve",
            Value::function("resolve", move |args| {
                let resolver = upgrade(&this)?;
                let id = id_argument(args)?;
                match resolver.resolve(&id, location.as_ref())? {
                    Resolved::Native(_) => Ok(Value::String(id)),
                    Resolved::File(path) => Ok(Value::String(path.display().to_string())),
                }
            }),
        );

        Value::Function(Arc::new(require))
    }
}

fn upgrade(this: &Weak<ModuleResolver>) -> Result<Arc<ModuleResolver>> {
    this.upgrade()
        .ok_or_else(|| NodeError::Generic("module resolver is no longer alive".to_string()))
}

fn id_argument(args: &[Value]) -> Result<String> {
    match args.first() {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::String(_)) => Err(NodeError::type_error(
            "The argument 'id' must be a non-empty string",
        )),
        other => Err(NodeError::type_error(format!(
            "The \"id\" argument must be of type string. Received {}",
            other.map_or("undefined", Value::type_of)
        ))),
    }
}
