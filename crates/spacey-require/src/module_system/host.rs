// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Fallback resolution provided by the embedding host
//!
//! When none of the Node.js-style strategies find a module, the resolver
//! hands the id to a [`HostResolution`]. Its errors are propagated to the
//! caller of `require()` unchanged.

use crate::config::RequireConfig;
use crate::engine::ModuleLocation;
use crate::error::{NodeError, Result};
use crate::module_system::package::{PACKAGE_DESCRIPTOR, PackageDescriptor};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The host's own module resolution strategy
pub trait HostResolution: Send + Sync {
    /// Resolve `id` to a file, or fail
    fn resolve(&self, id: &str, caller: Option<&ModuleLocation>) -> Result<PathBuf>;
}

/// A root directory searched by [`ModulePathResolution`]
#[derive(Debug, Clone)]
struct ModuleRoot {
    /// Bundled module-set name, for roots from the bundled table
    name: Option<String>,
    dir: PathBuf,
}

/// Resolution against a list of module roots.
///
/// Roots come from the configured module paths and the bundled-module
/// table (module-set name -> extracted location). Every candidate is tried
/// as `candidate.js` first, then as the literal path.
#[derive(Debug, Clone)]
pub struct ModulePathResolution {
    roots: Vec<ModuleRoot>,
    sandboxed: bool,
}

impl ModulePathResolution {
    /// Build from module paths and a bundled-module table. Bundled roots are
    /// searched before plain module paths.
    pub fn new(
        module_paths: &[PathBuf],
        bundled: &BTreeMap<String, PathBuf>,
        sandboxed: bool,
    ) -> Self {
        let bundled_roots = bundled.iter().map(|(name, dir)| ModuleRoot {
            name: Some(name.clone()),
            dir: canonical(dir),
        });
        let path_roots = module_paths.iter().map(|dir| ModuleRoot {
            name: None,
            dir: canonical(dir),
        });
        Self {
            roots: bundled_roots.chain(path_roots).collect(),
            sandboxed,
        }
    }

    /// Build from a [`RequireConfig`]
    pub fn from_config(config: &RequireConfig) -> Self {
        Self::new(&config.module_paths, &config.bundled_modules, config.sandboxed)
    }

    /// Root directories, in search order
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(|root| root.dir.as_path())
    }

    /// Whether resolution is confined to the roots
    pub fn is_sandboxed(&self) -> bool {
        self.sandboxed
    }

    fn candidates(&self, id: &str, caller: Option<&ModuleLocation>) -> Result<Vec<PathBuf>> {
        if Path::new(id).is_absolute() {
            return Ok(vec![PathBuf::from(id)]);
        }

        let relative = id.starts_with("./") || id.starts_with("../");
        if relative {
            if let Some(base) = caller.and_then(ModuleLocation::base_dir) {
                return Ok(vec![base.join(id)]);
            }
        }

        let mut candidates = Vec::new();
        if !relative {
            let (head, rest) = match id.split_once('/') {
                Some((head, rest)) => (head, Some(rest)),
                None => (id, None),
            };
            for root in self.roots.iter().filter(|r| r.name.as_deref() == Some(head)) {
                match rest {
                    Some(rest) => candidates.push(root.dir.join(rest)),
                    None => candidates.push(package_entry(&root.dir)?),
                }
            }
        }
        candidates.extend(self.roots.iter().map(|root| root.dir.join(id)));
        Ok(candidates)
    }

    fn inside_roots(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(&root.dir))
    }
}

impl HostResolution for ModulePathResolution {
    fn resolve(&self, id: &str, caller: Option<&ModuleLocation>) -> Result<PathBuf> {
        let mut escaped = false;
        for candidate in self.candidates(id, caller)? {
            let Some(found) = try_file(&candidate) else {
                continue;
            };
            if self.sandboxed && !self.inside_roots(&found) {
                tracing::debug!(id, path = %found.display(), "rejected outside sandbox");
                escaped = true;
                continue;
            }
            tracing::trace!(id, path = %found.display(), "host resolution");
            return Ok(found);
        }

        if escaped {
            Err(NodeError::SandboxViolation(id.to_string()))
        } else {
            Err(NodeError::module_not_found(id))
        }
    }
}

/// Entry file of a bundled module set's root directory
fn package_entry(dir: &Path) -> Result<PathBuf> {
    let descriptor = dir.join(PACKAGE_DESCRIPTOR);
    if descriptor.is_file() {
        let package = PackageDescriptor::read(&descriptor)?;
        return Ok(dir.join(package.main_or_default()));
    }
    Ok(dir.join("index"))
}

fn try_file(candidate: &Path) -> Option<PathBuf> {
    let mut with_js = candidate.as_os_str().to_owned();
    with_js.push(".js");
    [PathBuf::from(with_js), candidate.to_path_buf()]
        .into_iter()
        .find(|path| path.is_file())
        .map(|path| canonical(&path))
}

/// Directories a sandboxed resolver may load from: the working directory,
/// the module paths and the bundled module sets.
#[derive(Debug, Clone)]
pub struct ModuleSandbox {
    roots: Vec<PathBuf>,
}

impl ModuleSandbox {
    /// Sandbox for `config`, or `None` when it is not sandboxed
    pub fn from_config(config: &RequireConfig) -> Option<Self> {
        if !config.sandboxed {
            return None;
        }
        let roots = std::iter::once(config.resolved_working_dir())
            .chain(config.module_paths.iter().cloned())
            .chain(config.bundled_modules.values().cloned())
            .map(|dir| canonical(&dir))
            .collect();
        Some(Self { roots })
    }

    /// Allowed root directories
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    /// Fail with [`NodeError::SandboxViolation`] unless `path` lies under
    /// one of the roots
    pub fn check(&self, id: &str, path: &Path) -> Result<()> {
        let path = canonical(path);
        if self.roots.iter().any(|root| path.starts_with(root)) {
            Ok(())
        } else {
            tracing::debug!(id, path = %path.display(), "rejected outside sandbox");
            Err(NodeError::SandboxViolation(id.to_string()))
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
