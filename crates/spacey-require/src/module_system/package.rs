// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! package.json handling and module-root discovery

use crate::error::{NodeError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the package descriptor
pub const PACKAGE_DESCRIPTOR: &str = "package.json";

/// Entry point used when a package declares no `main`
pub const DEFAULT_MAIN: &str = "index.js";

/// The parts of package.json the resolver cares about
#[derive(Debug, Default, Deserialize)]
pub struct PackageDescriptor {
    /// Entry point, relative to the package directory
    pub main: Option<String>,
}

impl PackageDescriptor {
    /// Read and parse a descriptor. A file that exists but cannot be read
    /// or parsed is an error, never "no descriptor".
    pub fn read(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::MalformedPackageDescriptor {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        serde_json::from_str(&content).map_err(|e| NodeError::MalformedPackageDescriptor {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// `main`, or `index.js` when absent
    pub fn main_or_default(&self) -> &str {
        self.main.as_deref().unwrap_or(DEFAULT_MAIN)
    }
}

/// Walk from `start` up through its ancestors and return the first
/// directory (inclusive) that contains exactly one package descriptor.
pub fn find_module_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| count_descriptors(dir) == 1)
        .map(Path::to_path_buf)
}

fn count_descriptors(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() == PACKAGE_DESCRIPTOR)
            .count(),
        Err(e) => {
            tracing::trace!(dir = %dir.display(), error = %e, "cannot list directory");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_module_root_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("a");
        let deep = root.join("b").join("c");
        fs::create_dir_all(&deep).unwrap();
        fs::write(root.join(PACKAGE_DESCRIPTOR), "{}").unwrap();

        assert_eq!(find_module_root(&deep), Some(root.clone()));
        assert_eq!(find_module_root(&root), Some(root));
    }

    #[test]
    fn test_find_module_root_none() {
        let tmp = tempfile::tempdir().unwrap();
        let deep = tmp.path().join("x").join("y");
        fs::create_dir_all(&deep).unwrap();

        let found = find_module_root(&deep);
        // Nothing inside the temp dir qualifies; anything found lies above it.
        assert!(found.map_or(true, |dir| !dir.starts_with(tmp.path())));
    }

    #[test]
    fn test_descriptor_main() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(PACKAGE_DESCRIPTOR);

        fs::write(&path, r#"{"name": "foo", "main": "lib.js", "version": "1.0.0"}"#).unwrap();
        assert_eq!(PackageDescriptor::read(&path).unwrap().main_or_default(), "lib.js");

        fs::write(&path, r#"{"name": "foo"}"#).unwrap();
        assert_eq!(PackageDescriptor::read(&path).unwrap().main_or_default(), DEFAULT_MAIN);
    }

    #[test]
    fn test_malformed_descriptor() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(PACKAGE_DESCRIPTOR);
        fs::write(&path, "{ main: ").unwrap();

        assert!(matches!(
            PackageDescriptor::read(&path),
            Err(NodeError::MalformedPackageDescriptor { .. })
        ));

        fs::write(&path, r#"{"main": 42}"#).unwrap();
        assert!(PackageDescriptor::read(&path).is_err());
    }
}
