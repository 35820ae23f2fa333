// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Configuration for the module system.

use crate::error::{NodeError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Environment variable that turns on the unimplemented-extension escape hatch
pub const IGNORE_UNIMPLEMENTED_EXTENSIONS_VAR: &str = "SPACEY_IGNORE_UNIMPLEMENTED_EXTENSIONS";

/// Configuration for a [`ModuleResolver`](crate::ModuleResolver).
///
/// Read once at construction; nothing here is consulted from the
/// environment at `require()` time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequireConfig {
    /// Return an empty exports object for `.json` / `.node` files instead
    /// of failing
    pub ignore_unimplemented_extensions: bool,

    /// Restrict fallback resolution to the module paths
    pub sandboxed: bool,

    /// Extra roots searched by the fallback resolution
    pub module_paths: Vec<PathBuf>,

    /// Bundled module sets (name -> extracted location)
    pub bundled_modules: BTreeMap<String, PathBuf>,

    /// Directory top-level requires resolve against (defaults to the
    /// process working directory)
    pub working_dir: Option<PathBuf>,

    /// Script run in every module scope before the module body
    pub pre_exec: Option<String>,

    /// Script run in every module scope after the module body
    pub post_exec: Option<String>,

    /// `process.argv` after the executable name
    pub argv: Vec<String>,

    /// `process.env`
    pub env: BTreeMap<String, String>,
}

impl RequireConfig {
    /// Build a config from an environment map. The environment becomes
    /// `process.env` and sets the escape-hatch flag.
    pub fn from_env<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let ignore_unimplemented_extensions = env
            .get(IGNORE_UNIMPLEMENTED_EXTENSIONS_VAR)
            .is_some_and(|v| is_truthy(v));

        Self {
            ignore_unimplemented_extensions,
            env,
            ..Self::default()
        }
    }

    /// Build a config from the current process environment
    pub fn from_process_env() -> Self {
        Self::from_env(std::env::vars())
    }

    /// Parse a JSON configuration document
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source)
            .map_err(|e| NodeError::Generic(format!("Invalid require configuration: {}", e)))
    }

    /// The working directory, falling back to the process one
    pub fn resolved_working_dir(&self) -> PathBuf {
        self.working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim(), "" | "0" | "false")
}
