// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-require
//!
//! A Node.js-compatible `require()` for embedded JavaScript engines.
//!
//! The crate owns module resolution and loading; the engine itself sits
//! behind the [`ScriptEngine`](engine::ScriptEngine) trait. It provides:
//!
//! - CommonJS resolution (relative paths, package directories,
//!   `node_modules`, configured module paths and bundled modules)
//! - A per-location module cache with stable exports identity
//! - Native modules (`process`, `fs`, `child_process`, `vm`, `timers`)
//! - A timer callback queue and ordered exit handlers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spacey_require::{NodeRuntime, RequireConfig};
//! use std::sync::Arc;
//!
//! fn main() -> spacey_require::Result<()> {
//!     let runtime = NodeRuntime::new(Arc::new(MyEngine::new()), RequireConfig::from_process_env())?;
//!     let code = runtime.run_file(std::path::Path::new("server.js"))?;
//!     std::process::exit(code);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod globals;
pub mod module_system;
pub mod modules;
pub mod runtime;

// Re-exports
pub use config::RequireConfig;
pub use engine::{JsObject, ModuleLocation, Scope, ScriptEngine, Value};
pub use error::{NodeError, Result};
pub use module_system::ModuleResolver;
pub use runtime::NodeRuntime;

/// Version of the spacey-require crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Node.js API version compatibility target
pub const NODE_API_VERSION: &str = "20.0.0";
