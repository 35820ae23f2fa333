// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS module system
//!
//! - `require()` resolution following Node.js conventions
//! - `require.extensions`-style per-extension loaders
//! - `module.exports` / `exports`
//! - A process-wide module cache keyed by canonical URI
//! - Synchronous, re-entrant loading

mod cache;
mod extensions;
mod host;
mod loader;
mod package;
mod resolver;

pub use cache::{ModuleCache, ModuleRecord};
pub use extensions::{
    ExtensionHandler, ExtensionHandlerTable, LoadRequest, ScriptHandler, UnimplementedHandler,
};
pub use host::{HostResolution, ModulePathResolution, ModuleSandbox};
pub use loader::ExecHooks;
pub use package::{DEFAULT_MAIN, PACKAGE_DESCRIPTOR, PackageDescriptor, find_module_root};
pub use resolver::{ModuleIdKind, ModuleResolver, Resolved};
