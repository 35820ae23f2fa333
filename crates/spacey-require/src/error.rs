// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for module resolution and loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type for require() operations
pub type Result<T> = std::result::Result<T, NodeError>;

/// Errors that can occur while resolving or loading modules
#[derive(Debug, Error)]
pub enum NodeError {
    /// Module not found by any resolution strategy
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// A registered extension handler has no implementation
    #[error("Loading '{0}' files is not implemented")]
    NotImplementedExtension(String),

    /// A package.json exists but could not be read or parsed
    #[error("Malformed package descriptor {path}: {reason}")]
    MalformedPackageDescriptor {
        /// Path of the descriptor
        path: PathBuf,
        /// Reason for failure
        reason: String,
    },

    /// The script engine failed to compile or run a module
    #[error("{location}: {message}")]
    Script {
        /// Source location (usually the file path)
        location: String,
        /// Engine-provided message
        message: String,
    },

    /// Circular dependency detected
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    /// Sandboxed resolution tried to leave the module roots
    #[error("Module '{0}' is outside of the sandboxed module paths")]
    SandboxViolation(String),

    /// Two native modules share an id
    #[error("Native module '{0}' is registered twice")]
    DuplicateNativeModule(String),

    /// One or more exit handlers failed
    #[error("{} exit handler(s) failed: {}", .0.len(), .0.join("; "))]
    ExitHandlers(Vec<String>),

    /// File system error
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// Path error
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    /// Type error (wrong argument type)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Process error
    #[error("Process error: {0}")]
    Process(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

impl NodeError {
    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound(module.into())
    }

    /// Create a script execution error
    pub fn script(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Script {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Whether this error means "nothing was found" rather than "found but broken"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModuleNotFound(_))
    }
}
