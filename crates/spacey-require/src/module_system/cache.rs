// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module cache for require()

use crate::engine::{ModuleLocation, Value};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use url::Url;

/// One loaded module
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    /// The id the module was first required with
    pub id: String,
    /// Canonical URI and base directory
    pub location: ModuleLocation,
    /// The module's exports, fixed once published
    pub exports: Value,
}

impl ModuleRecord {
    /// Canonical URI of the module
    pub fn uri(&self) -> &Url {
        self.location.uri()
    }
}

/// Append-only cache of loaded modules, keyed by canonical URI.
///
/// Records are only published after their module body ran to completion,
/// and are never replaced or evicted.
pub struct ModuleCache {
    cache: DashMap<Url, ModuleRecord>,
}

impl ModuleCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Get a cached module by URI
    pub fn get(&self, uri: &Url) -> Option<ModuleRecord> {
        self.cache.get(uri).map(|entry| entry.clone())
    }

    /// Check if a module is cached
    pub fn has(&self, uri: &Url) -> bool {
        self.cache.contains_key(uri)
    }

    /// Publish a record. If the URI is already cached the existing record
    /// wins and is returned instead.
    pub fn publish(&self, record: ModuleRecord) -> ModuleRecord {
        match self.cache.entry(record.uri().clone()) {
            Entry::Occupied(existing) => {
                tracing::warn!(uri = %record.uri(), "module already cached; keeping first record");
                existing.get().clone()
            }
            Entry::Vacant(slot) => slot.insert(record).clone(),
        }
    }

    /// Get all cached module URIs
    pub fn keys(&self) -> Vec<Url> {
        self.cache.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Get the number of cached modules
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for ModuleCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::JsObject;

    fn record(path: &str, exports: Value) -> ModuleRecord {
        let uri = Url::parse(&format!("file://{}", path)).unwrap();
        let base = uri.join("./").unwrap();
        ModuleRecord {
            id: path.to_string(),
            location: ModuleLocation::new(uri, base),
            exports,
        }
    }

    #[test]
    fn test_publish_and_get() {
        let cache = ModuleCache::new();
        let exports = Value::Object(JsObject::new());
        let published = cache.publish(record("/app/a.js", exports.clone()));

        assert_eq!(published.exports, exports);
        let uri = Url::parse("file:///app/a.js").unwrap();
        assert!(cache.has(&uri));
        assert_eq!(cache.get(&uri).unwrap().exports, exports);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_record_wins() {
        let cache = ModuleCache::new();
        let first = Value::Object(JsObject::new());
        let second = Value::Object(JsObject::new());
        cache.publish(record("/app/a.js", first.clone()));

        let kept = cache.publish(record("/app/a.js", second));
        assert_eq!(kept.exports, first);
        assert_eq!(cache.len(), 1);
    }
}
