// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Conversion between Service annotations and cache configuration.
//!
//! Reading and writing are kept apart: [`decode`] and [`encode`] are pure, and
//! only [`AnnotationPatch::apply`] mutates an annotation map.

use crate::constants::annotations as keys;
use std::collections::BTreeMap;

pub type Annotations = BTreeMap<String, String>;

/// Cache configuration as carried by either side of the pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    pub cacheable_by_default: bool,
    /// `None` when no URL list was given at all
    pub urls: Option<Vec<String>>,
}

/// Pending annotation changes: `Some` sets a key, `None` removes it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationPatch {
    entries: BTreeMap<String, Option<String>>,
}

impl AnnotationPatch {
    pub fn set(mut self, key: &str, value: String) -> Self {
        self.entries.insert(key.to_string(), Some(value));
        self
    }

    pub fn remove(mut self, key: &str) -> Self {
        self.entries.insert(key.to_string(), None);
        self
    }

    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries.get(key).map(|v| v.as_deref())
    }

    /// Apply the patch, returning whether anything changed
    pub fn apply(&self, target: &mut Option<Annotations>) -> bool {
        let mut changed = false;
        for (key, value) in &self.entries {
            match value {
                Some(value) => {
                    let map = target.get_or_insert_with(BTreeMap::new);
                    if map.get(key) != Some(value) {
                        map.insert(key.clone(), value.clone());
                        changed = true;
                    }
                }
                None => {
                    if let Some(map) = target.as_mut() {
                        changed |= map.remove(key).is_some();
                    }
                }
            }
        }
        changed
    }
}

/// Whether any annotation carries the service-cache prefix
pub fn is_annotated(annotations: Option<&Annotations>) -> bool {
    annotations.is_some_and(|a| a.keys().any(|k| k.starts_with(keys::PREFIX)))
}

pub fn decode(annotations: Option<&Annotations>) -> CacheConfig {
    let cacheable_by_default = annotations
        .and_then(|a| a.get(keys::DEFAULT))
        .is_some_and(|v| v == "true");

    let urls = annotations
        .and_then(|a| a.get(keys::URLS))
        .map(|raw| decode_urls(raw.as_str()));

    CacheConfig {
        cacheable_by_default,
        urls,
    }
}

/// Parse "[a,b]" into its elements. Elements are kept verbatim; a list with
/// nothing between the brackets is empty rather than a single empty string.
pub fn decode_urls(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    if inner.is_empty() {
        return Vec::new();
    }

    inner.split(',').map(str::to_string).collect()
}

pub fn encode_urls(urls: &[String]) -> String {
    format!("[{}]", urls.join(","))
}

/// Annotation changes that make a Service carry `config`.
///
/// A config without a URL list leaves the URLs annotation untouched.
pub fn encode(config: &CacheConfig) -> AnnotationPatch {
    let patch =
        AnnotationPatch::default().set(keys::DEFAULT, config.cacheable_by_default.to_string());

    match &config.urls {
        Some(urls) => patch.set(keys::URLS, encode_urls(urls)),
        None => patch,
    }
}

/// Annotation changes that drop both cache keys
pub fn strip() -> AnnotationPatch {
    AnnotationPatch::default()
        .remove(keys::DEFAULT)
        .remove(keys::URLS)
}
