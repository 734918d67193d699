// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The equality check both reconcilers use to decide whether to write.

use crate::sync::annotations::{decode, CacheConfig};
use crate::types::ServiceCache;
use k8s_openapi::api::core::v1::Service;

/// Compare two configurations, either of which may belong to a missing object.
///
/// URL lists are compared as sets: both are sorted (on copies) and joined.
/// A missing URL list compares equal to an empty one.
pub fn configs_equal(primary: Option<&CacheConfig>, companion: Option<&CacheConfig>) -> bool {
    match (primary, companion) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.cacheable_by_default.to_string() == b.cacheable_by_default.to_string()
                && canonical_urls(a.urls.as_deref()) == canonical_urls(b.urls.as_deref())
        }
        _ => false,
    }
}

fn canonical_urls(urls: Option<&[String]>) -> String {
    let mut sorted = urls.map(<[String]>::to_vec).unwrap_or_default();
    sorted.sort();
    sorted.join(",")
}

/// Whether the Service's annotations and the ServiceCache's spec agree
pub fn in_sync(service: &Service, cache: &ServiceCache) -> bool {
    let from_service = decode(service.metadata.annotations.as_ref());
    configs_equal(Some(&from_service), Some(&cache.spec.config()))
}
