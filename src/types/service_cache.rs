// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::sync::CacheConfig;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Structured mirror of a Service's cache annotations.
///
/// The field names on the wire are the annotation keys themselves, so a
/// ServiceCache reads the same way as the Service it mirrors.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(
    group = "service-cache.github.io",
    version = "v1alpha1",
    kind = "ServiceCache",
    shortname = "sc"
)]
#[kube(namespaced)]
#[kube(status = "ServiceCacheStatus")]
pub struct ServiceCacheSpec {
    #[serde(rename = "service-cache.github.io/default", default)]
    pub cacheable_by_default: bool,
    #[serde(
        rename = "service-cache.github.io/URLs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub urls: Option<Vec<String>>,
}

impl ServiceCacheSpec {
    pub fn config(&self) -> CacheConfig {
        CacheConfig {
            cacheable_by_default: self.cacheable_by_default,
            urls: self.urls.clone(),
        }
    }
}

impl From<CacheConfig> for ServiceCacheSpec {
    fn from(config: CacheConfig) -> Self {
        Self {
            cacheable_by_default: config.cacheable_by_default,
            urls: config.urls,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct ServiceCacheStatus {}
