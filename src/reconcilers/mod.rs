// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that keep a Service and its ServiceCache in step.
//!
//! Each pass takes only an [`ObjectKey`], reads both objects and recomputes
//! what should exist. One side changing wakes the other side's reconciler,
//! which then finds nothing left to do.

pub mod service;
pub mod service_cache;

pub use service::ServiceReconciler;
pub use service_cache::ServiceCacheReconciler;

use crate::config::Config;
use crate::constants::requeue;
use crate::error::ServiceCacheError;
use crate::kubernetes::ObjectKey;
use futures::{Stream, StreamExt};
use k8s_openapi::NamespaceResourceScope;
use kube::{
    runtime::{controller::Action, WatchStreamExt},
    Api, Client, Resource,
};
use kube_runtime::watcher::{self, Config as WatcherConfig};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{error, warn};

/// What a single reconcile pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to manage for this key
    Skipped,
    /// Both sides already agree
    InSync,
    ServiceCacheCreated,
    ServiceCacheUpdated,
    ServiceCacheDeleted,
    ServiceUpdated,
    /// Cache annotations removed from the Service
    ServiceCleaned,
}

/// State shared with the kube-runtime controller callbacks
pub struct Context<R> {
    pub reconciler: R,
    pub config: Config,
}

pub(crate) fn scoped_api<K>(client: Client, config: &Config) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    match config.watch_namespace.as_deref() {
        Some(namespace) => Api::namespaced(client, namespace),
        None => Api::all(client),
    }
}

/// Keys of objects that were deleted.
///
/// `Controller` never calls a reconciler for an object that is gone, so the
/// cleanup branches are driven from this stream instead.
pub(crate) fn deleted_keys<K>(api: Api<K>) -> impl Stream<Item = ObjectKey>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + 'static,
{
    watcher::watcher(api, WatcherConfig::default())
        .default_backoff()
        .filter_map(|event| async move {
            match event {
                Ok(watcher::Event::Delete(obj)) => ObjectKey::from_resource(&obj).ok(),
                Ok(_) => None,
                Err(e) => {
                    warn!("Deletion watcher error: {}", e);
                    None
                }
            }
        })
}

pub(crate) fn requeue_action(error: &ServiceCacheError, config: &Config) -> Action {
    if error.is_conflict() {
        warn!("Reconciliation conflict, retrying: {}", error);
        return Action::requeue(Duration::from_secs(requeue::CONFLICT_SECS));
    }
    error!("Reconciliation error: {}", error);
    Action::requeue(config.error_requeue)
}
