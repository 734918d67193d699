// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ServiceCache reconciler - writes ServiceCache specs back onto Services.

use crate::config::Config;
use crate::error::{Result, ServiceCacheError};
use crate::kubernetes::{remove_owner, set_controller_owner, KubeStore, ObjectKey, ObjectStore};
use crate::reconcilers::{deleted_keys, requeue_action, scoped_api, Context, Outcome};
use crate::sync::{encode, in_sync, strip};
use crate::types::ServiceCache;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Service;
use kube::{
    runtime::{controller::Action, reflector::ObjectRef, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Decides whether a ServiceCache may be mirrored; rejected ones are deleted
pub type Validator = fn(&ServiceCache) -> bool;

pub fn accept_all(_cache: &ServiceCache) -> bool {
    true
}

pub struct ServiceCacheReconciler<S> {
    store: S,
    validate: Validator,
}

impl<S: ObjectStore> ServiceCacheReconciler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            validate: accept_all,
        }
    }

    pub fn with_validator(mut self, validate: Validator) -> Self {
        self.validate = validate;
        self
    }

    /// One pass for the ServiceCache named by `key`
    #[instrument(skip(self), fields(namespace = %key.namespace, name = %key.name))]
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<Outcome> {
        debug!("Reconciling ServiceCache");

        let Some(cache) = self.store.get_service_cache(key).await? else {
            return self.strip_service(key).await;
        };

        if !(self.validate)(&cache) {
            warn!("ServiceCache failed validation, deleting it");
            self.release_service(key).await?;
            self.store.delete_service_cache(&cache).await?;
            return Ok(Outcome::ServiceCacheDeleted);
        }

        let Some(mut service) = self.store.get_service(key).await? else {
            self.store.delete_service_cache(&cache).await?;
            info!("No Service with the same name, deleted orphaned ServiceCache");
            return Ok(Outcome::ServiceCacheDeleted);
        };

        if in_sync(&service, &cache) {
            debug!("Service and ServiceCache already agree");
            return Ok(Outcome::InSync);
        }

        encode(&cache.spec.config()).apply(&mut service.metadata.annotations);
        set_controller_owner(&cache, &mut service.metadata)?;
        self.store.update_service(&service).await?;

        info!(
            cacheable_by_default = cache.spec.cacheable_by_default,
            urls = ?cache.spec.urls,
            "Service annotations updated from ServiceCache"
        );
        Ok(Outcome::ServiceUpdated)
    }

    /// Remove the Service's owner reference to the ServiceCache about to be deleted
    async fn release_service(&self, key: &ObjectKey) -> Result<()> {
        let Some(mut service) = self.store.get_service(key).await? else {
            return Ok(());
        };

        if remove_owner::<ServiceCache>(&key.name, &mut service.metadata) {
            self.store.update_service(&service).await?;
            debug!("Released Service from its ServiceCache owner");
        }
        Ok(())
    }

    /// The ServiceCache is gone: drop the cache annotations it was mirroring
    /// along with any owner reference still pointing at it
    async fn strip_service(&self, key: &ObjectKey) -> Result<Outcome> {
        let Some(mut service) = self.store.get_service(key).await? else {
            debug!("Neither ServiceCache nor Service exists");
            return Ok(Outcome::Skipped);
        };

        let stripped = strip().apply(&mut service.metadata.annotations);
        let released = remove_owner::<ServiceCache>(&key.name, &mut service.metadata);
        if !stripped && !released {
            debug!("Service carries no cache annotations");
            return Ok(Outcome::Skipped);
        }

        self.store.update_service(&service).await?;
        info!("ServiceCache removed, stripped cache annotations from Service");
        Ok(Outcome::ServiceCleaned)
    }
}

/// Run the ServiceCache controller until its watches end
pub async fn run(client: Client, config: Config) -> anyhow::Result<()> {
    let caches: Api<ServiceCache> = scoped_api(client.clone(), &config);
    let services: Api<Service> = scoped_api(client.clone(), &config);

    let context = Arc::new(Context {
        reconciler: ServiceCacheReconciler::new(KubeStore::new(client)),
        config,
    });

    let deletions = deleted_keys(caches.clone()).for_each(|key| {
        let context = context.clone();
        async move {
            if let Err(e) = context.reconciler.reconcile(&key).await {
                warn!("Cleanup after ServiceCache {} deletion failed: {}", key, e);
            }
        }
    });

    let controller = Controller::new(caches, WatcherConfig::default())
        .watches(services, WatcherConfig::default(), |service| {
            service
                .namespace()
                .map(|ns| ObjectRef::new(&service.name_any()).within(&ns))
        })
        .run(reconcile, error_policy, context.clone())
        .for_each(|res| async move {
            match res {
                Ok(o) => debug!("Reconciled service cache: {:?}", o),
                Err(e) => warn!("Reconciliation error: {:?}", e),
            }
        });

    futures::join!(controller, deletions);
    Ok(())
}

async fn reconcile(
    cache: Arc<ServiceCache>,
    ctx: Arc<Context<ServiceCacheReconciler<KubeStore>>>,
) -> Result<Action> {
    let key = ObjectKey::from_resource(cache.as_ref())?;
    let outcome = ctx.reconciler.reconcile(&key).await?;
    debug!("ServiceCache {} pass finished: {:?}", key, outcome);
    Ok(Action::await_change())
}

fn error_policy(
    _cache: Arc<ServiceCache>,
    error: &ServiceCacheError,
    ctx: Arc<Context<ServiceCacheReconciler<KubeStore>>>,
) -> Action {
    requeue_action(error, &ctx.config)
}
