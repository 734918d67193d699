// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Service reconciler - mirrors annotated Services into ServiceCaches.

use crate::config::Config;
use crate::error::{Result, ServiceCacheError};
use crate::kubernetes::{remove_owner, set_controller_owner, KubeStore, ObjectKey, ObjectStore};
use crate::reconcilers::{deleted_keys, requeue_action, scoped_api, Context, Outcome};
use crate::sync::{decode, in_sync, is_annotated};
use crate::types::{ServiceCache, ServiceCacheSpec};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Service;
use kube::{
    runtime::{controller::Action, reflector::ObjectRef, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct ServiceReconciler<S> {
    store: S,
}

impl<S: ObjectStore> ServiceReconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// One pass for the Service named by `key`
    #[instrument(skip(self), fields(namespace = %key.namespace, name = %key.name))]
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<Outcome> {
        debug!("Reconciling Service");

        let Some(service) = self.store.get_service(key).await? else {
            return self
                .remove_service_cache(key, None, "Service no longer exists")
                .await;
        };

        if !is_annotated(service.metadata.annotations.as_ref()) {
            return self
                .remove_service_cache(key, Some(service), "Service has no service-cache annotations")
                .await;
        }

        let Some(mut cache) = self.store.get_service_cache(key).await? else {
            return self.create_service_cache(key, &service).await;
        };

        if in_sync(&service, &cache) {
            debug!("Service and ServiceCache already agree");
            return Ok(Outcome::InSync);
        }

        cache.spec = ServiceCacheSpec::from(decode(service.metadata.annotations.as_ref()));
        set_controller_owner(&service, &mut cache.metadata)?;
        self.store.update_service_cache(&cache).await?;

        info!(
            cacheable_by_default = cache.spec.cacheable_by_default,
            urls = ?cache.spec.urls,
            "ServiceCache updated from Service annotations"
        );
        Ok(Outcome::ServiceCacheUpdated)
    }

    async fn create_service_cache(&self, key: &ObjectKey, service: &Service) -> Result<Outcome> {
        let spec = ServiceCacheSpec::from(decode(service.metadata.annotations.as_ref()));
        let mut cache = ServiceCache::new(&key.name, spec);
        cache.metadata.namespace = Some(key.namespace.clone());
        set_controller_owner(service, &mut cache.metadata)?;

        self.store.create_service_cache(&cache).await?;

        info!(
            cacheable_by_default = cache.spec.cacheable_by_default,
            urls = ?cache.spec.urls,
            "ServiceCache created for annotated Service"
        );
        Ok(Outcome::ServiceCacheCreated)
    }

    /// Delete the ServiceCache, first releasing a surviving Service from it so
    /// garbage collection does not take the Service along.
    async fn remove_service_cache(
        &self,
        key: &ObjectKey,
        service: Option<Service>,
        reason: &str,
    ) -> Result<Outcome> {
        let Some(cache) = self.store.get_service_cache(key).await? else {
            debug!("{}, nothing to do", reason);
            return Ok(Outcome::Skipped);
        };

        if let Some(mut service) = service {
            if remove_owner::<ServiceCache>(&cache.name_any(), &mut service.metadata) {
                self.store.update_service(&service).await?;
                debug!("Released Service from its ServiceCache owner");
            }
        }

        self.store.delete_service_cache(&cache).await?;
        info!("{}, deleted its ServiceCache", reason);
        Ok(Outcome::ServiceCacheDeleted)
    }
}

/// Run the Service controller until its watches end
pub async fn run(client: Client, config: Config) -> anyhow::Result<()> {
    let services: Api<Service> = scoped_api(client.clone(), &config);
    let caches: Api<ServiceCache> = scoped_api(client.clone(), &config);

    let context = Arc::new(Context {
        reconciler: ServiceReconciler::new(KubeStore::new(client)),
        config,
    });

    let deletions = deleted_keys(services.clone()).for_each(|key| {
        let context = context.clone();
        async move {
            if let Err(e) = context.reconciler.reconcile(&key).await {
                warn!("Cleanup after Service {} deletion failed: {}", key, e);
            }
        }
    });

    // A ServiceCache always belongs to the Service with the same name
    let controller = Controller::new(services, WatcherConfig::default())
        .watches(caches, WatcherConfig::default(), |cache| {
            cache
                .namespace()
                .map(|ns| ObjectRef::new(&cache.name_any()).within(&ns))
        })
        .run(reconcile, error_policy, context.clone())
        .for_each(|res| async move {
            match res {
                Ok(o) => debug!("Reconciled service: {:?}", o),
                Err(e) => warn!("Reconciliation error: {:?}", e),
            }
        });

    futures::join!(controller, deletions);
    Ok(())
}

async fn reconcile(
    service: Arc<Service>,
    ctx: Arc<Context<ServiceReconciler<KubeStore>>>,
) -> Result<Action> {
    let key = ObjectKey::from_resource(service.as_ref())?;
    let outcome = ctx.reconciler.reconcile(&key).await?;
    debug!("Service {} pass finished: {:?}", key, outcome);
    Ok(Action::await_change())
}

fn error_policy(
    _service: Arc<Service>,
    error: &ServiceCacheError,
    ctx: Arc<Context<ServiceReconciler<KubeStore>>>,
) -> Action {
    requeue_action(error, &ctx.config)
}
