// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Object access used by the reconcilers.
//!
//! Reconcilers only talk to the cluster through [`ObjectStore`], so every pass
//! can be driven against an in-memory store in tests. [`KubeStore`] is the
//! API server backed implementation.

use crate::constants::OPERATOR_NAME;
use crate::error::{Result, ServiceCacheError};
use crate::types::ServiceCache;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{DeleteParams, PostParams, Preconditions},
    Api, Client, Resource, ResourceExt,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tracing::{debug, instrument};

/// Namespace and name shared by a Service and its ServiceCache
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn from_resource<K: Resource>(obj: &K) -> Result<Self> {
        let meta = obj.meta();
        match (meta.namespace.as_ref(), meta.name.as_ref()) {
            (Some(namespace), Some(name)) => Ok(Self::new(namespace, name)),
            _ => Err(ServiceCacheError::MissingObjectKey(format!(
                "{}/{}",
                meta.namespace.as_deref().unwrap_or("<none>"),
                meta.name.as_deref().unwrap_or("<none>")
            ))),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Reads return `Ok(None)` for objects that do not exist; deletes of missing
/// objects succeed. Updates carry the read resourceVersion and fail with
/// [`ServiceCacheError::Conflict`] when it is stale.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_service(&self, key: &ObjectKey) -> Result<Option<Service>>;

    async fn update_service(&self, service: &Service) -> Result<Service>;

    async fn get_service_cache(&self, key: &ObjectKey) -> Result<Option<ServiceCache>>;

    async fn create_service_cache(&self, cache: &ServiceCache) -> Result<ServiceCache>;

    async fn update_service_cache(&self, cache: &ServiceCache) -> Result<ServiceCache>;

    async fn delete_service_cache(&self, cache: &ServiceCache) -> Result<()>;
}

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn get<K>(&self, key: &ObjectKey) -> Result<Option<K>>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + fmt::Debug,
        <K as Resource>::DynamicType: Default,
    {
        let found = self.api::<K>(&key.namespace).get_opt(&key.name).await?;
        if found.is_none() {
            debug!("{} {} not found", K::kind(&Default::default()), key);
        }
        Ok(found)
    }

    async fn create<K>(&self, obj: &K) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + fmt::Debug,
        <K as Resource>::DynamicType: Default,
    {
        let key = ObjectKey::from_resource(obj)?;
        self.api::<K>(&key.namespace)
            .create(&post_params(), obj)
            .await
            .map_err(|e| conflict_or(e, &key))
    }

    async fn replace<K>(&self, obj: &K) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + fmt::Debug,
        <K as Resource>::DynamicType: Default,
    {
        let key = ObjectKey::from_resource(obj)?;
        self.api::<K>(&key.namespace)
            .replace(&key.name, &post_params(), obj)
            .await
            .map_err(|e| conflict_or(e, &key))
    }
}

fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    }
}

/// Map HTTP 409 to a conflict so the pass is retried with fresh reads
fn conflict_or(err: kube::Error, key: &ObjectKey) -> ServiceCacheError {
    match err {
        kube::Error::Api(resp) if resp.code == 409 => {
            ServiceCacheError::Conflict(format!("{}: {}", key, resp.message))
        }
        other => other.into(),
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    #[instrument(skip(self))]
    async fn get_service(&self, key: &ObjectKey) -> Result<Option<Service>> {
        self.get(key).await
    }

    #[instrument(skip(self, service), fields(service = %service.name_any()))]
    async fn update_service(&self, service: &Service) -> Result<Service> {
        self.replace(service).await
    }

    #[instrument(skip(self))]
    async fn get_service_cache(&self, key: &ObjectKey) -> Result<Option<ServiceCache>> {
        self.get(key).await
    }

    #[instrument(skip(self, cache), fields(service_cache = %cache.name_any()))]
    async fn create_service_cache(&self, cache: &ServiceCache) -> Result<ServiceCache> {
        self.create(cache).await
    }

    #[instrument(skip(self, cache), fields(service_cache = %cache.name_any()))]
    async fn update_service_cache(&self, cache: &ServiceCache) -> Result<ServiceCache> {
        self.replace(cache).await
    }

    #[instrument(skip(self, cache), fields(service_cache = %cache.name_any()))]
    async fn delete_service_cache(&self, cache: &ServiceCache) -> Result<()> {
        let key = ObjectKey::from_resource(cache)?;
        // Only delete the object we read, not a newer one with the same name
        let dp = DeleteParams {
            preconditions: cache.uid().map(|uid| Preconditions {
                uid: Some(uid),
                resource_version: None,
            }),
            ..Default::default()
        };

        match self.api::<ServiceCache>(&key.namespace).delete(&key.name, &dp).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("ServiceCache {} already gone", key);
                Ok(())
            }
            Err(e) => Err(conflict_or(e, &key)),
        }
    }
}
