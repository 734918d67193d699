// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mocked Kubernetes HTTP API and an in-memory object store.

use crate::error::{Result, ServiceCacheError};
use crate::kubernetes::{ObjectKey, ObjectStore};
use crate::types::{ServiceCache, ServiceCacheSpec};
use async_trait::async_trait;
use http::{Request, Response};
use k8s_openapi::api::core::v1::Service;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service as TowerService;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl TowerService<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) = response.unwrap_or_else(|| {
                (
                    404,
                    r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"not found","reason":"NotFound","code":404}"#
                        .to_string(),
                )
            });
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock Service JSON response
pub fn service_json(namespace: &str, name: &str, annotations: &[(&str, &str)]) -> String {
    let annotations: BTreeMap<&str, &str> = annotations.iter().copied().collect();
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("svc-uid-{}", name),
            "resourceVersion": "1",
            "annotations": annotations
        },
        "spec": {}
    })
    .to_string()
}

/// Create a mock ServiceCache JSON response
pub fn service_cache_json(namespace: &str, name: &str, default: bool, urls: &[&str]) -> String {
    serde_json::json!({
        "apiVersion": "service-cache.github.io/v1alpha1",
        "kind": "ServiceCache",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("cache-uid-{}", name),
            "resourceVersion": "1"
        },
        "spec": {
            "service-cache.github.io/default": default,
            "service-cache.github.io/URLs": urls
        }
    })
    .to_string()
}

/// In-memory [`ObjectStore`] that behaves like the API server for the parts
/// the reconcilers rely on: uids, resourceVersions, optimistic concurrency.
///
/// Only writes made through the trait are counted; the seeding helpers stand
/// in for changes made by someone else.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    services: BTreeMap<ObjectKey, Service>,
    caches: BTreeMap<ObjectKey, ServiceCache>,
    version: u64,
    writes: usize,
    fail_reads: bool,
}

impl MemoryState {
    fn next_version(&mut self) -> Option<String> {
        self.version += 1;
        Some(self.version.to_string())
    }
}

fn check_version(current: &ObjectMeta, incoming: &ObjectMeta, key: &ObjectKey) -> Result<()> {
    if current.resource_version != incoming.resource_version {
        return Err(ServiceCacheError::Conflict(format!("{} was modified", key)));
    }
    Ok(())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_service(&self, namespace: &str, name: &str, annotations: &[(&str, &str)]) {
        let mut state = self.state.lock().unwrap();
        let annotations = (!annotations.is_empty()).then(|| {
            annotations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        });
        let service = Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                uid: Some(format!("svc-uid-{}", name)),
                resource_version: state.next_version(),
                annotations,
                ..Default::default()
            },
            ..Default::default()
        };
        state.services.insert(ObjectKey::new(namespace, name), service);
    }

    pub fn insert_cache(&self, namespace: &str, name: &str, spec: ServiceCacheSpec) {
        let mut state = self.state.lock().unwrap();
        let mut cache = ServiceCache::new(name, spec);
        cache.metadata.namespace = Some(namespace.to_string());
        cache.metadata.uid = Some(format!("cache-uid-{}", name));
        cache.metadata.resource_version = state.next_version();
        state.caches.insert(ObjectKey::new(namespace, name), cache);
    }

    /// Change a Service annotation as an outside actor would
    pub fn annotate_service(&self, key: &ObjectKey, annotation: &str, value: &str) {
        let mut state = self.state.lock().unwrap();
        let version = state.next_version();
        if let Some(service) = state.services.get_mut(key) {
            service
                .annotations_mut()
                .insert(annotation.to_string(), value.to_string());
            service.metadata.resource_version = version;
        }
    }

    pub fn clear_service_annotations(&self, key: &ObjectKey) {
        let mut state = self.state.lock().unwrap();
        let version = state.next_version();
        if let Some(service) = state.services.get_mut(key) {
            service.metadata.annotations = None;
            service.metadata.resource_version = version;
        }
    }

    /// Change a ServiceCache spec as an outside actor would
    pub fn edit_cache(&self, key: &ObjectKey, spec: ServiceCacheSpec) {
        let mut state = self.state.lock().unwrap();
        let version = state.next_version();
        if let Some(cache) = state.caches.get_mut(key) {
            cache.spec = spec;
            cache.metadata.resource_version = version;
        }
    }

    pub fn remove_service(&self, key: &ObjectKey) {
        self.state.lock().unwrap().services.remove(key);
    }

    pub fn remove_cache(&self, key: &ObjectKey) {
        self.state.lock().unwrap().caches.remove(key);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub fn service(&self, key: &ObjectKey) -> Option<Service> {
        self.state.lock().unwrap().services.get(key).cloned()
    }

    pub fn cache(&self, key: &ObjectKey) -> Option<ServiceCache> {
        self.state.lock().unwrap().caches.get(key).cloned()
    }

    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    fn check_reads(&self, key: &ObjectKey) -> Result<()> {
        if self.state.lock().unwrap().fail_reads {
            return Err(ServiceCacheError::KubeError(kube::Error::Api(
                kube::error::ErrorResponse {
                    status: "Failure".to_string(),
                    message: format!("{} temporarily unavailable", key),
                    reason: "ServiceUnavailable".to_string(),
                    code: 503,
                },
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_service(&self, key: &ObjectKey) -> Result<Option<Service>> {
        self.check_reads(key)?;
        Ok(self.service(key))
    }

    async fn update_service(&self, service: &Service) -> Result<Service> {
        let key = ObjectKey::from_resource(service)?;
        let mut state = self.state.lock().unwrap();
        let current = state
            .services
            .get(&key)
            .ok_or_else(|| ServiceCacheError::Conflict(format!("{} does not exist", key)))?;
        check_version(&current.metadata, &service.metadata, &key)?;

        let mut stored = service.clone();
        stored.metadata.resource_version = state.next_version();
        state.services.insert(key, stored.clone());
        state.writes += 1;
        Ok(stored)
    }

    async fn get_service_cache(&self, key: &ObjectKey) -> Result<Option<ServiceCache>> {
        self.check_reads(key)?;
        Ok(self.cache(key))
    }

    async fn create_service_cache(&self, cache: &ServiceCache) -> Result<ServiceCache> {
        let key = ObjectKey::from_resource(cache)?;
        let mut state = self.state.lock().unwrap();
        if state.caches.contains_key(&key) {
            return Err(ServiceCacheError::Conflict(format!("{} already exists", key)));
        }

        let mut stored = cache.clone();
        stored.metadata.uid = Some(format!("cache-uid-{}", cache.name_any()));
        stored.metadata.resource_version = state.next_version();
        state.caches.insert(key, stored.clone());
        state.writes += 1;
        Ok(stored)
    }

    async fn update_service_cache(&self, cache: &ServiceCache) -> Result<ServiceCache> {
        let key = ObjectKey::from_resource(cache)?;
        let mut state = self.state.lock().unwrap();
        let current = state
            .caches
            .get(&key)
            .ok_or_else(|| ServiceCacheError::Conflict(format!("{} does not exist", key)))?;
        check_version(&current.metadata, &cache.metadata, &key)?;

        let mut stored = cache.clone();
        stored.metadata.resource_version = state.next_version();
        state.caches.insert(key, stored.clone());
        state.writes += 1;
        Ok(stored)
    }

    async fn delete_service_cache(&self, cache: &ServiceCache) -> Result<()> {
        let key = ObjectKey::from_resource(cache)?;
        let mut state = self.state.lock().unwrap();
        let same_object = state
            .caches
            .get(&key)
            .is_some_and(|current| current.metadata.uid == cache.metadata.uid);
        if same_object {
            state.caches.remove(&key);
            state.writes += 1;
        }
        Ok(())
    }
}
