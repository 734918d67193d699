// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceCacheError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Update conflict: {0}")]
    Conflict(String),

    #[error("Owner reference failed: {0}")]
    OwnerReference(String),

    #[error("Object has no name or namespace: {0}")]
    MissingObjectKey(String),
}

impl ServiceCacheError {
    /// Whether the pass should be retried promptly with fresh reads
    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceCacheError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, ServiceCacheError>;
