// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::requeue;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Restrict both controllers to a single namespace; `None` watches all namespaces
    pub watch_namespace: Option<String>,
    /// Delay before retrying a failed reconcile pass
    pub error_requeue: Duration,
    /// Block startup until the ServiceCache CRD is served
    pub wait_for_crd: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            error_requeue: Duration::from_secs(requeue::ERROR_SECS),
            wait_for_crd: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let watch_namespace = lookup("WATCH_NAMESPACE")
            .map(|ns| ns.trim().to_string())
            .filter(|ns| !ns.is_empty());

        let error_requeue = match lookup("ERROR_REQUEUE_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse()
                    .with_context(|| format!("ERROR_REQUEUE_SECS is not a number: {}", v))?,
            ),
            None => Duration::from_secs(requeue::ERROR_SECS),
        };

        let wait_for_crd = match lookup("WAIT_FOR_CRD") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("WAIT_FOR_CRD must be true or false: {}", v))?,
            None => true,
        };

        Ok(Config {
            watch_namespace,
            error_requeue,
            wait_for_crd,
        })
    }
}
