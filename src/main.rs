// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use service_cache_operator::config::Config;
use service_cache_operator::kubernetes::wait_for_service_cache_crd;
use service_cache_operator::reconcilers::{service, service_cache};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting service-cache operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: watch_namespace={}, error_requeue={:?}",
        config.watch_namespace.as_deref().unwrap_or("<all>"),
        config.error_requeue
    );

    // Create Kubernetes client
    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    if config.wait_for_crd {
        info!("Waiting for ServiceCache CRD to become available...");
        wait_for_service_cache_crd(&client).await?;
    }

    info!("Starting reconcilers...");

    tokio::try_join!(
        service::run(client.clone(), config.clone()),
        service_cache::run(client, config)
    )?;

    // This should never be reached as reconcilers run forever
    warn!("All reconcilers stopped unexpectedly");
    Ok(())
}
