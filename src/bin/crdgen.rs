// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prints the ServiceCache CRD so it can be applied with kubectl.

use kube::CustomResourceExt;
use service_cache_operator::types::ServiceCache;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&ServiceCache::crd())?);
    Ok(())
}
