// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery, object access, and ownership.

pub mod crd;
pub mod owner;
pub mod store;

pub use crd::wait_for_service_cache_crd;
pub use owner::{remove_owner, set_controller_owner};
pub use store::{KubeStore, ObjectKey, ObjectStore};
