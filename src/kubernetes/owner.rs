// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Owner reference linking between a Service and its ServiceCache.

use crate::error::{Result, ServiceCacheError};
use kube::{api::ObjectMeta, Resource, ResourceExt};

/// Make `owner` the controller of `dependent`.
///
/// Returns whether the dependent's metadata changed. Fails when the owner has
/// not been persisted yet (no uid) or when another object already controls
/// the dependent.
pub fn set_controller_owner<O>(owner: &O, dependent: &mut ObjectMeta) -> Result<bool>
where
    O: Resource<DynamicType = ()>,
{
    let owner_ref = owner.controller_owner_ref(&()).ok_or_else(|| {
        ServiceCacheError::OwnerReference(format!(
            "{} {} has no uid yet",
            O::kind(&()),
            owner.name_any()
        ))
    })?;

    let refs = dependent.owner_references.get_or_insert_with(Vec::new);

    if let Some(other) = refs
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != owner_ref.uid)
    {
        return Err(ServiceCacheError::OwnerReference(format!(
            "{} is already controlled by {} {}",
            dependent.name.as_deref().unwrap_or_default(),
            other.kind,
            other.name
        )));
    }

    match refs.iter_mut().find(|r| r.uid == owner_ref.uid) {
        Some(existing) if *existing == owner_ref => Ok(false),
        Some(existing) => {
            *existing = owner_ref;
            Ok(true)
        }
        None => {
            refs.push(owner_ref);
            Ok(true)
        }
    }
}

/// Drop every reference to the `O` called `owner_name` from `dependent`.
///
/// Returns whether any reference was removed.
pub fn remove_owner<O>(owner_name: &str, dependent: &mut ObjectMeta) -> bool
where
    O: Resource<DynamicType = ()>,
{
    let kind = O::kind(&());
    let api_version = O::api_version(&());

    let Some(refs) = dependent.owner_references.as_mut() else {
        return false;
    };
    let before = refs.len();
    refs.retain(|r| !(r.kind == kind && r.api_version == api_version && r.name == owner_name));
    let removed = refs.len() != before;

    if refs.is_empty() {
        dependent.owner_references = None;
    }
    removed
}
