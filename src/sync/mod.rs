// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Annotation codec and the Service/ServiceCache comparison.

pub mod annotations;
pub mod diff;

pub use annotations::{decode, encode, is_annotated, strip, AnnotationPatch, Annotations, CacheConfig};
pub use diff::{configs_equal, in_sync};
