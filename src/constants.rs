// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used on Services
pub mod annotations {
    /// Any annotation key with this prefix marks a Service as managed
    pub const PREFIX: &str = "service-cache.github.io/";
    /// "true" / "false": whether responses are cacheable by default
    pub const DEFAULT: &str = "service-cache.github.io/default";
    /// Bracketed, comma separated list of cacheable URLs, e.g. "[/a,/b]"
    pub const URLS: &str = "service-cache.github.io/URLs";
}

/// The operator name used as field manager and controller identity
pub const OPERATOR_NAME: &str = "service-cache-operator";

/// ServiceCache CRD coordinates
pub mod crd {
    pub const GROUP: &str = "service-cache.github.io";
    pub const VERSION: &str = "v1alpha1";
    pub const KIND: &str = "ServiceCache";
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Requeue delays used by the controllers' error policies
pub mod requeue {
    /// Default delay after a failed reconcile pass
    pub const ERROR_SECS: u64 = 60;
    /// Delay after an optimistic concurrency conflict
    pub const CONFLICT_SECS: u64 = 1;
}
