//! Spred Status - derived hotspot health over the P2P coordination layer.
//!
//! [`HotspotStatusChecker`] wraps the coordination service and turns its
//! raw state into what the sharing UI actually renders:
//! - an on-demand [`HotspotStatus`] snapshot (active, mode, discovery)
//! - a health checklist classified healthy/degraded/unhealthy
//! - change-detected push updates with an optional automatic refresh
//! - diagnostics, status reports and a bounded error history
//!
//! The checker never mutates service state; it derives and republishes.

pub mod checker;
pub mod types;

pub use checker::{HotspotStatusChecker, StatusSubscription, DEFAULT_REFRESH_INTERVAL};
pub use types::{
    DiagnosticReport, DiscoveryState, HotspotGuidance, HotspotMode, HotspotStatus, NetworkState,
    ServiceHealth, StatusReport, StatusSummary, SystemChecks, ValidationReport,
};
