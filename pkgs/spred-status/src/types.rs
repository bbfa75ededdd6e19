//! Derived status and report types published by the checker.

use chrono::{DateTime, Utc};
use spred_bridge::GroupInfo;
use spred_p2p::P2pServiceState;
use std::collections::HashMap;
use std::fmt;

/// How the hotspot-style session is being carried, when it is up at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotspotMode {
    WifiDirect,
    HotspotFallback,
    Disabled,
}

impl fmt::Display for HotspotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WifiDirect => "wifi-direct",
            Self::HotspotFallback => "hotspot-fallback",
            Self::Disabled => "disabled",
        })
    }
}

/// What the radio is doing from the peer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    Idle,
    Discovering,
    /// A group exists (or we own one), so peers can find and join us.
    Advertising,
}

impl fmt::Display for DiscoveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::Advertising => "advertising",
        })
    }
}

/// Point-in-time view of the sharing session, recomputed on demand from
/// the coordination state plus a group-info probe. Never stored beyond
/// the last derived copy.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotStatus {
    pub is_active: bool,
    pub mode: HotspotMode,
    pub group_info: Option<GroupInfo>,
    pub discovery_state: DiscoveryState,
    pub connection_count: usize,
    pub error: Option<String>,
}

impl Default for HotspotStatus {
    fn default() -> Self {
        Self {
            is_active: false,
            mode: HotspotMode::Disabled,
            group_info: None,
            discovery_state: DiscoveryState::Idle,
            connection_count: 0,
            error: None,
        }
    }
}

impl HotspotStatus {
    /// Field-by-field comparison driving refresh notifications. Group
    /// details are excluded: they churn on every native poll without
    /// changing what the UI shows.
    pub fn differs_from(&self, other: &HotspotStatus) -> bool {
        self.is_active != other.is_active
            || self.mode != other.mode
            || self.discovery_state != other.discovery_state
            || self.connection_count != other.connection_count
            || self.error != other.error
    }
}

/// Coarse health classification from the validation checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

impl ServiceHealth {
    pub fn classify(issue_count: usize) -> Self {
        match issue_count {
            0 => Self::Healthy,
            1..=2 => Self::Degraded,
            _ => Self::Unhealthy,
        }
    }
}

impl fmt::Display for ServiceHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        })
    }
}

/// Result of the fixed service checklist.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    /// One remediation hint per issue, in the same order.
    pub recommendations: Vec<String>,
    pub health: ServiceHealth,
}

/// Raw platform capability probes taken during diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemChecks {
    pub permissions: bool,
    pub wifi_enabled: bool,
    pub location_enabled: bool,
    pub wifi_direct_support: bool,
}

/// Everything a support ticket needs in one structure.
#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    pub timestamp: DateTime<Utc>,
    pub status: HotspotStatus,
    pub validation: ValidationReport,
    pub service_state: P2pServiceState,
    pub system_checks: SystemChecks,
    /// Named durations in milliseconds, recorded by the application.
    pub performance: HashMap<String, u64>,
    pub error_history: Vec<String>,
}

/// Headline figures of a [`StatusReport`].
#[derive(Debug, Clone)]
pub struct StatusSummary {
    pub hotspot_active: bool,
    pub mode: HotspotMode,
    pub device_count: usize,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkState {
    pub wifi_enabled: bool,
    pub location_enabled: bool,
    pub hotspot_enabled: bool,
}

/// Human-oriented status report: summary up front, full state behind it.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub summary: StatusSummary,
    pub service_state: P2pServiceState,
    pub permissions: bool,
    pub network_state: NetworkState,
    pub diagnostics: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Guidance enriched with hotspot specifics on top of the base P2P
/// triage. `can_auto_fix` marks categories the app can retry by itself
/// (tear the group down, restart discovery) without user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotspotGuidance {
    pub title: String,
    pub message: String,
    pub actions: Vec<String>,
    pub can_auto_fix: bool,
}
