//! The status checker: subscribes to the coordination service and turns
//! every transition into a derived [`HotspotStatus`] for the UI, with
//! validation, diagnostics and an optional interval-based refresh.

use crate::types::{
    DiagnosticReport, DiscoveryState, HotspotGuidance, HotspotMode, HotspotStatus, NetworkState,
    ServiceHealth, StatusReport, StatusSummary, SystemChecks, ValidationReport,
};
use parking_lot::Mutex;
use spred_p2p::{error_guidance as base_guidance, P2pService, P2pServiceState, Subscription};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Cadence of [`HotspotStatusChecker::start_automatic_refresh`] when the
/// caller has no opinion.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

const ERROR_HISTORY_CAP: usize = 10;

type StatusListener = Arc<dyn Fn(&HotspotStatus) + Send + Sync>;

/// Handle for one status subscription. Dropping it (or calling
/// [`StatusSubscription::unsubscribe`]) removes the listener.
pub struct StatusSubscription {
    id: u64,
    checker: Weak<HotspotStatusChecker>,
}

impl StatusSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        if let Some(checker) = self.checker.upgrade() {
            checker.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Rolling record of distinct error strings; oldest entries drop off
/// beyond the cap.
#[derive(Debug, Default)]
struct ErrorHistory {
    entries: Vec<String>,
}

impl ErrorHistory {
    fn record(&mut self, error: &str) {
        if self.entries.iter().any(|e| e == error) {
            return;
        }
        self.entries.push(error.to_string());
        if self.entries.len() > ERROR_HISTORY_CAP {
            let excess = self.entries.len() - ERROR_HISTORY_CAP;
            self.entries.drain(..excess);
        }
    }
}

/// Derives hotspot health from the coordination service.
///
/// Read-only over the service: every method works from state snapshots
/// and bridge probes exposed by [`P2pService`], so running the checker
/// can never change connection behavior.
pub struct HotspotStatusChecker {
    service: Arc<P2pService>,
    current: Mutex<HotspotStatus>,
    /// Last status delivered by the automatic refresh, for change detection.
    previous: Mutex<Option<HotspotStatus>>,
    history: Mutex<ErrorHistory>,
    metrics: Mutex<HashMap<String, u64>>,
    listeners: Mutex<Vec<(u64, StatusListener)>>,
    next_listener_id: AtomicU64,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    service_subscription: Mutex<Option<Subscription>>,
}

impl HotspotStatusChecker {
    /// Attach a checker to the service. Re-derives and republishes on
    /// every service transition from this point on. Must be called
    /// inside a tokio runtime.
    pub fn new(service: Arc<P2pService>) -> Arc<Self> {
        let checker = Arc::new(Self {
            service: service.clone(),
            current: Mutex::new(HotspotStatus::default()),
            previous: Mutex::new(None),
            history: Mutex::new(ErrorHistory::default()),
            metrics: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
            refresh_task: Mutex::new(None),
            service_subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&checker);
        let subscription = service.subscribe(move |state| {
            if let Some(checker) = weak.upgrade() {
                checker.on_service_change(state);
            }
        });
        *checker.service_subscription.lock() = Some(subscription);
        checker
    }

    /// Derive the current hotspot status from the service snapshot and a
    /// fresh group-info probe. Updates the cached copy.
    pub async fn check_status(&self) -> HotspotStatus {
        let state = self.service.get_state();
        let group_info = self.service.group_info().await;

        let is_active = state.is_initialized
            && (state.is_group_owner || state.is_connected || state.is_discovering);

        let mode = if !is_active {
            HotspotMode::Disabled
        } else if state.is_group_owner || group_info.is_some() {
            HotspotMode::WifiDirect
        } else if self.service.is_hotspot_enabled().await {
            HotspotMode::HotspotFallback
        } else {
            HotspotMode::WifiDirect
        };

        let discovery_state = if state.is_discovering {
            DiscoveryState::Discovering
        } else if state.is_group_owner || group_info.is_some() {
            DiscoveryState::Advertising
        } else {
            DiscoveryState::Idle
        };

        let status = HotspotStatus {
            is_active,
            mode,
            group_info,
            discovery_state,
            connection_count: state.discovered_devices.len(),
            error: state.error,
        };
        debug!(
            active = status.is_active,
            mode = %status.mode,
            discovery = %status.discovery_state,
            devices = status.connection_count,
            "status derived"
        );
        *self.current.lock() = status.clone();
        status
    }

    /// Last derived status, without re-probing anything.
    pub fn current_status(&self) -> HotspotStatus {
        self.current.lock().clone()
    }

    /// Walk the fixed checklist over the current service snapshot.
    pub fn validate_service(&self) -> ValidationReport {
        let state = self.service.get_state();
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        if !state.is_initialized {
            issues.push("P2P service is not initialized".to_string());
            recommendations.push("Initialize the P2P service before sharing".to_string());
        }
        if !state.has_permissions {
            issues.push("Required permissions not granted".to_string());
            recommendations.push("Grant location and nearby devices permissions".to_string());
        }
        if !state.is_wifi_enabled {
            issues.push("WiFi is not enabled".to_string());
            recommendations.push("Enable WiFi to use peer-to-peer sharing".to_string());
        }
        if !state.is_location_enabled {
            issues.push("Location services are not enabled".to_string());
            recommendations.push("Enable location services for device discovery".to_string());
        }
        if let Some(error) = &state.error {
            issues.push(format!("Service error: {error}"));
            recommendations.push("Resolve service errors before proceeding".to_string());
        }

        ValidationReport {
            is_valid: issues.is_empty(),
            health: ServiceHealth::classify(issues.len()),
            issues,
            recommendations,
        }
    }

    /// Status report: derived status, validation issues and network state.
    pub async fn detailed_status(&self) -> StatusReport {
        let status = self.check_status().await;
        let state = self.service.get_state();
        let validation = self.validate_service();
        let network_state = NetworkState {
            wifi_enabled: state.is_wifi_enabled,
            location_enabled: state.is_location_enabled,
            hotspot_enabled: self.service.is_hotspot_enabled().await,
        };

        StatusReport {
            summary: StatusSummary {
                hotspot_active: status.is_active,
                mode: status.mode,
                device_count: status.connection_count,
                last_error: status.error.clone(),
            },
            permissions: state.has_permissions,
            service_state: state,
            network_state,
            diagnostics: validation.issues,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Full diagnostic pass: status, validation, capability probes,
    /// recorded metrics and the error history.
    pub async fn run_diagnostics(&self) -> DiagnosticReport {
        let started = std::time::Instant::now();
        let status = self.check_status().await;
        let validation = self.validate_service();
        let service_state = self.service.get_state();
        let system_checks = SystemChecks {
            permissions: service_state.has_permissions,
            wifi_enabled: service_state.is_wifi_enabled,
            location_enabled: service_state.is_location_enabled,
            wifi_direct_support: self.service.is_wifi_direct_supported().await,
        };

        let report = DiagnosticReport {
            timestamp: chrono::Utc::now(),
            status,
            validation,
            service_state,
            system_checks,
            performance: self.metrics.lock().clone(),
            error_history: self.error_history(),
        };
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            health = %report.validation.health,
            "diagnostics completed"
        );
        report
    }

    /// Status report enriched with the diagnostic findings.
    pub async fn generate_report(&self) -> StatusReport {
        let mut report = self.detailed_status().await;
        let diagnostics = self.run_diagnostics().await;

        report.diagnostics.push(format!(
            "Service health: {}",
            diagnostics.validation.health
        ));
        report.diagnostics.push(format!(
            "WiFi Direct support: {}",
            if diagnostics.system_checks.wifi_direct_support {
                "yes"
            } else {
                "no"
            }
        ));
        report.diagnostics.push(format!(
            "Error history: {} errors recorded",
            diagnostics.error_history.len()
        ));
        report
    }

    /// Remediation guidance for `message`, or for the last derived error
    /// when `message` is `None`. Hotspot and discovery failures get
    /// extended action lists on top of the base P2P triage.
    pub fn error_guidance(&self, message: Option<&str>) -> HotspotGuidance {
        let raw = message
            .map(str::to_string)
            .or_else(|| self.current.lock().error.clone())
            .unwrap_or_else(|| "Unknown error".to_string());
        let lowered = raw.to_lowercase();
        let base = base_guidance(&raw);

        if lowered.contains("hotspot") || lowered.contains("group") {
            let mut actions = vec![
                "Check that the system hotspot is disabled".to_string(),
                "Make sure this device supports WiFi Direct".to_string(),
                "Restart WiFi".to_string(),
                "Create a new WiFi Direct group".to_string(),
            ];
            actions.extend(base.actions);
            return HotspotGuidance {
                title: "Hotspot Configuration Issue".to_string(),
                message: "There is an issue with the WiFi Direct hotspot configuration."
                    .to_string(),
                actions,
                can_auto_fix: true,
            };
        }

        if lowered.contains("discovery") || lowered.contains("timed out") || lowered.contains("timeout") {
            let mut actions = vec![
                "Move the devices within a few meters of each other".to_string(),
                "Keep Spred open and active on both devices".to_string(),
                "Restart device discovery".to_string(),
            ];
            actions.extend(base.actions);
            return HotspotGuidance {
                title: "Device Discovery Problem".to_string(),
                message: "Unable to discover nearby devices for a hotspot connection."
                    .to_string(),
                actions,
                can_auto_fix: true,
            };
        }

        HotspotGuidance {
            title: base.title,
            message: base.message,
            actions: base.actions,
            can_auto_fix: false,
        }
    }

    /// Register a status listener. The freshly derived status is pushed
    /// to the new listener once before this returns; afterwards it runs
    /// on every service transition and on detected refresh changes.
    pub async fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(&HotspotStatus) + Send + Sync + 'static,
    ) -> StatusSubscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let listener: StatusListener = Arc::new(listener);
        self.listeners.lock().push((id, listener.clone()));

        let status = self.check_status().await;
        invoke_listener(id, &listener, &status);

        StatusSubscription {
            id,
            checker: Arc::downgrade(self),
        }
    }

    /// Start the periodic refresh. Listeners are only notified when the
    /// derived status actually differs from the previous tick, so an idle
    /// session produces no UI churn. Restarting replaces the interval.
    pub fn start_automatic_refresh(self: &Arc<Self>, interval: Duration) {
        self.stop_automatic_refresh();
        info!(interval_ms = interval.as_millis() as u64, "automatic status refresh started");

        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                sleep(interval).await;
                let Some(checker) = weak.upgrade() else { break };
                let status = checker.check_status().await;
                if checker.take_changed(&status) {
                    debug!("status changed, notifying subscribers");
                    checker.notify(&status);
                }
            }
        });
        *self.refresh_task.lock() = Some(handle);
    }

    pub fn stop_automatic_refresh(&self) {
        if let Some(task) = self.refresh_task.lock().take() {
            task.abort();
            info!("automatic status refresh stopped");
        }
    }

    /// Re-derive and push to every listener, changed or not.
    pub async fn force_update(self: &Arc<Self>) -> HotspotStatus {
        let status = self.check_status().await;
        self.notify(&status);
        status
    }

    /// Record a named duration for the diagnostic report.
    pub fn record_metric(&self, name: impl Into<String>, millis: u64) {
        let name = name.into();
        debug!(metric = %name, millis, "performance metric recorded");
        self.metrics.lock().insert(name, millis);
    }

    /// Distinct service errors seen so far, oldest first, capped at 10.
    pub fn error_history(&self) -> Vec<String> {
        self.history.lock().entries.clone()
    }

    pub fn clear_error_history(&self) {
        self.history.lock().entries.clear();
    }

    /// Stop the refresh, detach from the service and drop all listeners.
    /// The instance stays usable for on-demand derivation afterwards.
    pub fn shutdown(&self) {
        self.stop_automatic_refresh();
        self.service_subscription.lock().take();
        self.listeners.lock().clear();
    }

    // --- internals ---

    fn on_service_change(self: Arc<Self>, state: &P2pServiceState) {
        if let Some(error) = &state.error {
            self.history.lock().record(error);
        }
        if self.listeners.lock().is_empty() {
            return;
        }
        // Derivation needs the async group probe, so it cannot run inside
        // the service's synchronous notification pass.
        let weak = Arc::downgrade(&self);
        tokio::spawn(async move {
            let Some(checker) = weak.upgrade() else { return };
            let status = checker.check_status().await;
            checker.notify(&status);
        });
    }

    /// Update the change-detection baseline; true when `status` differs.
    fn take_changed(&self, status: &HotspotStatus) -> bool {
        let mut previous = self.previous.lock();
        let changed = previous.as_ref().map_or(true, |p| p.differs_from(status));
        if changed {
            *previous = Some(status.clone());
        }
        changed
    }

    fn notify(&self, status: &HotspotStatus) {
        let listeners: Vec<(u64, StatusListener)> = self.listeners.lock().clone();
        for (id, listener) in listeners {
            invoke_listener(id, &listener, status);
        }
    }
}

/// A panicking listener must not take down the checker or its peers.
fn invoke_listener(id: u64, listener: &StatusListener, status: &HotspotStatus) {
    if std::panic::catch_unwind(AssertUnwindSafe(|| listener(status))).is_err() {
        error!(listener = id, "status listener panicked");
    }
}
