//! Service state: the single snapshot observers receive, plus the partial
//! update type every transition goes through.

use spred_bridge::Device;
use spred_files::TransferProgress;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Which transport carried (or will carry) the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMethod {
    GoogleNearby,
    WifiDirect,
    Hotspot,
}

/// A discovered device with the moment it was last reported by the
/// native layer. Entries age out of the list after [`DEVICE_TTL`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedDevice {
    pub device: Device,
    pub last_seen: Instant,
}

/// How long a device stays listed without being re-reported.
pub const DEVICE_TTL: Duration = Duration::from_millis(60_000);

/// Snapshot of the coordination layer, delivered to every subscriber on
/// each transition. Cloned out of the service; never shared mutably.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct P2pServiceState {
    pub is_initialized: bool,
    pub has_permissions: bool,
    pub is_wifi_enabled: bool,
    pub is_location_enabled: bool,
    pub is_discovering: bool,
    pub is_connected: bool,
    pub is_group_owner: bool,
    /// Freshest-first: sorted descending by `last_seen`.
    pub discovered_devices: Vec<TrackedDevice>,
    pub transfer_progress: Option<TransferProgress>,
    pub connection_method: Option<ConnectionMethod>,
    /// Last user-facing error message; cleared when an operation succeeds.
    pub error: Option<String>,
}

impl P2pServiceState {
    /// Devices currently worth offering to the user.
    pub fn connectable_devices(&self) -> Vec<&Device> {
        self.discovered_devices
            .iter()
            .filter(|d| d.device.status.is_connectable())
            .map(|d| &d.device)
            .collect()
    }
}

/// A partial transition. Only the fields set are written to the state;
/// everything else is left as it was. `error` distinguishes "set a
/// message" and "clear" from "leave untouched".
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub is_initialized: Option<bool>,
    pub has_permissions: Option<bool>,
    pub is_wifi_enabled: Option<bool>,
    pub is_location_enabled: Option<bool>,
    pub is_discovering: Option<bool>,
    pub is_connected: Option<bool>,
    pub is_group_owner: Option<bool>,
    pub discovered_devices: Option<Vec<TrackedDevice>>,
    pub transfer_progress: Option<Option<TransferProgress>>,
    pub connection_method: Option<ConnectionMethod>,
    pub error: Option<Option<String>>,
}

impl StateUpdate {
    pub fn initialized(mut self, value: bool) -> Self {
        self.is_initialized = Some(value);
        self
    }

    pub fn permissions(mut self, value: bool) -> Self {
        self.has_permissions = Some(value);
        self
    }

    pub fn wifi_enabled(mut self, value: bool) -> Self {
        self.is_wifi_enabled = Some(value);
        self
    }

    pub fn location_enabled(mut self, value: bool) -> Self {
        self.is_location_enabled = Some(value);
        self
    }

    pub fn discovering(mut self, value: bool) -> Self {
        self.is_discovering = Some(value);
        self
    }

    pub fn connected(mut self, value: bool) -> Self {
        self.is_connected = Some(value);
        self
    }

    pub fn group_owner(mut self, value: bool) -> Self {
        self.is_group_owner = Some(value);
        self
    }

    pub fn devices(mut self, devices: Vec<TrackedDevice>) -> Self {
        self.discovered_devices = Some(devices);
        self
    }

    pub fn transfer(mut self, progress: Option<TransferProgress>) -> Self {
        self.transfer_progress = Some(progress);
        self
    }

    pub fn method(mut self, method: ConnectionMethod) -> Self {
        self.connection_method = Some(method);
        self
    }

    pub fn set_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(Some(message.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }

    /// Write the set fields into `state`.
    pub fn apply(self, state: &mut P2pServiceState) {
        if let Some(v) = self.is_initialized {
            state.is_initialized = v;
        }
        if let Some(v) = self.has_permissions {
            state.has_permissions = v;
        }
        if let Some(v) = self.is_wifi_enabled {
            state.is_wifi_enabled = v;
        }
        if let Some(v) = self.is_location_enabled {
            state.is_location_enabled = v;
        }
        if let Some(v) = self.is_discovering {
            state.is_discovering = v;
        }
        if let Some(v) = self.is_connected {
            state.is_connected = v;
        }
        if let Some(v) = self.is_group_owner {
            state.is_group_owner = v;
        }
        if let Some(v) = self.discovered_devices {
            state.discovered_devices = v;
        }
        if let Some(v) = self.transfer_progress {
            state.transfer_progress = v;
        }
        if let Some(v) = self.connection_method {
            state.connection_method = Some(v);
        }
        if let Some(v) = self.error {
            state.error = v;
        }
    }
}

/// Merge a freshly reported batch into the tracked list.
///
/// - Batch entries (re)stamp their address with `now`
/// - Entries not in the batch keep their previous `last_seen`
/// - Anything whose age reached `ttl` is dropped
/// - Result is sorted freshest first
pub fn merge_device_lists(
    current: &[TrackedDevice],
    batch: Vec<Device>,
    now: Instant,
    ttl: Duration,
) -> Vec<TrackedDevice> {
    let mut by_address: HashMap<String, TrackedDevice> = current
        .iter()
        .map(|d| (d.device.device_address.clone(), d.clone()))
        .collect();

    for device in batch {
        let address = device.device_address.clone();
        by_address.insert(
            address,
            TrackedDevice {
                device,
                last_seen: now,
            },
        );
    }

    let mut merged: Vec<TrackedDevice> = by_address
        .into_values()
        .filter(|d| now.saturating_duration_since(d.last_seen) < ttl)
        .collect();
    merged.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
    merged
}
