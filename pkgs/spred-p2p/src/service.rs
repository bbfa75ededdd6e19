//! The coordination service: owns service state, drives the native bridge,
//! and fans state snapshots out to subscribers.

use crate::config::P2pConfig;
use crate::guidance::{error_guidance, ErrorGuidance};
use crate::resolve::{is_local_media_path, stem_matches, VideoDescriptor};
use crate::state::{merge_device_lists, ConnectionMethod, P2pServiceState, StateUpdate};
use parking_lot::Mutex;
use spred_bridge::{
    BridgeError, Device, GroupInfo, NearbyBridge, ReceiveMode, TransferDirection, TransferUpdate,
    WifiDirectBridge,
};
use spred_files::{file_name, FileService, TransferProgress, TransferStatus};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, warn};

pub const ERR_PERMISSIONS: &str =
    "Required permissions not granted. Allow location and nearby devices access.";
pub const ERR_LOCATION: &str =
    "Location services are disabled. Enable location to discover nearby devices.";
pub const ERR_WIFI: &str = "WiFi is disabled. Enable WiFi to use peer-to-peer sharing.";
pub const ERR_HOTSPOT_CONFLICT: &str =
    "WiFi hotspot is active. Disable the hotspot to allow WiFi Direct discovery.";
pub const ERR_DISCOVERY_TIMEOUT: &str = "Device discovery timed out. No devices found nearby.";
pub const ERR_CONNECT_TIMEOUT: &str = "Connection attempt timed out.";
pub const ERR_NO_CONNECTION: &str =
    "No active connection. Connect to a device before sending a file.";
pub const ERR_NOT_LOCAL: &str = "Only local files can be sent over P2P.";

type Listener = Arc<dyn Fn(&P2pServiceState) + Send + Sync>;

/// Handle for one state subscription. Dropping it (or calling
/// [`Subscription::unsubscribe`]) removes the listener.
pub struct Subscription {
    id: u64,
    service: Weak<P2pService>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(service) = self.service.upgrade() {
            service.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

/// P2P transfer coordinator.
///
/// Construction wires the service to its collaborators; nothing global is
/// kept, so tests run independent instances side by side. All operations
/// report failure through the `error` field of the published state and a
/// boolean (or `Option`) return, mirroring how the UI consumes them.
pub struct P2pService {
    bridge: Arc<dyn WifiDirectBridge>,
    nearby: Arc<dyn NearbyBridge>,
    files: Arc<FileService>,
    config: P2pConfig,
    state: Mutex<P2pServiceState>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    bridge_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl P2pService {
    /// Create the service and start draining the bridge's push channels.
    /// Must be called inside a tokio runtime.
    pub fn new(
        bridge: Arc<dyn WifiDirectBridge>,
        nearby: Arc<dyn NearbyBridge>,
        files: Arc<FileService>,
        config: P2pConfig,
    ) -> Arc<Self> {
        let service = Arc::new(Self {
            bridge,
            nearby,
            files,
            config,
            state: Mutex::new(P2pServiceState::default()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
            refresh_task: Mutex::new(None),
            bridge_tasks: Mutex::new(Vec::new()),
        });
        service.spawn_bridge_listeners();
        service
    }

    /// Current state snapshot.
    pub fn get_state(&self) -> P2pServiceState {
        self.state.lock().clone()
    }

    /// Guidance for the currently stored error, if any.
    pub fn error_guidance(&self) -> Option<ErrorGuidance> {
        self.get_state().error.map(|e| error_guidance(&e))
    }

    /// Register a state listener. The current snapshot is replayed to the
    /// new listener exactly once, synchronously, before this returns.
    pub fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(&P2pServiceState) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let listener: Listener = Arc::new(listener);
        self.listeners.lock().push((id, listener.clone()));

        let snapshot = self.get_state();
        invoke_listener(id, &listener, &snapshot);

        Subscription {
            id,
            service: Arc::downgrade(self),
        }
    }

    /// Bring the transport up. Prefers Nearby Connections; when that is
    /// unavailable, walks the WiFi Direct precondition chain (permissions,
    /// location, WiFi) and initializes the native module. Idempotent: once
    /// initialized, returns `true` without touching the bridge again.
    pub async fn initialize_service(&self) -> bool {
        if self.get_state().is_initialized {
            debug!("already initialized");
            return true;
        }

        if self.nearby.initialize().await.is_ok() {
            info!("transport ready via Nearby Connections");
            self.update_state(
                StateUpdate::default()
                    .initialized(true)
                    .method(ConnectionMethod::GoogleNearby)
                    .clear_error(),
            );
            return true;
        }
        debug!("Nearby Connections unavailable, falling back to WiFi Direct");

        let granted = match self.bridge.check_permissions().await {
            Ok(true) => true,
            Ok(false) => self.bridge.request_permissions().await.unwrap_or(false),
            Err(e) => {
                self.update_state(StateUpdate::default().set_error(e.user_message()));
                return false;
            }
        };
        self.update_state(StateUpdate::default().permissions(granted));
        if !granted {
            self.update_state(StateUpdate::default().set_error(ERR_PERMISSIONS));
            return false;
        }

        let location = self.bridge.is_location_enabled().await.unwrap_or(false);
        self.update_state(StateUpdate::default().location_enabled(location));
        if !location {
            self.update_state(StateUpdate::default().set_error(ERR_LOCATION));
            return false;
        }

        let wifi = self.bridge.is_wifi_enabled().await.unwrap_or(false);
        self.update_state(StateUpdate::default().wifi_enabled(wifi));
        if !wifi {
            self.update_state(StateUpdate::default().set_error(ERR_WIFI));
            return false;
        }

        match self.bridge.initialize().await {
            // A second init from another code path is not an error.
            Ok(()) | Err(BridgeError::AlreadyInitialized) => {
                info!("transport ready via WiFi Direct");
                self.update_state(
                    StateUpdate::default()
                        .initialized(true)
                        .method(ConnectionMethod::WifiDirect)
                        .clear_error(),
                );
                true
            }
            Err(e) => {
                error!(error = %e, "native module initialization failed");
                self.update_state(StateUpdate::default().set_error(e.user_message()));
                false
            }
        }
    }

    /// Start peer discovery. Tries Nearby first, then walks the WiFi
    /// Direct precondition chain (permissions, WiFi, location, hotspot
    /// conflict, platform support) before driving the native call with a
    /// per-attempt timeout and a retry schedule; a hotspot conflict is
    /// nudged toward settings between attempts. On success a background
    /// task refreshes the device list until discovery stops.
    pub async fn start_discovery(self: &Arc<Self>) -> bool {
        if self.get_state().is_discovering {
            self.stop_discovery().await;
        }

        if self.nearby.start_discovery().await.is_ok() {
            info!("discovery started via Nearby Connections");
            self.update_state(
                StateUpdate::default()
                    .discovering(true)
                    .method(ConnectionMethod::GoogleNearby)
                    .clear_error(),
            );
            self.spawn_peer_refresh();
            return true;
        }

        let granted = match self.bridge.check_permissions().await {
            Ok(true) => true,
            Ok(false) => self.bridge.request_permissions().await.unwrap_or(false),
            Err(e) => {
                self.update_state(StateUpdate::default().set_error(e.user_message()));
                return false;
            }
        };
        self.update_state(StateUpdate::default().permissions(granted));
        if !granted {
            self.update_state(StateUpdate::default().set_error(ERR_PERMISSIONS));
            return false;
        }

        let wifi = self.bridge.is_wifi_enabled().await.unwrap_or(false);
        self.update_state(StateUpdate::default().wifi_enabled(wifi));
        if !wifi {
            self.update_state(StateUpdate::default().set_error(ERR_WIFI));
            return false;
        }

        let location = self.bridge.is_location_enabled().await.unwrap_or(false);
        self.update_state(StateUpdate::default().location_enabled(location));
        if !location {
            self.update_state(StateUpdate::default().set_error(ERR_LOCATION));
            return false;
        }

        if self.bridge.is_wifi_hotspot_enabled().await.unwrap_or(false) {
            self.update_state(StateUpdate::default().set_error(ERR_HOTSPOT_CONFLICT));
            return false;
        }
        if !self.bridge.is_wifi_direct_supported().await.unwrap_or(false) {
            self.update_state(
                StateUpdate::default().set_error(BridgeError::Unsupported.user_message()),
            );
            return false;
        }

        let policy = self.config.discovery_retry;
        let mut retries = 0u32;
        loop {
            match timeout(
                self.config.discovery_timeout,
                self.bridge.start_discovering_peers(),
            )
            .await
            {
                Ok(Ok(())) => {
                    info!("discovery started via WiFi Direct");
                    self.update_state(
                        StateUpdate::default()
                            .discovering(true)
                            .method(ConnectionMethod::WifiDirect)
                            .clear_error(),
                    );
                    self.spawn_peer_refresh();
                    return true;
                }
                Ok(Err(e)) => warn!(error = %e, retries, "discovery attempt failed"),
                Err(_) => warn!(retries, "discovery attempt timed out"),
            }
            if !policy.allows_retry(retries) {
                break;
            }
            self.try_hotspot_fallback().await;
            sleep(policy.delay_for(retries)).await;
            retries += 1;
        }

        self.update_state(
            StateUpdate::default()
                .discovering(false)
                .set_error(ERR_DISCOVERY_TIMEOUT),
        );
        false
    }

    /// Stop discovery and the background refresh. Bridge failures are
    /// logged and swallowed; the discovering flag always goes down.
    pub async fn stop_discovery(&self) {
        if let Some(task) = self.refresh_task.lock().take() {
            task.abort();
        }
        let _ = self.nearby.stop_discovery().await;
        if let Err(e) = self.bridge.stop_discovering_peers().await {
            debug!(error = %e, "stop discovery reported failure");
        }
        self.update_state(StateUpdate::default().discovering(false));
    }

    /// Pull a fresh peer batch from the bridge and merge it in.
    pub async fn refresh_device_list(&self) {
        match self.bridge.get_available_peers().await {
            Ok(batch) => self.apply_device_batch(batch),
            Err(e) => debug!(error = %e, "peer refresh failed"),
        }
    }

    /// Merge a peer batch into the tracked device list, aging out stale
    /// entries, and publish the new state.
    pub fn apply_device_batch(&self, batch: Vec<Device>) {
        let now = Instant::now();
        let snapshot = {
            let mut state = self.state.lock();
            state.discovered_devices = merge_device_lists(
                &state.discovered_devices,
                batch,
                now,
                self.config.device_ttl,
            );
            state.clone()
        };
        self.notify(&snapshot);
    }

    /// Connect to a discovered device and wait for the group to form.
    pub async fn connect_to_device(&self, device_address: &str) -> bool {
        info!(device_address, "connecting");
        if let Err(e) = self.bridge.connect(device_address).await {
            self.update_state(
                StateUpdate::default()
                    .connected(false)
                    .set_error(e.user_message()),
            );
            return false;
        }
        self.await_group_formed().await
    }

    /// Connection with escalation: plain connect, then connect with
    /// discovery stopped (discovery steals the radio on some chipsets),
    /// then become group owner and wait for the peer to join us.
    pub async fn smart_connect(&self, device_address: &str) -> bool {
        if self.connect_to_device(device_address).await {
            return true;
        }

        info!(device_address, "direct connect failed, retrying without discovery");
        self.stop_discovery().await;
        sleep(self.config.smart_connect_pause).await;
        if self.connect_to_device(device_address).await {
            return true;
        }

        info!("falling back to group ownership, waiting for the peer to join");
        if let Err(e) = self.bridge.create_group().await {
            self.update_state(StateUpdate::default().set_error(e.user_message()));
            return false;
        }
        self.update_state(
            StateUpdate::default()
                .group_owner(true)
                .method(ConnectionMethod::Hotspot),
        );
        self.await_group_formed().await
    }

    /// Send a local file to the connected peer. Rejects URLs and bare
    /// backend keys before touching the bridge, re-checks the connection
    /// just before sending, and retries a port-in-use failure after
    /// tearing the group down.
    pub async fn send_file(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        if !is_local_media_path(&path_str) {
            warn!(path = %path_str, "refusing non-local send source");
            self.update_state(StateUpdate::default().set_error(ERR_NOT_LOCAL));
            return false;
        }

        // The cached `is_connected` flag can be stale after a group
        // teardown; ask the bridge directly.
        let connected = match self.bridge.get_connection_info().await {
            Ok(info) => info.group_formed,
            Err(_) => false,
        };
        if !connected {
            self.update_state(
                StateUpdate::default()
                    .connected(false)
                    .set_error(ERR_NO_CONNECTION),
            );
            return false;
        }

        let policy = self.config.send_retry;
        let mut retries = 0u32;
        loop {
            match self.bridge.send_file(path).await {
                Ok(()) => {
                    info!(path = %path_str, "file sent");
                    self.update_state(StateUpdate::default().transfer(None).clear_error());
                    return true;
                }
                Err(BridgeError::AddrInUse) if policy.allows_retry(retries) => {
                    warn!(retries, "send port still in use, tearing group down before retry");
                    let _ = self.bridge.remove_group().await;
                    sleep(policy.delay_for(retries)).await;
                    retries += 1;
                }
                Err(e) => {
                    error!(error = %e, "send failed");
                    self.update_state(StateUpdate::default().set_error(e.user_message()));
                    return false;
                }
            }
        }
    }

    /// Receive one file into the managed namespace. The bridge writes to
    /// `Temp/`; on completion the file is validated and moved to
    /// `Received/`. Transient failures get a retry after discovery and
    /// group cleanup, with growing backoff.
    pub async fn receive_file(&self) -> Option<PathBuf> {
        let temp_dir = self.files.directories().temp;
        let policy = self.config.receive_retry;
        let mut retries = 0u32;
        loop {
            match self.bridge.receive_file(&temp_dir, ReceiveMode::Single).await {
                Ok(temp_file) => {
                    let original_name = file_name(&temp_file);
                    match self.files.handle_received_file(&temp_file, &original_name).await {
                        Ok(final_path) => {
                            info!(path = %final_path.display(), "file received");
                            self.update_state(
                                StateUpdate::default().transfer(None).clear_error(),
                            );
                            return Some(final_path);
                        }
                        Err(e) => {
                            error!(error = %e, "received file rejected");
                            self.update_state(StateUpdate::default().set_error(e.to_string()));
                            return None;
                        }
                    }
                }
                Err(e) if e.is_transient() && policy.allows_retry(retries) => {
                    warn!(error = %e, retries, "receive failed, cleaning up before retry");
                    let _ = self.bridge.stop_discovering_peers().await;
                    let _ = self.bridge.remove_group().await;
                    sleep(policy.delay_for(retries)).await;
                    retries += 1;
                }
                Err(e) => {
                    error!(error = %e, "receive failed");
                    self.update_state(StateUpdate::default().set_error(e.user_message()));
                    return None;
                }
            }
        }
    }

    /// Find an on-disk copy of a catalog video: the `src` hint when it is
    /// a local path that exists, otherwise a fuzzy scan of the managed
    /// directories.
    pub async fn local_video_path(&self, video: &VideoDescriptor) -> Option<PathBuf> {
        if let Some(src) = &video.src {
            if is_local_media_path(src) {
                let path = PathBuf::from(src);
                if self.files.exists(&path).await {
                    return Some(path);
                }
            }
        }

        for file in self.files.list_files().await {
            let stem = Path::new(&file.name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(file.name.as_str());
            if stem_matches(stem, video) {
                debug!(name = %file.name, "matched local copy");
                return Some(file.path);
            }
        }
        None
    }

    /// Active group details, if a group exists.
    pub async fn group_info(&self) -> Option<GroupInfo> {
        self.bridge.get_group_info().await.ok().flatten()
    }

    /// Whether the system WiFi hotspot is currently up.
    pub async fn is_hotspot_enabled(&self) -> bool {
        self.bridge.is_wifi_hotspot_enabled().await.unwrap_or(false)
    }

    /// Whether the platform reports WiFi Direct support.
    pub async fn is_wifi_direct_supported(&self) -> bool {
        self.bridge.is_wifi_direct_supported().await.unwrap_or(false)
    }

    /// Tear everything down: background tasks, listeners, discovery.
    /// The instance stays usable for state reads afterwards.
    pub async fn shutdown(&self) {
        info!("p2p service shutting down");
        if let Some(task) = self.refresh_task.lock().take() {
            task.abort();
        }
        for task in self.bridge_tasks.lock().drain(..) {
            task.abort();
        }
        if self.get_state().is_discovering {
            let _ = self.bridge.stop_discovering_peers().await;
        }
        self.listeners.lock().clear();

        let mut state = self.state.lock();
        state.is_discovering = false;
        state.is_connected = false;
    }

    // --- internals ---

    fn spawn_bridge_listeners(self: &Arc<Self>) {
        let mut tasks = Vec::new();

        let mut peers_rx = self.bridge.subscribe_peers_updates();
        let weak = Arc::downgrade(self);
        tasks.push(tokio::spawn(async move {
            while let Some(batch) = peers_rx.recv().await {
                let Some(service) = weak.upgrade() else { break };
                service.apply_device_batch(batch);
            }
        }));

        let mut conn_rx = self.bridge.subscribe_connection_updates();
        let weak = Arc::downgrade(self);
        tasks.push(tokio::spawn(async move {
            while let Some(info) = conn_rx.recv().await {
                let Some(service) = weak.upgrade() else { break };
                service.update_state(
                    StateUpdate::default()
                        .connected(info.group_formed)
                        .group_owner(info.is_group_owner),
                );
            }
        }));

        let mut transfer_rx = self.bridge.subscribe_transfer_updates();
        let weak = Arc::downgrade(self);
        tasks.push(tokio::spawn(async move {
            while let Some(update) = transfer_rx.recv().await {
                let Some(service) = weak.upgrade() else { break };
                service.apply_transfer_update(update);
            }
        }));

        *self.bridge_tasks.lock() = tasks;
    }

    fn apply_transfer_update(&self, update: TransferUpdate) {
        let id = match update.direction {
            TransferDirection::Send => "send",
            TransferDirection::Receive => "receive",
        };
        let status = if update.progress >= 100.0 {
            TransferStatus::Completed
        } else {
            TransferStatus::Transferring
        };
        let progress = TransferProgress {
            id: id.to_string(),
            file_name: update.file_name.unwrap_or_default(),
            progress: update.progress,
            bytes_transferred: 0,
            total_bytes: 0,
            speed: 0.0,
            status,
        };
        self.files.update_transfer_progress(&progress);
        self.update_state(StateUpdate::default().transfer(Some(progress)));
    }

    fn spawn_peer_refresh(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let interval = self.config.peer_refresh_interval;
        let handle = tokio::spawn(async move {
            loop {
                sleep(interval).await;
                let Some(service) = weak.upgrade() else { break };
                if !service.get_state().is_discovering {
                    break;
                }
                service.refresh_device_list().await;
            }
        });
        if let Some(previous) = self.refresh_task.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Poll the bridge for a formed group until the connect budget runs
    /// out. Polling queries fresh connection info every cycle; relying on
    /// push updates alone loses a race on some firmwares.
    async fn await_group_formed(&self) -> bool {
        let deadline = Instant::now() + self.config.connect_timeout;
        while Instant::now() < deadline {
            if let Ok(info) = self.bridge.get_connection_info().await {
                if info.group_formed {
                    self.update_state(
                        StateUpdate::default()
                            .connected(true)
                            .group_owner(info.is_group_owner)
                            .clear_error(),
                    );
                    return true;
                }
            }
            sleep(self.config.connect_poll_interval).await;
        }
        self.update_state(
            StateUpdate::default()
                .connected(false)
                .set_error(ERR_CONNECT_TIMEOUT),
        );
        false
    }

    async fn try_hotspot_fallback(&self) {
        if !self.bridge.is_wifi_hotspot_enabled().await.unwrap_or(false) {
            return;
        }
        info!("hotspot came up mid-discovery, opening settings");
        if let Err(e) = self.bridge.open_wifi_hotspot_settings().await {
            debug!(error = %e, "could not open hotspot settings");
            return;
        }
        sleep(self.config.hotspot_recheck_delay).await;
        if self.bridge.is_wifi_hotspot_enabled().await.unwrap_or(false) {
            warn!("hotspot still enabled, next discovery attempt will likely fail");
        }
    }

    fn update_state(&self, update: StateUpdate) {
        let snapshot = {
            let mut state = self.state.lock();
            update.apply(&mut state);
            state.clone()
        };
        self.notify(&snapshot);
    }

    fn notify(&self, snapshot: &P2pServiceState) {
        let listeners: Vec<(u64, Listener)> = self.listeners.lock().clone();
        for (id, listener) in listeners {
            invoke_listener(id, &listener, snapshot);
        }
    }
}

/// A panicking listener must not take down the service or its peers.
fn invoke_listener(id: u64, listener: &Listener, snapshot: &P2pServiceState) {
    if std::panic::catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
        error!(listener = id, "state listener panicked");
    }
}
