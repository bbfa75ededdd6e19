// Copyright 2025 Spred Team.
//
// Scriptable native-bridge doubles used across the integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use spred_bridge::{
    BridgeError, ConnectionInfo, Device, GroupInfo, NearbyBridge, ReceiveMode, TransferUpdate,
    WifiDirectBridge,
};
use spred_files::{FileService, FileServiceConfig};
use spred_p2p::{P2pConfig, P2pService, RetryPolicy};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// WiFi Direct double. Precondition switches and per-call result queues
/// are public; every call is recorded by method name so tests can assert
/// on attempt counts. Empty queues fall back to a benign default.
pub struct MockBridge {
    pub calls: Mutex<Vec<&'static str>>,

    pub permissions_granted: Mutex<bool>,
    pub request_grants: Mutex<bool>,
    pub location_enabled: Mutex<bool>,
    pub wifi_enabled: Mutex<bool>,
    pub hotspot_enabled: Mutex<bool>,
    /// Scripted answers for `is_wifi_hotspot_enabled`, consumed in order
    /// before falling back to `hotspot_enabled`.
    pub hotspot_checks: Mutex<VecDeque<bool>>,
    pub wifi_direct_supported: Mutex<bool>,

    pub init_results: Mutex<VecDeque<Result<(), BridgeError>>>,
    pub discover_results: Mutex<VecDeque<Result<(), BridgeError>>>,
    pub connect_results: Mutex<VecDeque<Result<(), BridgeError>>>,
    pub create_group_results: Mutex<VecDeque<Result<(), BridgeError>>>,
    pub send_results: Mutex<VecDeque<Result<(), BridgeError>>>,
    pub receive_results: Mutex<VecDeque<Result<PathBuf, BridgeError>>>,

    pub peers: Mutex<Vec<Device>>,
    pub connection_info: Mutex<ConnectionInfo>,
    pub group_info: Mutex<Option<GroupInfo>>,
    /// When set, `create_group` flips `connection_info` to a formed,
    /// self-owned group, the way the platform reports it.
    pub group_forms_on_create: Mutex<bool>,

    peers_senders: Mutex<Vec<mpsc::UnboundedSender<Vec<Device>>>>,
    connection_senders: Mutex<Vec<mpsc::UnboundedSender<ConnectionInfo>>>,
    transfer_senders: Mutex<Vec<mpsc::UnboundedSender<TransferUpdate>>>,
}

impl Default for MockBridge {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            permissions_granted: Mutex::new(true),
            request_grants: Mutex::new(false),
            location_enabled: Mutex::new(true),
            wifi_enabled: Mutex::new(true),
            hotspot_enabled: Mutex::new(false),
            hotspot_checks: Mutex::new(VecDeque::new()),
            wifi_direct_supported: Mutex::new(true),
            init_results: Mutex::new(VecDeque::new()),
            discover_results: Mutex::new(VecDeque::new()),
            connect_results: Mutex::new(VecDeque::new()),
            create_group_results: Mutex::new(VecDeque::new()),
            send_results: Mutex::new(VecDeque::new()),
            receive_results: Mutex::new(VecDeque::new()),
            peers: Mutex::new(Vec::new()),
            connection_info: Mutex::new(ConnectionInfo::default()),
            group_info: Mutex::new(None),
            group_forms_on_create: Mutex::new(false),
            peers_senders: Mutex::new(Vec::new()),
            connection_senders: Mutex::new(Vec::new()),
            transfer_senders: Mutex::new(Vec::new()),
        }
    }
}

impl MockBridge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().push(name);
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == name).count()
    }

    pub fn set_connected(&self, group_formed: bool, is_group_owner: bool) {
        *self.connection_info.lock() = ConnectionInfo {
            group_formed,
            is_group_owner,
            group_owner_address: group_formed.then(|| "192.168.49.1".to_string()),
        };
    }

    pub fn push_peers(&self, batch: Vec<Device>) {
        for tx in self.peers_senders.lock().iter() {
            let _ = tx.send(batch.clone());
        }
    }

    pub fn push_transfer(&self, update: TransferUpdate) {
        for tx in self.transfer_senders.lock().iter() {
            let _ = tx.send(update.clone());
        }
    }

    pub fn push_connection(&self, info: ConnectionInfo) {
        for tx in self.connection_senders.lock().iter() {
            let _ = tx.send(info.clone());
        }
    }
}

#[async_trait]
impl WifiDirectBridge for MockBridge {
    async fn check_permissions(&self) -> Result<bool, BridgeError> {
        self.record("check_permissions");
        Ok(*self.permissions_granted.lock())
    }

    async fn request_permissions(&self) -> Result<bool, BridgeError> {
        self.record("request_permissions");
        let granted = *self.request_grants.lock();
        *self.permissions_granted.lock() = granted;
        Ok(granted)
    }

    async fn is_location_enabled(&self) -> Result<bool, BridgeError> {
        Ok(*self.location_enabled.lock())
    }

    async fn is_wifi_enabled(&self) -> Result<bool, BridgeError> {
        Ok(*self.wifi_enabled.lock())
    }

    async fn is_wifi_hotspot_enabled(&self) -> Result<bool, BridgeError> {
        if let Some(scripted) = self.hotspot_checks.lock().pop_front() {
            return Ok(scripted);
        }
        Ok(*self.hotspot_enabled.lock())
    }

    async fn is_wifi_direct_supported(&self) -> Result<bool, BridgeError> {
        Ok(*self.wifi_direct_supported.lock())
    }

    async fn initialize(&self) -> Result<(), BridgeError> {
        self.record("initialize");
        self.init_results.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn start_discovering_peers(&self) -> Result<(), BridgeError> {
        self.record("start_discovering_peers");
        self.discover_results.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn stop_discovering_peers(&self) -> Result<(), BridgeError> {
        self.record("stop_discovering_peers");
        Ok(())
    }

    async fn get_available_peers(&self) -> Result<Vec<Device>, BridgeError> {
        self.record("get_available_peers");
        Ok(self.peers.lock().clone())
    }

    async fn connect(&self, _device_address: &str) -> Result<(), BridgeError> {
        self.record("connect");
        self.connect_results.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn create_group(&self) -> Result<(), BridgeError> {
        self.record("create_group");
        let result = self.create_group_results.lock().pop_front().unwrap_or(Ok(()));
        if result.is_ok() && *self.group_forms_on_create.lock() {
            self.set_connected(true, true);
        }
        result
    }

    async fn remove_group(&self) -> Result<(), BridgeError> {
        self.record("remove_group");
        Ok(())
    }

    async fn get_group_info(&self) -> Result<Option<GroupInfo>, BridgeError> {
        self.record("get_group_info");
        Ok(self.group_info.lock().clone())
    }

    async fn get_connection_info(&self) -> Result<ConnectionInfo, BridgeError> {
        self.record("get_connection_info");
        Ok(self.connection_info.lock().clone())
    }

    async fn send_file(&self, _path: &Path) -> Result<(), BridgeError> {
        self.record("send_file");
        self.send_results.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn receive_file(
        &self,
        _dest: &Path,
        _mode: ReceiveMode,
    ) -> Result<PathBuf, BridgeError> {
        self.record("receive_file");
        self.receive_results
            .lock()
            .pop_front()
            .unwrap_or(Err(BridgeError::OperationFailed))
    }

    async fn open_app_settings(&self) -> Result<(), BridgeError> {
        self.record("open_app_settings");
        Ok(())
    }

    async fn open_wifi_settings(&self) -> Result<(), BridgeError> {
        self.record("open_wifi_settings");
        Ok(())
    }

    async fn open_wifi_hotspot_settings(&self) -> Result<(), BridgeError> {
        self.record("open_wifi_hotspot_settings");
        Ok(())
    }

    async fn open_location_settings(&self) -> Result<(), BridgeError> {
        self.record("open_location_settings");
        Ok(())
    }

    fn subscribe_peers_updates(&self) -> mpsc::UnboundedReceiver<Vec<Device>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers_senders.lock().push(tx);
        rx
    }

    fn subscribe_connection_updates(&self) -> mpsc::UnboundedReceiver<ConnectionInfo> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connection_senders.lock().push(tx);
        rx
    }

    fn subscribe_transfer_updates(&self) -> mpsc::UnboundedReceiver<TransferUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.transfer_senders.lock().push(tx);
        rx
    }
}

/// Nearby double: fully available or fully unavailable.
pub struct StubNearby {
    pub available: bool,
    pub calls: Mutex<Vec<&'static str>>,
}

impl StubNearby {
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            available: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn available() -> Arc<Self> {
        Arc::new(Self {
            available: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn result(&self, name: &'static str) -> Result<(), BridgeError> {
        self.calls.lock().push(name);
        if self.available {
            Ok(())
        } else {
            Err(BridgeError::Unavailable)
        }
    }
}

#[async_trait]
impl NearbyBridge for StubNearby {
    async fn initialize(&self) -> Result<(), BridgeError> {
        self.result("initialize")
    }

    async fn start_advertising(&self, _device_name: &str) -> Result<(), BridgeError> {
        self.result("start_advertising")
    }

    async fn stop_advertising(&self) -> Result<(), BridgeError> {
        self.result("stop_advertising")
    }

    async fn start_discovery(&self) -> Result<(), BridgeError> {
        self.result("start_discovery")
    }

    async fn stop_discovery(&self) -> Result<(), BridgeError> {
        self.result("stop_discovery")
    }

    async fn request_connection(&self, _endpoint_id: &str) -> Result<(), BridgeError> {
        self.result("request_connection")
    }

    async fn send_file(&self, _endpoint_id: &str, _path: &Path) -> Result<(), BridgeError> {
        self.result("send_file")
    }

    async fn disconnect(&self, _endpoint_id: &str) -> Result<(), BridgeError> {
        self.result("disconnect")
    }
}

/// Production timings, compressed where a test would otherwise sit in
/// paused-clock sleeps for no extra coverage.
pub fn test_config() -> P2pConfig {
    P2pConfig {
        smart_connect_pause: Duration::from_millis(50),
        hotspot_recheck_delay: Duration::from_millis(10),
        send_retry: RetryPolicy::fixed(2, Duration::from_millis(20)),
        receive_retry: RetryPolicy::linear(
            3,
            Duration::from_millis(20),
            Duration::from_millis(10),
        ),
        ..P2pConfig::default()
    }
}

pub fn service_with(
    bridge: Arc<MockBridge>,
    nearby: Arc<StubNearby>,
    base_dir: &Path,
) -> Arc<P2pService> {
    init_tracing();
    let files = Arc::new(FileService::new(FileServiceConfig::new(base_dir)));
    P2pService::new(bridge, nearby, files, test_config())
}

/// Opt-in test logging: `RUST_LOG=spred_p2p=debug cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
