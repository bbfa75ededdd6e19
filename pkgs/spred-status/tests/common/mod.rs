// Copyright 2025 Spred Team.
//
// Bridge doubles for the checker tests. Only the probes the checker
// derives from are scriptable; every operation succeeds so the service
// can be walked into any state the checker needs to observe.

use async_trait::async_trait;
use parking_lot::Mutex;
use spred_bridge::{
    BridgeError, ConnectionInfo, Device, GoogleNearby, GroupInfo, ReceiveMode, TransferUpdate,
    WifiDirectBridge,
};
use spred_files::{FileService, FileServiceConfig};
use spred_p2p::{P2pConfig, P2pService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct StubBridge {
    pub permissions_granted: Mutex<bool>,
    pub location_enabled: Mutex<bool>,
    pub wifi_enabled: Mutex<bool>,
    pub hotspot_enabled: Mutex<bool>,
    pub wifi_direct_supported: Mutex<bool>,
    pub connection_info: Mutex<ConnectionInfo>,
    pub group_info: Mutex<Option<GroupInfo>>,
}

impl Default for StubBridge {
    fn default() -> Self {
        Self {
            permissions_granted: Mutex::new(true),
            location_enabled: Mutex::new(true),
            wifi_enabled: Mutex::new(true),
            hotspot_enabled: Mutex::new(false),
            wifi_direct_supported: Mutex::new(true),
            connection_info: Mutex::new(ConnectionInfo::default()),
            group_info: Mutex::new(None),
        }
    }
}

impl StubBridge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_group(&self, network_name: &str, client_count: usize) {
        *self.group_info.lock() = Some(GroupInfo {
            network_name: network_name.to_string(),
            is_group_owner: true,
            owner_address: Some("192.168.49.1".to_string()),
            client_count,
        });
        *self.connection_info.lock() = ConnectionInfo {
            group_formed: true,
            is_group_owner: true,
            group_owner_address: Some("192.168.49.1".to_string()),
        };
    }
}

#[async_trait]
impl WifiDirectBridge for StubBridge {
    async fn check_permissions(&self) -> Result<bool, BridgeError> {
        Ok(*self.permissions_granted.lock())
    }

    async fn request_permissions(&self) -> Result<bool, BridgeError> {
        Ok(*self.permissions_granted.lock())
    }

    async fn is_location_enabled(&self) -> Result<bool, BridgeError> {
        Ok(*self.location_enabled.lock())
    }

    async fn is_wifi_enabled(&self) -> Result<bool, BridgeError> {
        Ok(*self.wifi_enabled.lock())
    }

    async fn is_wifi_hotspot_enabled(&self) -> Result<bool, BridgeError> {
        Ok(*self.hotspot_enabled.lock())
    }

    async fn is_wifi_direct_supported(&self) -> Result<bool, BridgeError> {
        Ok(*self.wifi_direct_supported.lock())
    }

    async fn initialize(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn start_discovering_peers(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn stop_discovering_peers(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn get_available_peers(&self) -> Result<Vec<Device>, BridgeError> {
        Ok(Vec::new())
    }

    async fn connect(&self, _device_address: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn create_group(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn remove_group(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn get_group_info(&self) -> Result<Option<GroupInfo>, BridgeError> {
        Ok(self.group_info.lock().clone())
    }

    async fn get_connection_info(&self) -> Result<ConnectionInfo, BridgeError> {
        Ok(self.connection_info.lock().clone())
    }

    async fn send_file(&self, _path: &Path) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn receive_file(
        &self,
        _dest: &Path,
        _mode: ReceiveMode,
    ) -> Result<PathBuf, BridgeError> {
        Err(BridgeError::OperationFailed)
    }

    async fn open_app_settings(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn open_wifi_settings(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn open_wifi_hotspot_settings(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn open_location_settings(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    fn subscribe_peers_updates(&self) -> mpsc::UnboundedReceiver<Vec<Device>> {
        mpsc::unbounded_channel().1
    }

    fn subscribe_connection_updates(&self) -> mpsc::UnboundedReceiver<ConnectionInfo> {
        mpsc::unbounded_channel().1
    }

    fn subscribe_transfer_updates(&self) -> mpsc::UnboundedReceiver<TransferUpdate> {
        mpsc::unbounded_channel().1
    }
}

/// Nearby has no binding (the stock [`GoogleNearby`] stub), so the
/// service always lands on WiFi Direct.
pub fn service_with(bridge: Arc<StubBridge>, base_dir: &Path) -> Arc<P2pService> {
    init_tracing();
    let files = Arc::new(FileService::new(FileServiceConfig::new(base_dir)));
    P2pService::new(bridge, Arc::new(GoogleNearby), files, P2pConfig::default())
}

/// Opt-in test logging: `RUST_LOG=spred_status=debug cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
