// Copyright 2025 Spred Team.
//
// Spred Bridge - typed contracts for the native P2P modules.
//
// The WiFi Direct transport, discovery algorithm and wire protocol live
// inside platform code outside this workspace. This crate pins down the
// call/response contract the coordination layer depends on, so the
// orchestrator can be driven by a real binding in production and by mocks
// in tests.

pub mod error;
pub mod nearby;
pub mod types;

pub use error::BridgeError;
pub use nearby::{GoogleNearby, NearbyBridge};
pub use types::{
    ConnectionInfo, Device, DeviceStatus, GroupInfo, ReceiveMode, TransferDirection,
    TransferUpdate,
};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Contract of the WiFi Direct native module.
///
/// Every method maps to one native call and may reject with a platform
/// error code; `BridgeError::from_platform_code` recovers the typed form.
/// Push-style native callbacks (peer lists, connection info, transfer
/// progress) are exposed as channels: the binding sends an update whenever
/// the platform fires the corresponding callback.
#[async_trait]
pub trait WifiDirectBridge: Send + Sync {
    // System preconditions
    async fn check_permissions(&self) -> Result<bool, BridgeError>;
    async fn request_permissions(&self) -> Result<bool, BridgeError>;
    async fn is_location_enabled(&self) -> Result<bool, BridgeError>;
    async fn is_wifi_enabled(&self) -> Result<bool, BridgeError>;
    async fn is_wifi_hotspot_enabled(&self) -> Result<bool, BridgeError>;
    async fn is_wifi_direct_supported(&self) -> Result<bool, BridgeError>;

    // Lifecycle
    async fn initialize(&self) -> Result<(), BridgeError>;

    // Discovery
    async fn start_discovering_peers(&self) -> Result<(), BridgeError>;
    async fn stop_discovering_peers(&self) -> Result<(), BridgeError>;
    async fn get_available_peers(&self) -> Result<Vec<Device>, BridgeError>;

    // Connection and group management
    async fn connect(&self, device_address: &str) -> Result<(), BridgeError>;
    async fn create_group(&self) -> Result<(), BridgeError>;
    async fn remove_group(&self) -> Result<(), BridgeError>;
    async fn get_group_info(&self) -> Result<Option<GroupInfo>, BridgeError>;
    async fn get_connection_info(&self) -> Result<ConnectionInfo, BridgeError>;

    // File transfer
    async fn send_file(&self, path: &Path) -> Result<(), BridgeError>;
    async fn receive_file(&self, dest: &Path, mode: ReceiveMode) -> Result<PathBuf, BridgeError>;

    // Settings intents, used to nudge the user out of a failed precondition
    async fn open_app_settings(&self) -> Result<(), BridgeError>;
    async fn open_wifi_settings(&self) -> Result<(), BridgeError>;
    async fn open_wifi_hotspot_settings(&self) -> Result<(), BridgeError>;
    async fn open_location_settings(&self) -> Result<(), BridgeError>;

    // Push updates
    fn subscribe_peers_updates(&self) -> mpsc::UnboundedReceiver<Vec<Device>>;
    fn subscribe_connection_updates(&self) -> mpsc::UnboundedReceiver<ConnectionInfo>;
    fn subscribe_transfer_updates(&self) -> mpsc::UnboundedReceiver<TransferUpdate>;
}
