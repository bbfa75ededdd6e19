// Copyright 2025 Spred Team.
//
// Nearby Connections adapter.
//
// No compatible Nearby Connections binding exists yet; `GoogleNearby` is
// the extension point for one. Every call fails with
// `BridgeError::Unavailable` so callers fall back to WiFi Direct, which is
// exactly the escalation order the coordination layer relies on.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::error::BridgeError;

/// Contract of a Nearby Connections style binding (advertise / discover /
/// connect / send).
#[async_trait]
pub trait NearbyBridge: Send + Sync {
    async fn initialize(&self) -> Result<(), BridgeError>;
    async fn start_advertising(&self, device_name: &str) -> Result<(), BridgeError>;
    async fn stop_advertising(&self) -> Result<(), BridgeError>;
    async fn start_discovery(&self) -> Result<(), BridgeError>;
    async fn stop_discovery(&self) -> Result<(), BridgeError>;
    async fn request_connection(&self, endpoint_id: &str) -> Result<(), BridgeError>;
    async fn send_file(&self, endpoint_id: &str, path: &Path) -> Result<(), BridgeError>;
    async fn disconnect(&self, endpoint_id: &str) -> Result<(), BridgeError>;
}

/// Placeholder adapter for Google Nearby Connections.
#[derive(Debug, Default)]
pub struct GoogleNearby;

impl GoogleNearby {
    pub fn new() -> Self {
        debug!("GoogleNearby adapter created without a native binding");
        Self
    }
}

#[async_trait]
impl NearbyBridge for GoogleNearby {
    async fn initialize(&self) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }

    async fn start_advertising(&self, _device_name: &str) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }

    async fn stop_advertising(&self) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }

    async fn start_discovery(&self) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }

    async fn stop_discovery(&self) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }

    async fn request_connection(&self, _endpoint_id: &str) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }

    async fn send_file(&self, _endpoint_id: &str, _path: &Path) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }

    async fn disconnect(&self, _endpoint_id: &str) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }
}
