// Copyright 2025 Spred Team.
//
// Spred Bridge Types
//
// Types crossing the native-module boundary:
// - Discovered devices and their status codes
// - Connection and group snapshots
// - Transfer progress updates pushed by the native layer

use serde::{Deserialize, Serialize};

/// Status reported by the native layer for a discovered device.
///
/// The numeric codes come from the platform WiFi P2P manager. Their exact
/// semantics are not formally documented by the native module, so unknown
/// codes are preserved rather than rejected. Serializes as the raw code,
/// matching the bridge payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum DeviceStatus {
    /// 0 - device is available for connection
    Available,
    /// 1 - an invitation has been sent to the device
    Invited,
    /// 2 - the last connection attempt failed
    Failed,
    /// 3 - also reported as available by some firmwares
    AvailableAlt,
    /// 4 - device went out of range
    OutOfRange,
    /// Any code the native layer reports that we do not know about
    Unknown(u8),
}

impl DeviceStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Available,
            1 => Self::Invited,
            2 => Self::Failed,
            3 => Self::AvailableAlt,
            4 => Self::OutOfRange,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Available => 0,
            Self::Invited => 1,
            Self::Failed => 2,
            Self::AvailableAlt => 3,
            Self::OutOfRange => 4,
            Self::Unknown(code) => *code,
        }
    }

    /// Whether a connection attempt to this device is worth making.
    pub fn is_connectable(&self) -> bool {
        matches!(self, Self::Available | Self::AvailableAlt)
    }
}

impl From<u8> for DeviceStatus {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<DeviceStatus> for u8 {
    fn from(status: DeviceStatus) -> Self {
        status.code()
    }
}

/// A peer device as reported by native discovery callbacks.
///
/// Identity key is `device_address` (the MAC-like address assigned by the
/// platform); `device_name` is the human-readable name and may collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_name: String,
    pub device_address: String,
    pub status: DeviceStatus,
}

impl Device {
    pub fn new(name: impl Into<String>, address: impl Into<String>, status: DeviceStatus) -> Self {
        Self {
            device_name: name.into(),
            device_address: address.into(),
            status,
        }
    }
}

/// Snapshot of the current P2P connection as seen by the native layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    /// True once the group negotiation has completed.
    pub group_formed: bool,
    /// True when the local device owns the group.
    pub is_group_owner: bool,
    /// Address of the group owner, when a group is formed.
    pub group_owner_address: Option<String>,
}

impl ConnectionInfo {
    /// A usable connection: the group exists and has an owner address.
    pub fn is_usable(&self) -> bool {
        self.group_formed && (self.is_group_owner || self.group_owner_address.is_some())
    }
}

/// Information about the active WiFi Direct group, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub network_name: String,
    pub is_group_owner: bool,
    pub owner_address: Option<String>,
    pub client_count: usize,
}

/// How the native receive loop should behave.
///
/// Provisional: the native module takes an opaque mode argument; these two
/// are the modes the application actually uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveMode {
    /// Accept one incoming file and resolve when it is complete.
    Single,
    /// Keep accepting files until the group is torn down.
    Continuous,
}

/// Direction of an in-flight transfer, for progress routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Send,
    Receive,
}

/// Progress update pushed by the native layer during a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferUpdate {
    pub direction: TransferDirection,
    /// Percentage in `0.0..=100.0`.
    pub progress: f64,
    pub file_name: Option<String>,
}
