// Copyright 2025 Spred Team.
//
// Error taxonomy for native bridge calls.

use thiserror::Error;

/// Raw platform error codes surfaced by the WiFi P2P native module.
///
/// Codes below 0x3 are the documented WifiP2pManager failure reasons;
/// 0x3-0x7 show up on some vendor firmwares without documentation.
pub const CODE_FRAMEWORK_BUSY: u32 = 0x2;
pub const CODE_VENDOR_MIN: u32 = 0x3;
pub const CODE_VENDOR_MAX: u32 = 0x7;

/// Errors crossing the native-module boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("native module already initialized")]
    AlreadyInitialized,
    #[error("P2P framework is busy")]
    Busy,
    #[error("address already in use (EADDRINUSE)")]
    AddrInUse,
    #[error("operation failed")]
    OperationFailed,
    #[error("WiFi Direct is not supported on this device")]
    Unsupported,
    #[error("operation timed out")]
    Timeout,
    #[error("native module is not available")]
    Unavailable,
    #[error("platform error code {0:#x}")]
    Platform(u32),
    #[error("{0}")]
    Other(String),
}

impl BridgeError {
    /// Map a raw platform code to a typed error.
    pub fn from_platform_code(code: u32) -> Self {
        match code {
            0x1 => Self::Unsupported,
            CODE_FRAMEWORK_BUSY => Self::Busy,
            c if (CODE_VENDOR_MIN..=CODE_VENDOR_MAX).contains(&c) => Self::Platform(c),
            c => Self::Platform(c),
        }
    }

    /// Transient failures are worth retrying after a cleanup step;
    /// everything else aborts the operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy | Self::AddrInUse | Self::OperationFailed)
    }

    /// The user-facing message for this error, as surfaced in service state.
    pub fn user_message(&self) -> String {
        match self {
            Self::Busy => "The P2P framework is busy. Please wait and try again.".to_string(),
            Self::AddrInUse => {
                "A previous transfer is still releasing its port. Retrying shortly.".to_string()
            }
            Self::Unsupported => {
                "This device does not support WiFi Direct connections.".to_string()
            }
            Self::Timeout => "The operation timed out.".to_string(),
            Self::Unavailable => "The P2P module is not available on this device.".to_string(),
            Self::Platform(code) => format!("P2P platform error ({code:#x})."),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_codes_map_to_platform_variant() {
        for code in CODE_VENDOR_MIN..=CODE_VENDOR_MAX {
            assert_eq!(
                BridgeError::from_platform_code(code),
                BridgeError::Platform(code)
            );
        }
    }

    #[test]
    fn busy_and_addr_in_use_are_transient() {
        assert!(BridgeError::Busy.is_transient());
        assert!(BridgeError::AddrInUse.is_transient());
        assert!(BridgeError::OperationFailed.is_transient());
        assert!(!BridgeError::Unsupported.is_transient());
        assert!(!BridgeError::Timeout.is_transient());
    }
}
