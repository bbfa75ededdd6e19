//! Spred P2P - coordination layer for peer-to-peer video transfers
//!
//! This crate sits between the UI and the native transports:
//! - Transport selection: Nearby Connections first, WiFi Direct fallback
//! - Discovery with retry, hotspot-conflict nudging and device aging
//! - Connection with escalation up to self-hosted group ownership
//! - Send/receive orchestration over the managed file namespace
//! - One observable state snapshot, published on every transition
//!
//! Failures surface as user-facing messages in the published state;
//! operations return plain success indicators the UI can branch on.

pub mod config;
pub mod guidance;
pub mod resolve;
pub mod retry;
pub mod service;
pub mod state;

pub use config::P2pConfig;
pub use guidance::{error_guidance, ErrorGuidance};
pub use resolve::VideoDescriptor;
pub use retry::{Backoff, RetryPolicy};
pub use service::{P2pService, Subscription};
pub use state::{
    merge_device_lists, ConnectionMethod, P2pServiceState, StateUpdate, TrackedDevice, DEVICE_TTL,
};
