//! User-facing recovery guidance for P2P failures.
//!
//! Triage is keyword-based over the stored error message. Messages come
//! from [`spred_bridge::BridgeError::user_message`] and from the service's
//! own precondition checks, so the keywords here stay in sync with those.

/// Actionable guidance attached to an error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorGuidance {
    pub title: String,
    pub message: String,
    /// Short imperative steps the user can take, in order.
    pub actions: Vec<String>,
}

impl ErrorGuidance {
    fn new(title: &str, message: &str, actions: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Map a raw error message to guidance. Falls back to a generic
/// connection-error card when no category matches.
pub fn error_guidance(raw: &str) -> ErrorGuidance {
    let msg = raw.to_lowercase();

    if msg.contains("permission") {
        return ErrorGuidance::new(
            "Permissions Needed",
            "Spred needs location and nearby-devices permissions to find peers.",
            &[
                "Open app settings",
                "Allow Location and Nearby devices",
                "Return to Spred and retry",
            ],
        );
    }
    if msg.contains("hotspot") {
        return ErrorGuidance::new(
            "Hotspot Conflict",
            "A mobile hotspot blocks WiFi Direct on most devices.",
            &["Open hotspot settings", "Turn the hotspot off", "Retry discovery"],
        );
    }
    if msg.contains("location") {
        return ErrorGuidance::new(
            "Location Disabled",
            "The platform requires location services for peer discovery.",
            &["Open location settings", "Enable location", "Retry discovery"],
        );
    }
    if msg.contains("wifi") && (msg.contains("disabled") || msg.contains("enable")) {
        return ErrorGuidance::new(
            "WiFi Disabled",
            "Peer-to-peer sharing runs over WiFi Direct and needs WiFi on.",
            &["Open WiFi settings", "Turn WiFi on", "Retry discovery"],
        );
    }
    if msg.contains("busy") || msg.contains("eaddrinuse") || msg.contains("address already in use")
    {
        return ErrorGuidance::new(
            "Framework Busy",
            "The P2P framework is still tearing down a previous session.",
            &["Wait a few seconds", "Retry the transfer"],
        );
    }
    if msg.contains("timed out") || msg.contains("timeout") || msg.contains("no devices") {
        return ErrorGuidance::new(
            "No Devices Found",
            "Discovery finished without finding a peer.",
            &[
                "Move the devices closer together",
                "Make sure the other device is sharing",
                "Retry discovery",
            ],
        );
    }
    if msg.contains("not support") || msg.contains("unsupported") {
        return ErrorGuidance::new(
            "Device Not Supported",
            "This device cannot create WiFi Direct connections.",
            &["Use another device to share", "Transfer over a shared network instead"],
        );
    }

    ErrorGuidance::new(
        "Connection Error",
        "Something went wrong with the peer-to-peer connection.",
        &["Retry the operation", "Restart discovery if it keeps failing"],
    )
}
