use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CallError;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PermissionKind {
    Camera,
    Microphone,
    Location,
    Notifications,
    Contacts,
    PhotoLibrary,
}

impl PermissionKind {
    pub const ALL: [PermissionKind; 6] = [
        PermissionKind::Camera,
        PermissionKind::Microphone,
        PermissionKind::Location,
        PermissionKind::Notifications,
        PermissionKind::Contacts,
        PermissionKind::PhotoLibrary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Camera => "camera",
            PermissionKind::Microphone => "microphone",
            PermissionKind::Location => "location",
            PermissionKind::Notifications => "notifications",
            PermissionKind::Contacts => "contacts",
            PermissionKind::PhotoLibrary => "photo library",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    NotDetermined,
    Granted,
    Denied,
    Restricted,
}

impl Default for PermissionStatus {
    fn default() -> Self {
        PermissionStatus::NotDetermined
    }
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Platform permission prompts, expressed as request/response instead of delegate callbacks.
#[async_trait]
pub trait PermissionService: Send + Sync {
    fn status(&self, kind: PermissionKind) -> PermissionStatus;

    /// Prompts the user if the status is still undetermined and returns the outcome.
    async fn request(&self, kind: PermissionKind) -> PermissionStatus;
}

/// What the device lets a call use. Missing capture permissions degrade the call to
/// speech-only; they never stop it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureCapabilities {
    pub camera: bool,
    pub microphone: bool,
}

impl Default for CaptureCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

impl CaptureCapabilities {
    pub fn full() -> Self {
        Self {
            camera: true,
            microphone: true,
        }
    }

    pub fn speech_only() -> Self {
        Self {
            camera: false,
            microphone: false,
        }
    }

    /// Recording needs at least one capture source.
    pub fn can_record(&self) -> bool {
        self.camera || self.microphone
    }

    /// Reads camera and microphone status, prompting for whichever is undetermined.
    pub async fn resolve(service: &dyn PermissionService) -> Self {
        let camera = resolve_one(service, PermissionKind::Camera).await;
        let microphone = resolve_one(service, PermissionKind::Microphone).await;
        Self { camera, microphone }
    }
}

async fn resolve_one(service: &dyn PermissionService, kind: PermissionKind) -> bool {
    let status = match service.status(kind) {
        PermissionStatus::NotDetermined => service.request(kind).await,
        status => status,
    };
    if !status.is_granted() {
        log_warn!("{kind} permission is {status:?}; continuing without it");
    }
    status.is_granted()
}

/// Everything the setup screen should still ask for.
pub fn missing_permissions(service: &dyn PermissionService) -> Vec<CallError> {
    PermissionKind::ALL
        .into_iter()
        .filter(|kind| !service.status(*kind).is_granted())
        .map(CallError::PermissionUnavailable)
        .collect()
}
