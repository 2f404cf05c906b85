//! Status values reported to engine hooks while provisioners run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Progress of a provisioner attached to a resource instance.
///
/// The wire value is a single byte, and hosts may send values this crate
/// does not know; those still render, as `ProvisionerStatus(<n>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvisionerStatus(pub u8);

impl ProvisionerStatus {
    /// No status has been reported.
    pub const INVALID: Self = Self(0);
    /// The provisioner is running.
    pub const PROVISIONING: Self = Self(b'p');
    /// The provisioner finished successfully.
    pub const PROVISIONED: Self = Self(b'P');
    /// The provisioner failed.
    pub const ERRORED: Self = Self(b'E');

    /// The label of a known status.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::INVALID => Some("ProvisionerStatusInvalid"),
            Self::ERRORED => Some("ProvisionerErrored"),
            Self::PROVISIONED => Some("ProvisionerProvisioned"),
            Self::PROVISIONING => Some("ProvisionerProvisioning"),
            _ => None,
        }
    }
}

impl From<u8> for ProvisionerStatus {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProvisionerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(label),
            None => write!(f, "ProvisionerStatus({})", self.0),
        }
    }
}
