//! What each host style can do.

use protocol::DisplayMode;

use crate::host::HostType;
use crate::{Error, Result};

/// An operation that not every host can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DisplayMode(DisplayMode),
    FileUpload,
    FileDownload,
}

impl Capability {
    /// Operation name used in error messages.
    pub fn operation(&self) -> &'static str {
        match self {
            Capability::DisplayMode(DisplayMode::Modal) => "display mode \"modal\"",
            Capability::DisplayMode(_) => "requestDisplayMode",
            Capability::FileUpload => "uploadFile",
            Capability::FileDownload => "getFileDownloadUrl",
        }
    }

    /// The error reported when `host` lacks this capability.
    pub fn unsupported_on(self, host: HostType) -> Error {
        Error::Unsupported {
            operation: self.operation(),
            host,
        }
    }
}

/// Result of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl HostType {
    /// Check whether this host style can perform `capability`.
    pub fn check(&self, capability: Capability) -> Decision {
        let supported = match (self, capability) {
            (HostType::Direct, _) => true,
            (HostType::MessagePassing, Capability::DisplayMode(mode)) => mode != DisplayMode::Modal,
            (HostType::MessagePassing, Capability::FileUpload | Capability::FileDownload) => false,
        };

        if supported {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    /// Fail fast with [`Error::Unsupported`] when `capability` is missing.
    pub fn require(&self, capability: Capability) -> Result<()> {
        match self.check(capability) {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(capability.unsupported_on(*self)),
        }
    }
}
