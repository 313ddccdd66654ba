// NVMe controller access
//
// - controller_data.rs: fixed layout of the Identify Controller response
// - extract.rs: trimming of space/NUL padded ASCII fields
// - platform/: ioctl passthrough backends (Linux, FreeBSD)

pub mod controller_data;
pub mod extract;
pub mod platform;

pub use controller_data::{ControllerData, CONTROLLER_DATA_LEN};
pub use extract::{extract, FieldString};
pub use platform::SystemDevices;

use std::io;
use std::path::Path;

/// Admin opcode for Identify.
pub const NVME_OPC_IDENTIFY: u8 = 0x06;

/// CNS value selecting the Identify Controller data structure.
pub const NVME_CNS_CONTROLLER: u32 = 1;

/// Namespace relationship of an open device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceInfo {
    /// Zero when the device is the controller itself.
    pub nsid: u32,

    /// Bare name of the owning controller device (e.g. `nvme0`).
    pub controller: String,
}

impl NamespaceInfo {
    pub fn controller(name: impl Into<String>) -> Self {
        Self {
            nsid: 0,
            controller: name.into(),
        }
    }

    pub fn is_controller(&self) -> bool {
        self.nsid == 0
    }
}

/// Status field of a completion queue entry, phase tag already removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionStatus(pub u16);

impl CompletionStatus {
    /// Decode from the raw 16-bit status word of a completion entry (bit 0 is the phase tag).
    pub fn from_completion_word(word: u16) -> Self {
        Self(word >> 1)
    }

    /// Status Code (SC).
    pub fn status_code(&self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// Status Code Type (SCT).
    pub fn status_code_type(&self) -> u8 {
        ((self.0 >> 8) & 0x7) as u8
    }

    pub fn is_error(&self) -> bool {
        self.status_code() != 0 || self.status_code_type() != 0
    }
}

/// Outcome of submitting an admin command through passthrough.
#[derive(Debug)]
pub enum IdentifyOutcome {
    /// The controller completed the command successfully.
    Completed(ControllerData),

    /// The command was delivered but the controller reported an error.
    Failed(CompletionStatus),
}

/// An open NVMe namespace, partition, or controller device.
///
/// The handle is closed when dropped.
pub trait NvmeDevice {
    /// Ask the device which namespace it is and which controller owns it.
    fn namespace(&self) -> io::Result<NamespaceInfo>;

    /// Submit Identify Controller and wait for it to complete.
    ///
    /// `Err` means the passthrough call itself failed; a controller-reported
    /// error comes back as `IdentifyOutcome::Failed`.
    fn identify_controller(&self) -> io::Result<IdentifyOutcome>;
}

/// Opens devices read-only.
pub trait DeviceOpener {
    type Device: NvmeDevice;

    fn open(&self, path: &Path) -> io::Result<Self::Device>;
}
