// Allow uppercase acronyms for industry-standard terms like EBS and NVMe
#![allow(clippy::upper_case_acronyms)]

pub mod identity;
pub mod nvme;
pub mod resolver;

// Re-export the query pipeline for convenience
pub use identity::{
    classify, identify_and_report, report, ControllerIdentity, DeviceKind, ExtractedIdentity,
};
pub use nvme::{extract, ControllerData, DeviceOpener, FieldString, NvmeDevice, SystemDevices};
pub use resolver::{DeviceResolver, Resolution};

use std::io;
use thiserror::Error;

/// Program name used in diagnostics and the usage line.
pub const PROGRAM_NAME: &str = "ebsnvme-id";

/// Platform device directory; user paths starting with it are reduced to a bare name.
pub const DEFAULT_DEV_DIR: &str = "/dev/";

// Every variant is fatal to the invocation; nothing here is retried.
// Messages leave out the underlying cause, which is reachable via `source()`.
#[derive(Error, Debug)]
pub enum EbsError {
    #[error("usage: ebsnvme-id [-b] [-m] [-s] [-u] [-v] device")]
    Usage,

    #[error("could not open {path}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("could not resolve controller for {device}")]
    Resolution {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("identify command failed on {device}")]
    Identify {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("identify request returned error on {device} (status {status:#06x})")]
    Controller { device: String, status: u16 },

    #[error("Not an EC2 disk: {0}")]
    NotSupportedDevice(String),

    #[error("Not an EBS or Instance Storage disk: {0}")]
    UnrecognizedModel(String),

    #[error("Not an EBS device: {0}")]
    NotEbsDevice(String),

    #[error("I/O error")]
    Io(#[from] io::Error),
}

pub type EbsResult<T> = Result<T, EbsError>;

/// Which values the caller asked to have reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputSelection {
    pub volume_id: bool,
    pub block_device: bool,
    pub model_number: bool,
    pub serial_number: bool,
}

impl OutputSelection {
    /// Build a selection from the command-line flags.
    ///
    /// With no flag set this falls back to `-b -v`, the same default the
    /// Amazon Linux tool uses.
    pub fn from_flags(
        block_device: bool,
        model_number: bool,
        serial_number: bool,
        volume_id: bool,
    ) -> Self {
        let selection = Self {
            volume_id,
            block_device,
            model_number,
            serial_number,
        };

        if selection.is_empty() {
            Self {
                volume_id: true,
                block_device: true,
                ..Self::default()
            }
        } else {
            selection
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.volume_id || self.block_device || self.model_number || self.serial_number)
    }

    /// True when a requested value only exists on EBS volumes.
    pub fn requires_ebs(&self) -> bool {
        self.volume_id || self.block_device
    }
}
