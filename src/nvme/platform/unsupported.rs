// Fallback for platforms without an NVMe passthrough backend

use crate::nvme::{DeviceOpener, IdentifyOutcome, NamespaceInfo, NvmeDevice};
use std::io;
use std::path::Path;

fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "NVMe passthrough is not supported on this platform",
    )
}

#[derive(Debug, Clone, Default)]
pub struct SystemDevices;

impl SystemDevices {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceOpener for SystemDevices {
    type Device = UnsupportedDevice;

    fn open(&self, _path: &Path) -> io::Result<UnsupportedDevice> {
        Err(unsupported())
    }
}

#[derive(Debug)]
pub enum UnsupportedDevice {}

impl NvmeDevice for UnsupportedDevice {
    fn namespace(&self) -> io::Result<NamespaceInfo> {
        match *self {}
    }

    fn identify_controller(&self) -> io::Result<IdentifyOutcome> {
        match *self {}
    }
}
