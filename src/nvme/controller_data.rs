// Identify Controller data structure
//
// The layout is fixed by the NVMe base specification (Figure "Identify
// Controller Data Structure"). We keep it as a raw 4 KiB buffer and read
// fields at their documented offsets instead of mirroring the whole struct.

use crate::{EbsError, EbsResult};
use std::fmt;

/// Size of the Identify Controller data structure.
pub const CONTROLLER_DATA_LEN: usize = 4096;

/// PCI Vendor ID (VID), little-endian.
pub const VENDOR_ID_OFFSET: usize = 0;
pub const VENDOR_ID_LEN: usize = 2;

/// PCI Subsystem Vendor ID (SSVID), little-endian.
pub const SUBSYSTEM_VENDOR_ID_OFFSET: usize = 2;

/// Serial Number (SN), ASCII, space padded.
pub const SERIAL_NUMBER_OFFSET: usize = 4;
pub const SERIAL_NUMBER_LEN: usize = 20;

/// Model Number (MN), ASCII, space padded.
pub const MODEL_NUMBER_OFFSET: usize = 24;
pub const MODEL_NUMBER_LEN: usize = 40;

/// Firmware Revision (FR), ASCII, space padded.
pub const FIRMWARE_REVISION_OFFSET: usize = 64;
pub const FIRMWARE_REVISION_LEN: usize = 8;

/// Vendor Specific region (VS), bytes 3072..4095.
pub const VENDOR_SPECIFIC_OFFSET: usize = 3072;
pub const VENDOR_SPECIFIC_LEN: usize = 1024;

/// Amazon stores the requested block device name in the first 32 bytes of VS.
pub const AMAZON_DEVICE_NAME_LEN: usize = 32;

const _: () = assert!(VENDOR_ID_OFFSET + VENDOR_ID_LEN == SUBSYSTEM_VENDOR_ID_OFFSET);
const _: () = assert!(SUBSYSTEM_VENDOR_ID_OFFSET + 2 == SERIAL_NUMBER_OFFSET);
const _: () = assert!(SERIAL_NUMBER_OFFSET + SERIAL_NUMBER_LEN == MODEL_NUMBER_OFFSET);
const _: () = assert!(MODEL_NUMBER_OFFSET + MODEL_NUMBER_LEN == FIRMWARE_REVISION_OFFSET);
const _: () = assert!(VENDOR_SPECIFIC_OFFSET + VENDOR_SPECIFIC_LEN == CONTROLLER_DATA_LEN);
const _: () = assert!(AMAZON_DEVICE_NAME_LEN <= VENDOR_SPECIFIC_LEN);

/// Raw response to an Identify Controller command.
///
/// Read-only once constructed; accessors borrow straight from the buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct ControllerData(Box<[u8; CONTROLLER_DATA_LEN]>);

impl ControllerData {
    /// Wrap a buffer filled in by the controller.
    pub fn new(raw: Box<[u8; CONTROLLER_DATA_LEN]>) -> Self {
        Self(raw)
    }

    /// Copy a response out of a byte slice, which must be exactly one structure long.
    pub fn from_bytes(bytes: &[u8]) -> EbsResult<Self> {
        let raw: [u8; CONTROLLER_DATA_LEN] = bytes.try_into().map_err(|_| {
            EbsError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "identify data is {} bytes, expected {}",
                    bytes.len(),
                    CONTROLLER_DATA_LEN
                ),
            ))
        })?;
        Ok(Self(Box::new(raw)))
    }

    pub fn as_bytes(&self) -> &[u8; CONTROLLER_DATA_LEN] {
        &self.0
    }

    pub fn vendor_id(&self) -> u16 {
        u16::from_le_bytes([self.0[VENDOR_ID_OFFSET], self.0[VENDOR_ID_OFFSET + 1]])
    }

    pub fn subsystem_vendor_id(&self) -> u16 {
        u16::from_le_bytes([
            self.0[SUBSYSTEM_VENDOR_ID_OFFSET],
            self.0[SUBSYSTEM_VENDOR_ID_OFFSET + 1],
        ])
    }

    pub fn serial_number(&self) -> &[u8] {
        &self.0[SERIAL_NUMBER_OFFSET..SERIAL_NUMBER_OFFSET + SERIAL_NUMBER_LEN]
    }

    pub fn model_number(&self) -> &[u8] {
        &self.0[MODEL_NUMBER_OFFSET..MODEL_NUMBER_OFFSET + MODEL_NUMBER_LEN]
    }

    pub fn firmware_revision(&self) -> &[u8] {
        &self.0[FIRMWARE_REVISION_OFFSET..FIRMWARE_REVISION_OFFSET + FIRMWARE_REVISION_LEN]
    }

    pub fn vendor_specific(&self) -> &[u8] {
        &self.0[VENDOR_SPECIFIC_OFFSET..VENDOR_SPECIFIC_OFFSET + VENDOR_SPECIFIC_LEN]
    }

    /// The Linux block device name embedded by EBS, still padded.
    pub fn amazon_device_name(&self) -> &[u8] {
        &self.vendor_specific()[..AMAZON_DEVICE_NAME_LEN]
    }
}

impl fmt::Debug for ControllerData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerData")
            .field("vid", &format_args!("{:#06x}", self.vendor_id()))
            .field("ssvid", &format_args!("{:#06x}", self.subsystem_vendor_id()))
            .field("sn", &String::from_utf8_lossy(self.serial_number()))
            .field("mn", &String::from_utf8_lossy(self.model_number()))
            .field("fr", &String::from_utf8_lossy(self.firmware_revision()))
            .finish()
    }
}
