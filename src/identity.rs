// EC2 NVMe device identification
//
// Issues Identify Controller, checks that the controller is an Amazon one,
// and derives the values EC2 exposes through it:
// - EBS volumes put the volume ID (without its hyphen) in the serial number
//   and the block device name from the instance's block device mapping in
//   the first 32 bytes of the vendor-specific region.
// - Instance store disks only carry a model and serial number.

use crate::nvme::controller_data::ControllerData;
use crate::nvme::{extract, FieldString, IdentifyOutcome, NvmeDevice};
use crate::{EbsError, EbsResult, OutputSelection};
use log::debug;
use std::io::{self, Write};

/// PCI vendor ID assigned to Amazon.
pub const AMAZON_NVME_VENDOR_ID: u16 = 0x1d0f;

pub const EBS_MODEL_NUMBER: &str = "Amazon Elastic Block Store";
pub const INSTANCE_STORE_MODEL_NUMBER: &str = "Amazon EC2 NVMe Instance Storage";

const VOLUME_ID_PREFIX: &str = "vol";
const VOLUME_ID_SEPARATED_PREFIX: &str = "vol-";
const DEVICE_NAME_PREFIX: &str = "/dev/";

/// Recognized Amazon NVMe device families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Elastic Block Store volume
    ElasticBlockStore,

    /// EC2 instance store disk
    InstanceStore,
}

impl DeviceKind {
    /// Exact, byte-for-byte match against the known model numbers.
    pub fn from_model_number(model: &FieldString) -> Option<Self> {
        if *model == EBS_MODEL_NUMBER {
            Some(DeviceKind::ElasticBlockStore)
        } else if *model == INSTANCE_STORE_MODEL_NUMBER {
            Some(DeviceKind::InstanceStore)
        } else {
            None
        }
    }

    pub fn model_number(&self) -> &'static str {
        match self {
            DeviceKind::ElasticBlockStore => EBS_MODEL_NUMBER,
            DeviceKind::InstanceStore => INSTANCE_STORE_MODEL_NUMBER,
        }
    }
}

/// Trimmed identity fields of a recognized Amazon controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerIdentity {
    pub kind: DeviceKind,
    pub serial_number: FieldString,
    pub model_number: FieldString,
    pub device_name: FieldString,
}

impl ControllerIdentity {
    pub fn is_ebs(&self) -> bool {
        self.kind == DeviceKind::ElasticBlockStore
    }

    /// EBS volume ID, e.g. `vol-0123456789abcdef0`.
    pub fn volume_id(&self, device: &str) -> EbsResult<FieldString> {
        self.require_ebs(device)?;
        Ok(volume_id_from_serial(&self.serial_number))
    }

    /// Block device name from the EBS block device mapping, e.g. `xvdf`.
    pub fn block_device_name(&self, device: &str) -> EbsResult<FieldString> {
        self.require_ebs(device)?;
        Ok(strip_device_directory(&self.device_name))
    }

    fn require_ebs(&self, device: &str) -> EbsResult<()> {
        if self.is_ebs() {
            Ok(())
        } else {
            Err(EbsError::NotEbsDevice(device.to_string()))
        }
    }
}

/// Restore the hyphen EBS firmware drops from the volume ID (`vol0abc` becomes `vol-0abc`).
///
/// Serial numbers that already contain it, or that are not volume IDs at
/// all, are returned unchanged.
pub fn volume_id_from_serial(serial: &FieldString) -> FieldString {
    if serial.starts_with(VOLUME_ID_SEPARATED_PREFIX) {
        return serial.clone();
    }

    match serial.strip_prefix(VOLUME_ID_PREFIX) {
        Some(rest) => {
            let mut id = VOLUME_ID_SEPARATED_PREFIX.as_bytes().to_vec();
            id.extend_from_slice(rest);
            FieldString::from(id)
        }
        None => serial.clone(),
    }
}

/// Drop a leading `/dev/` from the embedded device name.
pub fn strip_device_directory(name: &FieldString) -> FieldString {
    match name.strip_prefix(DEVICE_NAME_PREFIX) {
        Some(rest) => FieldString::from(rest),
        None => name.clone(),
    }
}

/// Send Identify Controller to an open controller device.
pub fn identify<D: NvmeDevice>(controller: &D, device: &str) -> EbsResult<ControllerData> {
    let outcome = controller
        .identify_controller()
        .map_err(|source| EbsError::Identify {
            device: device.to_string(),
            source,
        })?;

    match outcome {
        IdentifyOutcome::Completed(data) => {
            debug!("Identify on {}: {:?}", device, data);
            Ok(data)
        }
        IdentifyOutcome::Failed(status) => Err(EbsError::Controller {
            device: device.to_string(),
            status: status.0,
        }),
    }
}

/// Validate vendor and model and pull out the identity fields.
pub fn classify(data: &ControllerData, device: &str) -> EbsResult<ControllerIdentity> {
    if data.vendor_id() != AMAZON_NVME_VENDOR_ID {
        debug!("{}: vendor {:#06x} is not Amazon", device, data.vendor_id());
        return Err(EbsError::NotSupportedDevice(device.to_string()));
    }

    let serial_number = extract(data.serial_number());
    let model_number = extract(data.model_number());
    let device_name = extract(data.amazon_device_name());

    // An unknown Amazon model means a new device family this tool doesn't know yet
    let kind = DeviceKind::from_model_number(&model_number)
        .ok_or_else(|| EbsError::UnrecognizedModel(device.to_string()))?;

    debug!("{}: {:?} serial={}", device, kind, serial_number);

    Ok(ControllerIdentity {
        kind,
        serial_number,
        model_number,
        device_name,
    })
}

/// Requested values for one device, all derived before anything is printed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedIdentity {
    pub volume_id: Option<FieldString>,
    pub linux_device_name: Option<FieldString>,
    pub model_number: Option<FieldString>,
    pub serial_number: Option<FieldString>,
}

impl ExtractedIdentity {
    /// Derive every requested value, failing on the first one that can't be produced.
    pub fn derive(
        identity: &ControllerIdentity,
        outputs: &OutputSelection,
        device: &str,
    ) -> EbsResult<Self> {
        let mut extracted = ExtractedIdentity::default();

        if outputs.volume_id {
            extracted.volume_id = Some(identity.volume_id(device)?);
        }
        if outputs.block_device {
            extracted.linux_device_name = Some(identity.block_device_name(device)?);
        }
        if outputs.model_number {
            extracted.model_number = Some(identity.model_number.clone());
        }
        if outputs.serial_number {
            extracted.serial_number = Some(identity.serial_number.clone());
        }

        Ok(extracted)
    }
}

/// Identify the controller behind `controller` and derive the requested values.
///
/// `device` is the name used in error messages.
pub fn identify_and_report<D: NvmeDevice>(
    controller: &D,
    device: &str,
    outputs: &OutputSelection,
) -> EbsResult<ExtractedIdentity> {
    let data = identify(controller, device)?;
    let identity = classify(&data, device)?;
    ExtractedIdentity::derive(&identity, outputs, device)
}

/// Print requested values, one per line: volume ID, block device name, model number, serial number.
pub fn report<W: Write>(
    identity: &ExtractedIdentity,
    outputs: &OutputSelection,
    out: &mut W,
) -> io::Result<()> {
    let lines = [
        (outputs.volume_id, "Volume ID: ", &identity.volume_id),
        (outputs.block_device, "", &identity.linux_device_name),
        (outputs.model_number, "", &identity.model_number),
        (outputs.serial_number, "", &identity.serial_number),
    ];

    for (requested, label, value) in lines {
        if let (true, Some(value)) = (requested, value) {
            out.write_all(label.as_bytes())?;
            out.write_all(value.as_bytes())?;
            out.write_all(b"\n")?;
        }
    }

    Ok(())
}
