#![allow(dead_code)]
/// Mock NVMe device infrastructure for testing
///
/// Simulates namespace and controller nodes so the resolve, identify and
/// report pipeline can run without NVMe hardware.
use ebsnvme_id::identity::{AMAZON_NVME_VENDOR_ID, EBS_MODEL_NUMBER, INSTANCE_STORE_MODEL_NUMBER};
use ebsnvme_id::nvme::controller_data::{
    CONTROLLER_DATA_LEN, MODEL_NUMBER_LEN, MODEL_NUMBER_OFFSET, SERIAL_NUMBER_LEN,
    SERIAL_NUMBER_OFFSET, VENDOR_ID_OFFSET, VENDOR_SPECIFIC_OFFSET,
};
use ebsnvme_id::nvme::{
    CompletionStatus, ControllerData, DeviceOpener, IdentifyOutcome, NamespaceInfo, NvmeDevice,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// How a mock controller answers Identify
#[derive(Debug, Clone)]
pub enum MockReply {
    Data(ControllerData),
    Status(u16),
    TransportError(i32),
}

// ============ CONTROLLER BUILDER ============

/// Builder for mock Identify Controller responses
pub struct MockControllerBuilder {
    vendor_id: u16,
    serial: Vec<u8>,
    model: Vec<u8>,
    device_name: Vec<u8>,
    status: Option<u16>,
    transport_errno: Option<i32>,
}

impl MockControllerBuilder {
    /// An EBS volume attached as /dev/xvdf
    pub fn ebs() -> Self {
        Self {
            vendor_id: AMAZON_NVME_VENDOR_ID,
            serial: b"vol0123456789abcdef0".to_vec(),
            model: EBS_MODEL_NUMBER.as_bytes().to_vec(),
            device_name: b"/dev/xvdf".to_vec(),
            status: None,
            transport_errno: None,
        }
    }

    /// An instance store disk, which carries no device name
    pub fn instance_store() -> Self {
        Self {
            serial: b"AWS22F2B1D2C3E4A5B6".to_vec(),
            model: INSTANCE_STORE_MODEL_NUMBER.as_bytes().to_vec(),
            device_name: Vec::new(),
            ..Self::ebs()
        }
    }

    pub fn vendor_id(mut self, vendor_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self
    }

    /// Raw serial number field contents; padded with spaces to the field width
    pub fn serial(mut self, serial: &str) -> Self {
        self.serial = serial.as_bytes().to_vec();
        self
    }

    /// Raw model number field contents; padded with spaces to the field width
    pub fn model(mut self, model: &str) -> Self {
        self.model = model.as_bytes().to_vec();
        self
    }

    /// Raw vendor-specific device name bytes; the rest of the region stays NUL
    pub fn device_name(mut self, name: &[u8]) -> Self {
        self.device_name = name.to_vec();
        self
    }

    /// Complete Identify with a controller error status
    pub fn completion_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Fail the passthrough call itself
    pub fn transport_error(mut self, errno: i32) -> Self {
        self.transport_errno = Some(errno);
        self
    }

    pub fn controller_data(&self) -> ControllerData {
        let mut raw = vec![0u8; CONTROLLER_DATA_LEN];
        raw[VENDOR_ID_OFFSET..VENDOR_ID_OFFSET + 2].copy_from_slice(&self.vendor_id.to_le_bytes());

        let sn = &mut raw[SERIAL_NUMBER_OFFSET..SERIAL_NUMBER_OFFSET + SERIAL_NUMBER_LEN];
        sn.fill(b' ');
        sn[..self.serial.len()].copy_from_slice(&self.serial);

        let mn = &mut raw[MODEL_NUMBER_OFFSET..MODEL_NUMBER_OFFSET + MODEL_NUMBER_LEN];
        mn.fill(b' ');
        mn[..self.model.len()].copy_from_slice(&self.model);

        raw[VENDOR_SPECIFIC_OFFSET..VENDOR_SPECIFIC_OFFSET + self.device_name.len()]
            .copy_from_slice(&self.device_name);

        ControllerData::from_bytes(&raw).expect("mock identify data has the right size")
    }

    pub fn build(self) -> MockReply {
        if let Some(errno) = self.transport_errno {
            MockReply::TransportError(errno)
        } else if let Some(status) = self.status {
            MockReply::Status(status)
        } else {
            MockReply::Data(self.controller_data())
        }
    }
}

// ============ DEVICE DIRECTORY ============

#[derive(Debug, Clone)]
enum MockNode {
    Controller(MockReply),
    Namespace { nsid: u32, controller: String },
}

/// A simulated /dev populated with controllers and namespaces
#[derive(Debug, Default)]
pub struct MockDevices {
    nodes: HashMap<PathBuf, MockNode>,
}

impl MockDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller(mut self, path: &str, builder: MockControllerBuilder) -> Self {
        self.nodes
            .insert(PathBuf::from(path), MockNode::Controller(builder.build()));
        self
    }

    pub fn namespace(mut self, path: &str, nsid: u32, controller: &str) -> Self {
        self.nodes.insert(
            PathBuf::from(path),
            MockNode::Namespace {
                nsid,
                controller: controller.to_string(),
            },
        );
        self
    }

    /// A controller with one namespace and one partition on it, named the Linux way
    pub fn attached(self, index: u32, builder: MockControllerBuilder) -> Self {
        let controller = format!("nvme{}", index);
        self.controller(&format!("/dev/{}", controller), builder)
            .namespace(&format!("/dev/{}n1", controller), 1, &controller)
            .namespace(&format!("/dev/{}n1p1", controller), 1, &controller)
    }
}

/// An open mock device
#[derive(Debug)]
pub struct MockDevice {
    name: String,
    node: MockNode,
}

impl NvmeDevice for MockDevice {
    fn namespace(&self) -> io::Result<NamespaceInfo> {
        match &self.node {
            MockNode::Controller(_) => Ok(NamespaceInfo::controller(self.name.clone())),
            MockNode::Namespace { nsid, controller } => Ok(NamespaceInfo {
                nsid: *nsid,
                controller: controller.clone(),
            }),
        }
    }

    fn identify_controller(&self) -> io::Result<IdentifyOutcome> {
        match &self.node {
            MockNode::Controller(MockReply::Data(data)) => {
                Ok(IdentifyOutcome::Completed(data.clone()))
            }
            MockNode::Controller(MockReply::Status(status)) => {
                Ok(IdentifyOutcome::Failed(CompletionStatus(*status)))
            }
            MockNode::Controller(MockReply::TransportError(errno)) => {
                Err(io::Error::from_raw_os_error(*errno))
            }
            // Namespaces reject admin commands in this simulation
            MockNode::Namespace { .. } => Err(io::Error::from_raw_os_error(libc::ENOTTY)),
        }
    }
}

impl DeviceOpener for MockDevices {
    type Device = MockDevice;

    fn open(&self, path: &Path) -> io::Result<MockDevice> {
        let node = self
            .nodes
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(MockDevice { name, node })
    }
}
