// Linux NVMe passthrough via the nvme driver ioctls
//
// Namespaces and their partitions are block devices (nvme0n1, nvme0n1p1);
// the controller is a character device (nvme0). The namespace ID comes from
// NVME_IOCTL_ID and the owning controller from sysfs.

use crate::nvme::{
    CompletionStatus, ControllerData, DeviceOpener, IdentifyOutcome, NamespaceInfo, NvmeDevice,
    CONTROLLER_DATA_LEN, NVME_CNS_CONTROLLER, NVME_OPC_IDENTIFY,
};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::fs::{self, File};
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

pub const SYSFS_CLASS_BLOCK: &str = "/sys/class/block";

/// struct nvme_passthru_cmd from <linux/nvme_ioctl.h>
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default)]
struct NvmePassthruCmd {
    opcode: u8,
    flags: u8,
    rsvd1: u16,
    nsid: u32,
    cdw2: u32,
    cdw3: u32,
    metadata: u64,
    addr: u64,
    metadata_len: u32,
    data_len: u32,
    cdw10: u32,
    cdw11: u32,
    cdw12: u32,
    cdw13: u32,
    cdw14: u32,
    cdw15: u32,
    timeout_ms: u32,
    result: u32,
}

const _: () = assert!(std::mem::size_of::<NvmePassthruCmd>() == 72);

nix::ioctl_none!(nvme_ioctl_id, b'N', 0x40);
nix::ioctl_readwrite!(nvme_ioctl_admin_cmd, b'N', 0x41, NvmePassthruCmd);

lazy_static! {
    static ref NVME_BLOCK_NAME: Regex =
        Regex::new(r"^(nvme\d+)n\d+(?:p\d+)?$").expect("valid NVMe block name pattern");
    static ref NVME_CONTROLLER_NAME: Regex =
        Regex::new(r"^nvme\d+$").expect("valid NVMe controller name pattern");
}

/// Opens NVMe devices through the Linux nvme driver.
#[derive(Debug, Clone)]
pub struct SystemDevices {
    sysfs_root: PathBuf,
}

impl SystemDevices {
    pub fn new() -> Self {
        Self::with_sysfs_root(SYSFS_CLASS_BLOCK)
    }

    pub fn with_sysfs_root(root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: root.into(),
        }
    }
}

impl Default for SystemDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceOpener for SystemDevices {
    type Device = LinuxNvmeDevice;

    fn open(&self, path: &Path) -> io::Result<LinuxNvmeDevice> {
        let file = File::open(path)?;
        let is_controller = file.metadata()?.file_type().is_char_device();

        // udev symlinks (e.g. /dev/xvda -> nvme0n1) are looked up under their real name
        let real = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let name = real
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(
            "Opened {} as {} ({})",
            path.display(),
            name,
            if is_controller { "controller" } else { "block device" }
        );

        Ok(LinuxNvmeDevice {
            file,
            name,
            is_controller,
            sysfs_root: self.sysfs_root.clone(),
        })
    }
}

/// An open Linux NVMe device node.
#[derive(Debug)]
pub struct LinuxNvmeDevice {
    file: File,
    name: String,
    is_controller: bool,
    sysfs_root: PathBuf,
}

impl NvmeDevice for LinuxNvmeDevice {
    fn namespace(&self) -> io::Result<NamespaceInfo> {
        if self.is_controller {
            return Ok(NamespaceInfo::controller(self.name.clone()));
        }

        let nsid = unsafe { nvme_ioctl_id(self.file.as_raw_fd()) }.map_err(io::Error::from)?;
        let controller = controller_from_sysfs(&self.sysfs_root, &self.name)?;

        Ok(NamespaceInfo {
            nsid: nsid as u32,
            controller,
        })
    }

    fn identify_controller(&self) -> io::Result<IdentifyOutcome> {
        let mut buf = Box::new([0u8; CONTROLLER_DATA_LEN]);
        let mut cmd = NvmePassthruCmd {
            opcode: NVME_OPC_IDENTIFY,
            addr: buf.as_mut_ptr() as u64,
            data_len: CONTROLLER_DATA_LEN as u32,
            cdw10: NVME_CNS_CONTROLLER.to_le(),
            ..Default::default()
        };

        // A positive return value is the NVMe status of the completed command
        let status = unsafe { nvme_ioctl_admin_cmd(self.file.as_raw_fd(), &mut cmd) }
            .map_err(io::Error::from)?;

        if status != 0 {
            return Ok(IdentifyOutcome::Failed(CompletionStatus(status as u16)));
        }

        Ok(IdentifyOutcome::Completed(ControllerData::new(buf)))
    }
}

/// Find the controller (e.g. `nvme0`) behind a namespace or partition block device.
///
/// Partitions are mapped to their parent disk first. The disk's `device` link
/// normally points at the controller; when it doesn't (native multipath heads
/// point at the subsystem) the controller is derived from the disk name.
pub fn controller_from_sysfs(sysfs_root: &Path, block_name: &str) -> io::Result<String> {
    let entry = sysfs_root.join(block_name);

    let disk_dir = if entry.join("partition").exists() {
        let real = fs::canonicalize(&entry)?;
        real.parent().map(Path::to_path_buf).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no parent disk for partition {}", block_name),
            )
        })?
    } else {
        entry
    };

    if let Ok(target) = fs::read_link(disk_dir.join("device")) {
        if let Some(controller) = target.file_name().and_then(|n| n.to_str()) {
            if NVME_CONTROLLER_NAME.is_match(controller) {
                debug!("{} belongs to controller {} (sysfs)", block_name, controller);
                return Ok(controller.to_string());
            }
        }
    }

    let disk_name = disk_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| block_name.to_string());

    NVME_BLOCK_NAME
        .captures(&disk_name)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no NVMe controller found for {}", block_name),
            )
        })
}
