// FreeBSD NVMe passthrough via nvme(4) ioctls
//
// Namespace devices (nda0, nvd0, nvme0ns1) answer NVME_GET_NSID with their
// namespace ID and controller name; the controller (nvme0) answers with 0.

use crate::nvme::{
    CompletionStatus, ControllerData, DeviceOpener, IdentifyOutcome, NamespaceInfo, NvmeDevice,
    CONTROLLER_DATA_LEN, NVME_CNS_CONTROLLER, NVME_OPC_IDENTIFY,
};
use log::debug;
use std::ffi::CStr;
use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// SPECNAMELEN from <sys/param.h>
const SPECNAMELEN: usize = 255;

/// struct nvme_command from <dev/nvme/nvme.h>
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default)]
struct NvmeCommand {
    opc: u8,
    fuse: u8,
    cid: u16,
    nsid: u32,
    rsvd2: u32,
    rsvd3: u32,
    mptr: u64,
    prp1: u64,
    prp2: u64,
    cdw10: u32,
    cdw11: u32,
    cdw12: u32,
    cdw13: u32,
    cdw14: u32,
    cdw15: u32,
}

/// struct nvme_completion
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default)]
struct NvmeCompletion {
    cdw0: u32,
    rsvd1: u32,
    sqhd: u16,
    sqid: u16,
    cid: u16,
    status: u16,
}

/// struct nvme_pt_command
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug)]
struct NvmePtCommand {
    cmd: NvmeCommand,
    cpl: NvmeCompletion,
    buf: *mut libc::c_void,
    len: u32,
    is_read: u32,
    driver_lock: *mut libc::c_void,
}

/// struct nvme_get_nsid
#[repr(C)]
#[allow(dead_code)]
struct NvmeGetNsid {
    cdev: [libc::c_char; SPECNAMELEN + 1],
    nsid: u32,
}

const _: () = assert!(std::mem::size_of::<NvmeCommand>() == 64);
const _: () = assert!(std::mem::size_of::<NvmeCompletion>() == 16);

nix::ioctl_readwrite!(nvme_passthrough_cmd, b'n', 0, NvmePtCommand);
nix::ioctl_read!(nvme_get_nsid, b'n', 2, NvmeGetNsid);

/// Opens NVMe devices through nvme(4).
#[derive(Debug, Clone, Default)]
pub struct SystemDevices;

impl SystemDevices {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceOpener for SystemDevices {
    type Device = FreeBsdNvmeDevice;

    fn open(&self, path: &Path) -> io::Result<FreeBsdNvmeDevice> {
        let file = File::open(path)?;
        debug!("Opened {}", path.display());
        Ok(FreeBsdNvmeDevice { file })
    }
}

/// An open FreeBSD NVMe device node.
#[derive(Debug)]
pub struct FreeBsdNvmeDevice {
    file: File,
}

impl NvmeDevice for FreeBsdNvmeDevice {
    fn namespace(&self) -> io::Result<NamespaceInfo> {
        let mut query = NvmeGetNsid {
            cdev: [0; SPECNAMELEN + 1],
            nsid: 0,
        };

        unsafe { nvme_get_nsid(self.file.as_raw_fd(), &mut query) }.map_err(io::Error::from)?;

        // The kernel NUL-terminates cdev; guard against a full buffer anyway
        query.cdev[SPECNAMELEN] = 0;
        let controller = unsafe { CStr::from_ptr(query.cdev.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        Ok(NamespaceInfo {
            nsid: query.nsid,
            controller,
        })
    }

    fn identify_controller(&self) -> io::Result<IdentifyOutcome> {
        let mut buf = Box::new([0u8; CONTROLLER_DATA_LEN]);
        let mut pt = NvmePtCommand {
            cmd: NvmeCommand {
                opc: NVME_OPC_IDENTIFY,
                cdw10: NVME_CNS_CONTROLLER.to_le(),
                ..Default::default()
            },
            cpl: NvmeCompletion::default(),
            buf: buf.as_mut_ptr().cast(),
            len: CONTROLLER_DATA_LEN as u32,
            is_read: 1,
            driver_lock: std::ptr::null_mut(),
        };

        unsafe { nvme_passthrough_cmd(self.file.as_raw_fd(), &mut pt) }.map_err(io::Error::from)?;

        let status = CompletionStatus::from_completion_word(u16::from_le(pt.cpl.status));
        if status.is_error() {
            return Ok(IdentifyOutcome::Failed(status));
        }

        Ok(IdentifyOutcome::Completed(ControllerData::new(buf)))
    }
}
