// Namespace to controller resolution
//
// Users name whatever block device they see (a namespace, a partition, a
// udev alias, or the controller itself). Identify Controller has to go to
// the controller node, so a namespace is swapped for its controller here.

use crate::nvme::{DeviceOpener, NamespaceInfo, NvmeDevice};
use crate::{EbsError, EbsResult, DEFAULT_DEV_DIR};
use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The controller device a user path resolved to.
#[derive(Debug)]
pub enum Resolution<D> {
    /// The opened device was already the controller.
    Direct(D),

    /// The opened device was a namespace; it has been closed and its controller opened.
    Redirected { namespace: NamespaceInfo, device: D },
}

impl<D> Resolution<D> {
    pub fn device(&self) -> &D {
        match self {
            Resolution::Direct(device) => device,
            Resolution::Redirected { device, .. } => device,
        }
    }

    pub fn into_device(self) -> D {
        match self {
            Resolution::Direct(device) => device,
            Resolution::Redirected { device, .. } => device,
        }
    }

    pub fn is_redirected(&self) -> bool {
        matches!(self, Resolution::Redirected { .. })
    }
}

/// Opens the NVMe controller behind a user-supplied device name.
#[derive(Debug, Clone)]
pub struct DeviceResolver<O> {
    opener: O,
    dev_dir: String,
}

impl<O: DeviceOpener> DeviceResolver<O> {
    pub fn new(opener: O) -> Self {
        Self::with_dev_dir(opener, DEFAULT_DEV_DIR)
    }

    /// Use a device directory other than `/dev/`.
    pub fn with_dev_dir(opener: O, dev_dir: impl Into<String>) -> Self {
        let mut dev_dir = dev_dir.into();
        if !dev_dir.ends_with('/') {
            dev_dir.push('/');
        }
        Self { opener, dev_dir }
    }

    pub fn dev_dir(&self) -> &str {
        &self.dev_dir
    }

    /// Reduce `/dev/nvme0n1` to `nvme0n1`; bare names are returned as given.
    ///
    /// Names are paths, not strings: any bytes the OS accepts are kept.
    pub fn normalize<'a>(&self, user_path: &'a Path) -> &'a Path {
        user_path
            .strip_prefix(&self.dev_dir)
            .unwrap_or(user_path)
    }

    /// Full path of a bare device name.
    ///
    /// The name is appended to the device directory as-is, so an absolute
    /// name outside that directory does not replace it.
    pub fn device_path(&self, name: impl AsRef<Path>) -> PathBuf {
        let mut path = OsString::from(&self.dev_dir);
        path.push(name.as_ref());
        PathBuf::from(path)
    }

    /// Open `user_path` and, if it is a namespace, its controller instead.
    pub fn resolve(&self, user_path: impl AsRef<Path>) -> EbsResult<Resolution<O::Device>> {
        let name = self.normalize(user_path.as_ref());
        let path = self.device_path(name);

        let device = self.opener.open(&path).map_err(|source| EbsError::Open {
            path: path.display().to_string(),
            source,
        })?;

        let namespace = device.namespace().map_err(|source| EbsError::Resolution {
            device: name.display().to_string(),
            source,
        })?;

        if namespace.is_controller() {
            debug!("{} is a controller", path.display());
            return Ok(Resolution::Direct(device));
        }

        debug!(
            "{} is namespace {} of {}",
            path.display(),
            namespace.nsid,
            namespace.controller
        );

        // Close the namespace before touching the controller
        drop(device);

        let controller_path = self.device_path(&namespace.controller);
        let controller = self
            .opener
            .open(&controller_path)
            .map_err(|source| EbsError::Resolution {
                device: controller_path.display().to_string(),
                source,
            })?;

        Ok(Resolution::Redirected {
            namespace,
            device: controller,
        })
    }
}
