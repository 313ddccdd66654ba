// Platform passthrough backends
//
// Each backend provides `SystemDevices` (a `DeviceOpener`) and its device
// type. Platforms without NVMe passthrough get a backend that refuses to open.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::{
    controller_from_sysfs, LinuxNvmeDevice as SystemDevice, SystemDevices, SYSFS_CLASS_BLOCK,
};

#[cfg(target_os = "freebsd")]
mod freebsd;
#[cfg(target_os = "freebsd")]
pub use freebsd::{FreeBsdNvmeDevice as SystemDevice, SystemDevices};

#[cfg(not(any(target_os = "linux", target_os = "freebsd")))]
mod unsupported;
#[cfg(not(any(target_os = "linux", target_os = "freebsd")))]
pub use unsupported::{SystemDevices, UnsupportedDevice as SystemDevice};
