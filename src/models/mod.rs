//! Domain models for the VM disk sample.
//!
//! Everything here describes remote resources. The process only holds ids and
//! the last known state:
//! - [`ResourceId`] - ARM resource identifier
//! - [`Disk`], [`DataDisk`], [`OsDisk`] - managed disks and VM disk slots
//! - [`VirtualMachine`] and [`VmDefinition`] - compute
//! - [`ResourceGroup`], [`VirtualNetwork`], [`PublicIpAddress`], [`NetworkInterface`]

mod disk;
mod network;
mod resource_id;
mod vm;

pub use disk::{Caching, DataDisk, Disk, DiskDefinition, DiskSku, DiskSource, OsDisk};
pub use network::{NetworkInterface, PublicIpAddress, ResourceGroup, VirtualNetwork};
pub use resource_id::ResourceId;
pub use vm::{
    check_unique_luns, luns_of, next_free_lun, AdminCredentials, ImageReference, PowerState,
    VirtualMachine, VmDefinition, MAX_LUN,
};
