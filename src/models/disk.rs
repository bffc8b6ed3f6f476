//! Managed disk data model.

use super::ResourceId;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage tier of a managed disk, serialized as the ARM `storageAccountType`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiskSku {
    #[default]
    #[serde(rename = "Standard_LRS")]
    StandardLrs,
    #[serde(rename = "StandardSSD_LRS")]
    StandardSsdLrs,
    #[serde(rename = "Premium_LRS")]
    PremiumLrs,
}

impl DiskSku {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiskSku::StandardLrs => "Standard_LRS",
            DiskSku::StandardSsdLrs => "StandardSSD_LRS",
            DiskSku::PremiumLrs => "Premium_LRS",
        }
    }
}

impl FromStr for DiskSku {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard_lrs" => Ok(DiskSku::StandardLrs),
            "standardssd_lrs" => Ok(DiskSku::StandardSsdLrs),
            "premium_lrs" => Ok(DiskSku::PremiumLrs),
            other => Err(Error::invalid(format!("unknown disk sku '{other}'"))),
        }
    }
}

impl fmt::Display for DiskSku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Host caching mode of an attached disk.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Caching {
    #[default]
    None,
    ReadOnly,
    ReadWrite,
}

impl Caching {
    pub fn as_str(&self) -> &'static str {
        match self {
            Caching::None => "None",
            Caching::ReadOnly => "ReadOnly",
            Caching::ReadWrite => "ReadWrite",
        }
    }

    /// Lenient parse of the ARM value, unknown values map to `None`.
    pub fn from_arm(s: Option<&str>) -> Caching {
        match s {
            Some("ReadOnly") => Caching::ReadOnly,
            Some("ReadWrite") => Caching::ReadWrite,
            _ => Caching::None,
        }
    }
}

/// Where the disk behind a data-disk slot comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskSource {
    /// Created inline by the VM call (`createOption: Empty`).
    Empty { size_gb: u32, sku: DiskSku },
    /// An existing managed disk (`createOption: Attach`).
    Attach { disk_id: ResourceId },
}

/// A data disk bound to a LUN of a virtual machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDisk {
    pub lun: u32,
    pub caching: Caching,
    pub source: DiskSource,
    /// Disk name as reported by the VM, known once the disk exists.
    pub name: Option<String>,
    /// Size as reported by the VM.
    pub size_gb: Option<u32>,
}

impl DataDisk {
    pub fn empty(lun: u32, size_gb: u32, sku: DiskSku, caching: Caching) -> DataDisk {
        DataDisk {
            lun,
            caching,
            source: DiskSource::Empty { size_gb, sku },
            name: None,
            size_gb: Some(size_gb),
        }
    }

    pub fn attach(lun: u32, disk: &Disk, caching: Caching) -> DataDisk {
        DataDisk {
            lun,
            caching,
            source: DiskSource::Attach {
                disk_id: disk.id.clone(),
            },
            name: Some(disk.name.clone()),
            size_gb: disk.size_gb,
        }
    }

    /// Id of the managed disk behind this slot, `None` until an inline disk was created.
    pub fn disk_id(&self) -> Option<&ResourceId> {
        match &self.source {
            DiskSource::Attach { disk_id } => Some(disk_id),
            DiskSource::Empty { .. } => None,
        }
    }
}

/// OS disk of a virtual machine, always created from the image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OsDisk {
    pub name: Option<String>,
    pub disk_id: Option<ResourceId>,
    pub size_gb: Option<u32>,
    pub sku: DiskSku,
}

/// Request to create a standalone managed disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskDefinition {
    pub name: String,
    pub location: String,
    pub size_gb: u32,
    pub sku: DiskSku,
}

/// A managed disk resource as read back from the cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disk {
    pub id: ResourceId,
    pub name: String,
    pub location: String,
    pub size_gb: Option<u32>,
    pub sku: DiskSku,
    /// ARM `diskState`: Unattached, Attached, Reserved, ...
    pub state: Option<String>,
    /// VM the disk is attached to.
    pub managed_by: Option<ResourceId>,
}

impl fmt::Display for Disk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} GB, {}, {})",
            self.name,
            self.size_gb
                .map(|s| s.to_string())
                .unwrap_or_else(|| "?".to_string()),
            self.sku,
            self.state.as_deref().unwrap_or("unknown")
        )
    }
}
