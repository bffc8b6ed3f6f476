//! Virtual machine data model.

use super::{Caching, DataDisk, DiskSku, OsDisk, ResourceId};
use crate::error::{Error, Result};
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

/// Highest LUN Azure accepts on any VM size.
pub const MAX_LUN: u32 = 63;

/// Marketplace image the OS disk is created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.publisher, self.offer, self.sku, self.version
        )
    }
}

/// Linux admin login, password auth.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Everything needed to create a VM.
#[derive(Debug, Clone)]
pub struct VmDefinition {
    pub name: String,
    pub location: String,
    pub size: String,
    pub image: ImageReference,
    pub admin: AdminCredentials,
    pub nic_id: ResourceId,
    pub os_disk_sku: DiskSku,
    pub data_disks: Vec<DataDisk>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Deallocating,
    Deallocated,
    Unknown(String),
}

impl PowerState {
    /// Parse an instance view status code such as `PowerState/running`.
    pub fn from_status_code(code: &str) -> Option<PowerState> {
        let state = code.strip_prefix("PowerState/")?;
        Some(match state {
            "starting" => PowerState::Starting,
            "running" => PowerState::Running,
            "stopping" => PowerState::Stopping,
            "stopped" => PowerState::Stopped,
            "deallocating" => PowerState::Deallocating,
            "deallocated" => PowerState::Deallocated,
            other => PowerState::Unknown(other.to_string()),
        })
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::Unknown(s) => write!(f, "{s}"),
            other => write!(f, "{}", format!("{other:?}").to_lowercase()),
        }
    }
}

/// A virtual machine as read back from the cloud.
#[derive(Debug, Clone)]
pub struct VirtualMachine {
    pub id: ResourceId,
    pub name: String,
    pub location: String,
    pub size: String,
    pub image: Option<ImageReference>,
    pub os_disk: OsDisk,
    pub data_disks: Vec<DataDisk>,
    pub nic_ids: Vec<ResourceId>,
    pub provisioning_state: Option<String>,
    pub power_state: Option<PowerState>,
}

impl VirtualMachine {
    /// LUNs of all attached data disks.
    pub fn luns(&self) -> BTreeSet<u32> {
        luns_of(&self.data_disks)
    }

    pub fn data_disk(&self, lun: u32) -> Option<&DataDisk> {
        self.data_disks.iter().find(|d| d.lun == lun)
    }

    /// Remove the data disk at `lun` from the definition, returning it.
    pub fn without_data_disk(&mut self, lun: u32) -> Result<DataDisk> {
        let pos = self
            .data_disks
            .iter()
            .position(|d| d.lun == lun)
            .ok_or_else(|| Error::not_found(format!("no data disk at LUN {lun} on {}", self.name)))?;
        Ok(self.data_disks.remove(pos))
    }

    /// Add a new empty data disk at the lowest free LUN, returning that LUN.
    pub fn with_new_data_disk(&mut self, size_gb: u32, sku: DiskSku, caching: Caching) -> Result<u32> {
        let lun = next_free_lun(&self.luns())?;
        self.data_disks.push(DataDisk::empty(lun, size_gb, sku, caching));
        Ok(lun)
    }
}

/// LUNs of a set of data disks.
pub fn luns_of(disks: &[DataDisk]) -> BTreeSet<u32> {
    disks.iter().map(|d| d.lun).collect()
}

/// Lowest LUN not in `used`.
pub fn next_free_lun(used: &BTreeSet<u32>) -> Result<u32> {
    (0..=MAX_LUN)
        .find(|l| !used.contains(l))
        .ok_or_else(|| Error::invalid(format!("all {} LUNs are in use", MAX_LUN + 1)))
}

/// Fail on a LUN used twice or out of range.
pub fn check_unique_luns(disks: &[DataDisk]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for d in disks {
        if d.lun > MAX_LUN {
            return Err(Error::invalid(format!("LUN {} is above {MAX_LUN}", d.lun)));
        }
        if !seen.insert(d.lun) {
            return Err(Error::invalid(format!("duplicate LUN {}", d.lun)));
        }
    }
    Ok(())
}

impl fmt::Display for VirtualMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Virtual Machine: {}", self.id)?;
        writeln!(f, "\tName: {}", self.name)?;
        writeln!(f, "\tLocation: {}", self.location)?;
        writeln!(f, "\tSize: {}", self.size)?;
        if let Some(image) = &self.image {
            writeln!(f, "\tImage: {image}")?;
        }
        writeln!(
            f,
            "\tPower state: {}",
            self.power_state
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        )?;
        writeln!(
            f,
            "\tOS disk: {} ({} GB, {})",
            self.os_disk.name.as_deref().unwrap_or("?"),
            self.os_disk
                .size_gb
                .map(|s| s.to_string())
                .unwrap_or_else(|| "?".to_string()),
            self.os_disk.sku
        )?;
        writeln!(
            f,
            "\tData disks: [{}]",
            self.data_disks.iter().map(|d| d.lun).sorted().join(", ")
        )?;
        for d in self.data_disks.iter().sorted_by_key(|d| d.lun) {
            writeln!(
                f,
                "\t\tLUN {lun}: {name} caching={caching} size={size}GB",
                lun = d.lun,
                name = d.name.as_deref().unwrap_or("(new)"),
                caching = d.caching.as_str(),
                size = d
                    .size_gb
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "?".to_string()),
            )?;
        }
        write!(
            f,
            "\tNetwork interfaces: [{}]",
            self.nic_ids.iter().map(|n| n.name()).join(", ")
        )
    }
}
