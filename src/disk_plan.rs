//! Data-disk layout of the sample VM.
//!
//! A plan lists the data disks the VM starts with. Each planned disk is either
//! created inline by the VM call or created up front as a managed disk and
//! attached. LUNs given explicitly are reserved first, the rest are assigned
//! the lowest free LUN in plan order.

use crate::error::{Error, Result};
use crate::models::{next_free_lun, Caching, DiskSku, MAX_LUN};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How the planned disks get created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiskAttachStrategy {
    /// Some inline, some created up front.
    #[default]
    Mixed,
    /// Every data disk created inline by the VM call.
    Implicit,
    /// Every data disk created as a managed disk first, then attached.
    Managed,
}

impl FromStr for DiskAttachStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mixed" => Ok(DiskAttachStrategy::Mixed),
            "implicit" => Ok(DiskAttachStrategy::Implicit),
            "managed" | "explicit" => Ok(DiskAttachStrategy::Managed),
            other => Err(Error::InvalidSetting {
                name: "SAMPLE_DISK_STRATEGY",
                reason: format!("'{other}' is not one of mixed, implicit, managed"),
            }),
        }
    }
}

impl fmt::Display for DiskAttachStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiskAttachStrategy::Mixed => "mixed",
            DiskAttachStrategy::Implicit => "implicit",
            DiskAttachStrategy::Managed => "managed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioning {
    /// `createOption: Empty` inside the VM call.
    Implicit,
    /// Standalone managed disk created before the VM, then attached.
    Managed,
    /// A disk that already exists when the VM is defined. Created before any
    /// other disk and never changed by the strategy.
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDataDisk {
    /// `None` means take the lowest free LUN.
    pub lun: Option<u32>,
    pub size_gb: u32,
    pub sku: DiskSku,
    pub caching: Caching,
    pub provisioning: Provisioning,
}

impl PlannedDataDisk {
    pub fn implicit(size_gb: u32) -> Self {
        PlannedDataDisk {
            lun: None,
            size_gb,
            sku: DiskSku::StandardLrs,
            caching: Caching::None,
            provisioning: Provisioning::Implicit,
        }
    }

    pub fn managed(size_gb: u32) -> Self {
        PlannedDataDisk {
            provisioning: Provisioning::Managed,
            ..Self::implicit(size_gb)
        }
    }

    pub fn existing(size_gb: u32) -> Self {
        PlannedDataDisk {
            provisioning: Provisioning::Existing,
            ..Self::implicit(size_gb)
        }
    }

    pub fn at_lun(mut self, lun: u32) -> Self {
        self.lun = Some(lun);
        self
    }

    pub fn with_caching(mut self, caching: Caching) -> Self {
        self.caching = caching;
        self
    }

    pub fn with_sku(mut self, sku: DiskSku) -> Self {
        self.sku = sku;
        self
    }
}

/// A planned disk with its final LUN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDataDisk {
    pub lun: u32,
    pub disk: PlannedDataDisk,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiskPlan {
    pub data_disks: Vec<PlannedDataDisk>,
}

impl DiskPlan {
    /// The layout of the classic sample: two inline 100 GB disks (one at LUN 1),
    /// a managed 100 GB disk, a managed 50 GB disk at LUN 2 and the standalone
    /// 50 GB disk created first. `strategy` overrides how each one except the
    /// existing disk is created.
    pub fn for_strategy(strategy: DiskAttachStrategy) -> DiskPlan {
        let mut data_disks = vec![
            PlannedDataDisk::implicit(100),
            PlannedDataDisk::implicit(100)
                .at_lun(1)
                .with_caching(Caching::ReadWrite),
            PlannedDataDisk::managed(100),
            PlannedDataDisk::managed(50)
                .at_lun(2)
                .with_caching(Caching::ReadOnly)
                .with_sku(DiskSku::StandardLrs),
            PlannedDataDisk::existing(50),
        ];
        let forced = match strategy {
            DiskAttachStrategy::Mixed => None,
            DiskAttachStrategy::Implicit => Some(Provisioning::Implicit),
            DiskAttachStrategy::Managed => Some(Provisioning::Managed),
        };
        if let Some(p) = forced {
            data_disks
                .iter_mut()
                .filter(|d| d.provisioning != Provisioning::Existing)
                .for_each(|d| d.provisioning = p);
        }
        DiskPlan { data_disks }
    }

    /// Assign a LUN to every planned disk, keeping plan order.
    ///
    /// # Returns
    /// * `Err` - If an explicit LUN is used twice or is above [`MAX_LUN`]
    pub fn resolve_luns(&self) -> Result<Vec<ResolvedDataDisk>> {
        let mut used = BTreeSet::new();
        for d in &self.data_disks {
            if let Some(lun) = d.lun {
                if lun > MAX_LUN {
                    return Err(Error::invalid(format!("LUN {lun} is above {MAX_LUN}")));
                }
                if !used.insert(lun) {
                    return Err(Error::invalid(format!("LUN {lun} is planned twice")));
                }
            }
        }

        let mut resolved = Vec::with_capacity(self.data_disks.len());
        for d in &self.data_disks {
            let lun = match d.lun {
                Some(lun) => lun,
                None => {
                    let lun = next_free_lun(&used)?;
                    used.insert(lun);
                    lun
                }
            };
            resolved.push(ResolvedDataDisk {
                lun,
                disk: d.clone(),
            });
        }
        Ok(resolved)
    }
}
