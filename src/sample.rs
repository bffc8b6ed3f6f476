//! The VM and managed disk walkthrough.
//!
//! [`run_sample`] provisions a resource group, managed disks, networking and
//! a Linux VM, then detaches and attaches data disks, deletes a detached
//! disk, deallocates the VM, grows every disk and starts the VM again.
//! Steps run strictly one after another. The first failure skips the rest,
//! and the resource group is deleted in every case once it exists.

use crate::cloud::CloudApi;
use crate::config::{SampleSettings, SUBNET_NAME, VNET_ADDRESS_PREFIX};
use crate::disk_plan::Provisioning;
use crate::error::{Error, Result};
use crate::models::{
    luns_of, AdminCredentials, Caching, DataDisk, DiskDefinition, DiskSku, ResourceId,
    VirtualMachine, VmDefinition,
};
use crate::names;
use chrono::{DateTime, Utc};
use colored::Colorize;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateResourceGroup,
    CreateDisks,
    CreateNetwork,
    CreateVirtualMachine,
    UpdateVirtualMachine,
    DeleteDisk,
    DeallocateVirtualMachine,
    ResizeDisks,
    StartVirtualMachine,
}

/// What happened to the resource group at the end of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cleanup {
    /// No resource group was ever created.
    NothingToCleanUp,
    Deleted(ResourceId),
    /// Deletion failed; logged, never raised.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskResize {
    pub disk_id: ResourceId,
    pub os_disk: bool,
    pub before_gb: u32,
    pub after_gb: u32,
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct SampleReport {
    pub resource_group: Option<ResourceId>,
    pub completed: Vec<Step>,
    /// Data-disk LUNs right after the VM was created.
    pub created_luns: BTreeSet<u32>,
    /// Data-disk LUNs after the detach/attach update.
    pub updated_luns: BTreeSet<u32>,
    pub deleted_disk: Option<ResourceId>,
    pub resized: Vec<DiskResize>,
    pub final_vm: Option<VirtualMachine>,
    pub error: Option<String>,
    pub cleanup: Cleanup,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SampleReport {
    fn new() -> SampleReport {
        let now = Utc::now();
        SampleReport {
            resource_group: None,
            completed: Vec::new(),
            created_luns: BTreeSet::new(),
            updated_luns: BTreeSet::new(),
            deleted_disk: None,
            resized: Vec::new(),
            final_vm: None,
            error: None,
            cleanup: Cleanup::NothingToCleanUp,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for SampleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Sample {} in {}s, {} steps completed",
            if self.succeeded() { "succeeded" } else { "failed" },
            (self.finished_at - self.started_at).num_seconds(),
            self.completed.len()
        )?;
        if let Some(e) = &self.error {
            writeln!(f, "\tError: {e}")?;
        }
        writeln!(f, "\tLUNs after create: [{}]", self.created_luns.iter().join(", "))?;
        writeln!(f, "\tLUNs after update: [{}]", self.updated_luns.iter().join(", "))?;
        for r in &self.resized {
            writeln!(
                f,
                "\tResized {} {}: {} GB -> {} GB",
                if r.os_disk { "OS disk" } else { "data disk" },
                r.disk_id.name(),
                r.before_gb,
                r.after_gb
            )?;
        }
        match &self.cleanup {
            Cleanup::NothingToCleanUp => write!(f, "\tCleanup: nothing to clean up"),
            Cleanup::Deleted(id) => write!(f, "\tCleanup: deleted {id}"),
            Cleanup::Failed(e) => write!(f, "\tCleanup: FAILED {e}"),
        }
    }
}

/// Run every step, then clean up. Never fails: errors end up in the report.
pub async fn run_sample<C: CloudApi>(cloud: &C, settings: &SampleSettings) -> SampleReport {
    let mut report = SampleReport::new();
    log::info!(
        "#Start run_sample() location={} strategy={}",
        settings.location,
        settings.strategy
    );

    if let Err(e) = run_steps(cloud, settings, &mut report).await {
        log::error!("{} {e}", "Sample failed:".on_red());
        report.error = Some(e.to_string());
    }

    report.cleanup = cleanup(cloud, report.resource_group.as_ref()).await;
    report.finished_at = Utc::now();
    report
}

/// Delete the resource group if one was created. Errors are logged, not returned.
pub async fn cleanup<C: CloudApi>(cloud: &C, resource_group: Option<&ResourceId>) -> Cleanup {
    let Some(id) = resource_group else {
        log::info!("Did not create any resources in Azure. No clean up is necessary");
        return Cleanup::NothingToCleanUp;
    };
    log::info!("Deleting Resource Group: {id}");
    match cloud.delete_resource_group(id).await {
        Ok(()) => {
            log::info!("Deleted Resource Group: {id}");
            Cleanup::Deleted(id.clone())
        }
        Err(e) => {
            log::error!("{} deleting {id}: {e}", "failed".on_red());
            Cleanup::Failed(e.to_string())
        }
    }
}

async fn run_steps<C: CloudApi>(
    cloud: &C,
    settings: &SampleSettings,
    report: &mut SampleReport,
) -> Result<()> {
    let resource_names = &settings.names;
    let location = settings.location.as_str();
    let planned = settings.disk_plan.resolve_luns()?;

    //============================================================
    // Resource group

    log::info!("creating resource group...");
    let group = cloud
        .create_resource_group(&resource_names.resource_group, location)
        .await?;
    report.resource_group = Some(group.id.clone());
    log::info!("Created a resource group with name: {}", group.name.green());
    report.completed.push(Step::CreateResourceGroup);
    let rg = group.name.as_str();

    //============================================================
    // Managed disks created ahead of the VM

    // Existing disks first.
    let creation_order = planned
        .iter()
        .enumerate()
        .sorted_by_key(|(_, p)| p.disk.provisioning != Provisioning::Existing)
        .map(|(i, _)| i)
        .collect::<Vec<_>>();
    let mut slots: Vec<Option<DataDisk>> = vec![None; planned.len()];
    for i in creation_order {
        let p = &planned[i];
        let disk = match p.disk.provisioning {
            Provisioning::Implicit => {
                DataDisk::empty(p.lun, p.disk.size_gb, p.disk.sku, p.disk.caching)
            }
            Provisioning::Managed | Provisioning::Existing => {
                log::info!("Creating an empty managed disk ({} GB)", p.disk.size_gb);
                let created = cloud
                    .create_disk(
                        rg,
                        &DiskDefinition {
                            name: names::random_name(&resource_names.disk_prefix),
                            location: location.to_string(),
                            size_gb: p.disk.size_gb,
                            sku: p.disk.sku,
                        },
                    )
                    .await?;
                log::info!("Created managed disk {created}");
                DataDisk::attach(p.lun, &created, p.disk.caching)
            }
        };
        slots[i] = Some(disk);
    }
    let data_disks: Vec<DataDisk> = slots.into_iter().flatten().collect();
    report.completed.push(Step::CreateDisks);

    //============================================================
    // Networking

    log::info!("Creating virtual network {}", resource_names.vnet);
    let vnet = cloud
        .create_virtual_network(rg, &resource_names.vnet, location, VNET_ADDRESS_PREFIX, SUBNET_NAME)
        .await?;
    log::info!("Creating public IP {}", resource_names.public_ip);
    let pip = cloud
        .create_public_ip(rg, &resource_names.public_ip, location, &resource_names.public_ip_dns_label)
        .await?;
    log::info!(
        "Creating network interface {} ip={} fqdn={}",
        resource_names.nic,
        pip.ip_address.as_deref().unwrap_or("pending"),
        pip.fqdn.as_deref().unwrap_or("-")
    );
    let nic = cloud
        .create_network_interface(rg, &resource_names.nic, location, &vnet.subnet_id, Some(&pip.id))
        .await?;
    report.completed.push(Step::CreateNetwork);

    //============================================================
    // Linux VM with managed OS and data disks

    log::info!("Creating a managed Linux VM");
    let expected_luns = luns_of(&data_disks);
    let definition = VmDefinition {
        name: resource_names.vm.clone(),
        location: location.to_string(),
        size: settings.vm_size.clone(),
        image: settings.image.clone(),
        admin: AdminCredentials {
            username: settings.admin_username.clone(),
            password: settings.admin_password.clone(),
        },
        nic_id: nic.id.clone(),
        os_disk_sku: settings.os_disk_sku,
        data_disks,
    };
    let vm = cloud.create_virtual_machine(rg, &definition).await?;
    report.created_luns = vm.luns();
    if report.created_luns != expected_luns {
        return Err(Error::invalid(format!(
            "VM reports LUNs [{}], expected [{}]",
            report.created_luns.iter().join(", "),
            expected_luns.iter().join(", ")
        )));
    }
    log::info!("Created a Linux VM with managed OS and data disks: {}", vm.id);
    println!("{vm}");
    report.completed.push(Step::CreateVirtualMachine);

    //============================================================
    // Detach data disks and add a new one

    log::info!(
        "Updating Linux VM: detach LUNs [{}], attach {} new disk(s)",
        settings.detach_luns.iter().join(", "),
        settings.new_disk_sizes_gb.len()
    );
    let disk_to_delete = settings
        .detach_luns
        .first()
        .and_then(|lun| vm.data_disk(*lun))
        .and_then(|d| d.disk_id().cloned());
    let update = plan_update(&vm, &settings.detach_luns, &settings.new_disk_sizes_gb)?;
    let vm = cloud.update_virtual_machine(&update).await?;
    report.updated_luns = vm.luns();
    log::info!("Updated Linux VM: {}", vm.id);
    println!("{vm}");
    report.completed.push(Step::UpdateVirtualMachine);

    //============================================================
    // Delete a detached managed disk

    if let Some(disk_id) = disk_to_delete {
        let disk = cloud.get_disk(&disk_id).await?;
        log::info!("Delete managed disk: {}", disk.id);
        cloud.delete_disk(&disk.id).await?;
        log::info!("Deleted managed disk");
        report.deleted_disk = Some(disk.id);
        report.completed.push(Step::DeleteDisk);
    }

    //============================================================
    // Deallocate

    log::info!("De-allocate Linux VM");
    cloud.deallocate_virtual_machine(&vm.id).await?;
    log::info!("De-allocated Linux VM");
    report.completed.push(Step::DeallocateVirtualMachine);

    //============================================================
    // Grow the OS disk and every data disk

    let vm = cloud.get_virtual_machine(&vm.id).await?;
    let os_disk_id = vm
        .os_disk
        .disk_id
        .clone()
        .ok_or_else(|| Error::invalid(format!("VM {} has no managed OS disk", vm.name)))?;
    let os_disk = cloud.get_disk(&os_disk_id).await?;
    let mut disks = Vec::new();
    for d in &vm.data_disks {
        if let Some(id) = d.disk_id() {
            disks.push(cloud.get_disk(id).await?);
        }
    }

    log::info!("Update OS disk: {}", os_disk.id);
    let before = known_size(&os_disk.name, os_disk.size_gb)?;
    let resized = cloud
        .resize_disk(
            &os_disk.id,
            grown(&os_disk.name, before.checked_mul(settings.os_disk_growth_factor))?,
        )
        .await?;
    log::info!("OS disk updated {before} GB -> {}", resized);
    report.resized.push(DiskResize {
        disk_id: os_disk.id.clone(),
        os_disk: true,
        before_gb: before,
        after_gb: known_size(&resized.name, resized.size_gb)?,
    });

    for disk in disks {
        log::info!("Update data disk: {}", disk.id);
        let before = known_size(&disk.name, disk.size_gb)?;
        let resized = cloud
            .resize_disk(
                &disk.id,
                grown(&disk.name, before.checked_add(settings.data_disk_growth_gb))?,
            )
            .await?;
        log::info!("Data disk updated {before} GB -> {}", resized);
        report.resized.push(DiskResize {
            disk_id: disk.id.clone(),
            os_disk: false,
            before_gb: before,
            after_gb: known_size(&resized.name, resized.size_gb)?,
        });
    }
    report.completed.push(Step::ResizeDisks);

    //============================================================
    // Start again

    log::info!("Starting Linux VM");
    cloud.start_virtual_machine(&vm.id).await?;
    log::info!("Started Linux VM");
    let vm = cloud.get_virtual_machine(&vm.id).await?;
    println!("{vm}");
    report.final_vm = Some(vm);
    report.completed.push(Step::StartVirtualMachine);

    Ok(())
}

/// The VM as it should look after the update.
///
/// New disks take LUNs free on the VM as created, so they never reuse a LUN
/// that is being detached in the same update.
fn plan_update(
    vm: &VirtualMachine,
    detach_luns: &[u32],
    new_disk_sizes_gb: &[u32],
) -> Result<VirtualMachine> {
    let mut update = vm.clone();
    for size_gb in new_disk_sizes_gb {
        let lun = update.with_new_data_disk(*size_gb, DiskSku::default(), Caching::None)?;
        log::debug!("new {size_gb} GB data disk at LUN {lun}");
    }
    for lun in detach_luns {
        update.without_data_disk(*lun)?;
    }
    Ok(update)
}

fn known_size(name: &str, size_gb: Option<u32>) -> Result<u32> {
    size_gb.ok_or_else(|| Error::invalid(format!("size of disk {name} is unknown")))
}

fn grown(name: &str, size_gb: Option<u32>) -> Result<u32> {
    size_gb.ok_or_else(|| Error::invalid(format!("new size of disk {name} does not fit in u32")))
}
