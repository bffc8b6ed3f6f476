//! In-memory cloud for dry runs and tests.
//!
//! [`SimulatedCloud`] keeps resources in maps and enforces the rules the real
//! service enforces for this sample: a VM needs its NIC and disks to exist,
//! LUNs are unique per VM, an attached disk can be neither deleted nor
//! attached twice, and a disk of a running VM cannot be resized. Deleting a
//! resource group removes everything in it. Every call is recorded, and any
//! operation can be made to fail.

use crate::cloud::CloudApi;
use crate::error::{Error, Result};
use crate::models::{
    check_unique_luns, DataDisk, Disk, DiskDefinition, DiskSource, NetworkInterface,
    OsDisk, PowerState, PublicIpAddress, ResourceGroup, ResourceId, VirtualMachine,
    VirtualNetwork, VmDefinition,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Size of an OS disk created from the marketplace image.
pub const IMAGE_OS_DISK_GB: u32 = 30;

/// Remote operations, used for the call log and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateResourceGroup,
    DeleteResourceGroup,
    CreateDisk,
    GetDisk,
    ResizeDisk,
    DeleteDisk,
    CreateVirtualNetwork,
    CreatePublicIp,
    CreateNetworkInterface,
    CreateVirtualMachine,
    GetVirtualMachine,
    UpdateVirtualMachine,
    DeallocateVirtualMachine,
    StartVirtualMachine,
}

#[derive(Default)]
struct State {
    groups: BTreeMap<String, ResourceGroup>,
    disks: BTreeMap<String, Disk>,
    vnets: BTreeMap<String, VirtualNetwork>,
    public_ips: BTreeMap<String, PublicIpAddress>,
    nics: BTreeMap<String, NetworkInterface>,
    vms: BTreeMap<String, VirtualMachine>,
    calls: Vec<Operation>,
    fail_on: HashSet<Operation>,
    next_ip: u8,
    next_disk: u32,
}

fn key(id: &ResourceId) -> String {
    id.as_str().to_ascii_lowercase()
}

impl State {
    fn require_group(&self, name: &str) -> Result<()> {
        if self.groups.contains_key(&name.to_ascii_lowercase()) {
            Ok(())
        } else {
            Err(Error::not_found(format!("resource group {name}")))
        }
    }

    fn disk_mut(&mut self, id: &ResourceId) -> Result<&mut Disk> {
        self.disks
            .get_mut(&key(id))
            .ok_or_else(|| Error::not_found(format!("disk {id}")))
    }

    fn vm_is_running(&self, vm_id: &ResourceId) -> bool {
        self.vms
            .get(&key(vm_id))
            .map(|vm| {
                !matches!(
                    vm.power_state,
                    Some(PowerState::Deallocated) | Some(PowerState::Stopped)
                )
            })
            .unwrap_or(false)
    }

    fn attach(&mut self, disk_id: &ResourceId, vm_id: &ResourceId) -> Result<()> {
        let disk = self.disk_mut(disk_id)?;
        if let Some(owner) = disk.managed_by.as_ref().filter(|o| *o != vm_id) {
            return Err(Error::conflict(format!(
                "disk {} is already attached to {}",
                disk.name,
                owner.name()
            )));
        }
        disk.managed_by = Some(vm_id.clone());
        disk.state = Some("Attached".to_string());
        Ok(())
    }

    fn detach(&mut self, disk_id: &ResourceId) {
        if let Some(disk) = self.disks.get_mut(&key(disk_id)) {
            disk.managed_by = None;
            disk.state = Some("Unattached".to_string());
        }
    }

    fn insert_disk(&mut self, disk: Disk) -> Disk {
        self.disks.insert(key(&disk.id), disk.clone());
        disk
    }

    /// Fail unless every disk in `disks` can be attached to `vm_id`.
    fn check_data_disks(&self, vm_id: &ResourceId, disks: &[DataDisk]) -> Result<()> {
        check_unique_luns(disks)?;
        for d in disks {
            if let DiskSource::Attach { disk_id } = &d.source {
                let disk = self
                    .disks
                    .get(&key(disk_id))
                    .ok_or_else(|| Error::not_found(format!("disk {disk_id}")))?;
                if let Some(owner) = disk.managed_by.as_ref().filter(|o| *o != vm_id) {
                    return Err(Error::conflict(format!(
                        "disk {} is already attached to {}",
                        disk_id.name(),
                        owner.name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Turn every `Empty` slot into an attached managed disk named after the VM.
    fn materialize_data_disks(
        &mut self,
        subscription_id: &str,
        resource_group: &str,
        vm_id: &ResourceId,
        vm_name: &str,
        location: &str,
        disks: &[DataDisk],
    ) -> Result<Vec<DataDisk>> {
        self.check_data_disks(vm_id, disks)?;

        let mut result = Vec::with_capacity(disks.len());
        for d in disks {
            let disk = match &d.source {
                DiskSource::Empty { size_gb, sku } => {
                    self.next_disk += 1;
                    let name = format!("{vm_name}_disk{}_lun{}", self.next_disk, d.lun);
                    self.insert_disk(Disk {
                        id: ResourceId::in_group(
                            subscription_id,
                            resource_group,
                            "Microsoft.Compute/disks",
                            &name,
                        ),
                        name,
                        location: location.to_string(),
                        size_gb: Some(*size_gb),
                        sku: *sku,
                        state: None,
                        managed_by: None,
                    })
                }
                DiskSource::Attach { disk_id } => self.disk_mut(disk_id)?.clone(),
            };
            self.attach(&disk.id, vm_id)?;
            result.push(DataDisk::attach(d.lun, &disk, d.caching));
        }
        Ok(result)
    }

    /// The VM with disk sizes as they are now.
    fn snapshot(&self, vm: &VirtualMachine) -> VirtualMachine {
        let mut vm = vm.clone();
        if let Some(os) = vm.os_disk.disk_id.as_ref().and_then(|id| self.disks.get(&key(id))) {
            vm.os_disk.size_gb = os.size_gb;
        }
        for d in vm.data_disks.iter_mut() {
            if let Some(disk) = d.disk_id().and_then(|id| self.disks.get(&key(id))) {
                d.size_gb = disk.size_gb;
            }
        }
        vm
    }
}

/// A cloud that lives in memory.
pub struct SimulatedCloud {
    subscription_id: String,
    state: Mutex<State>,
}

impl SimulatedCloud {
    pub fn new(subscription_id: &str) -> SimulatedCloud {
        SimulatedCloud {
            subscription_id: subscription_id.to_string(),
            state: Mutex::new(State {
                next_ip: 4,
                ..State::default()
            }),
        }
    }

    /// Make `op` fail every time it is called.
    pub fn fail_on(self, op: Operation) -> SimulatedCloud {
        self.lock().fail_on.insert(op);
        self
    }

    /// Operations called so far, in order.
    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, op: Operation) -> usize {
        self.lock().calls.iter().filter(|c| **c == op).count()
    }

    pub fn resource_group_exists(&self, name: &str) -> bool {
        self.lock().groups.contains_key(&name.to_ascii_lowercase())
    }

    /// Every disk currently known, in id order.
    pub fn disks(&self) -> Vec<Disk> {
        self.lock().disks.values().cloned().collect()
    }

    pub fn virtual_machines(&self) -> Vec<VirtualMachine> {
        let state = self.lock();
        state.vms.values().map(|vm| state.snapshot(vm)).collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and apply failure injection.
    fn begin(&self, op: Operation) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(op);
        log::debug!("simulated {op:?}");
        if state.fail_on.contains(&op) {
            return Err(Error::Api {
                method: "SIMULATED".to_string(),
                url: format!("{op:?}"),
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        Ok(state)
    }
}

impl CloudApi for SimulatedCloud {
    async fn create_resource_group(&self, name: &str, location: &str) -> Result<ResourceGroup> {
        let mut state = self.begin(Operation::CreateResourceGroup)?;
        let group = ResourceGroup {
            id: ResourceId::resource_group(&self.subscription_id, name),
            name: name.to_string(),
            location: location.to_string(),
        };
        state.groups.insert(name.to_ascii_lowercase(), group.clone());
        Ok(group)
    }

    async fn delete_resource_group(&self, id: &ResourceId) -> Result<()> {
        let mut state = self.begin(Operation::DeleteResourceGroup)?;
        if !id.is_resource_group() {
            return Err(Error::invalid(format!("{id} is not a resource group")));
        }
        let name = id.resource_group_name().to_string();
        if state.groups.remove(&name.to_ascii_lowercase()).is_none() {
            return Err(Error::not_found(format!("resource group {name}")));
        }
        let prefix = format!("{}/", key(id));
        state.disks.retain(|k, _| !k.starts_with(&prefix));
        state.vnets.retain(|k, _| !k.starts_with(&prefix));
        state.public_ips.retain(|k, _| !k.starts_with(&prefix));
        state.nics.retain(|k, _| !k.starts_with(&prefix));
        state.vms.retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }

    async fn create_disk(&self, resource_group: &str, disk: &DiskDefinition) -> Result<Disk> {
        let mut state = self.begin(Operation::CreateDisk)?;
        state.require_group(resource_group)?;
        Ok(state.insert_disk(Disk {
            id: ResourceId::in_group(
                &self.subscription_id,
                resource_group,
                "Microsoft.Compute/disks",
                &disk.name,
            ),
            name: disk.name.clone(),
            location: disk.location.clone(),
            size_gb: Some(disk.size_gb),
            sku: disk.sku,
            state: Some("Unattached".to_string()),
            managed_by: None,
        }))
    }

    async fn get_disk(&self, id: &ResourceId) -> Result<Disk> {
        let mut state = self.begin(Operation::GetDisk)?;
        state.disk_mut(id).map(|d| d.clone())
    }

    async fn resize_disk(&self, id: &ResourceId, size_gb: u32) -> Result<Disk> {
        let mut state = self.begin(Operation::ResizeDisk)?;
        let owner = state.disk_mut(id)?.managed_by.clone();
        if let Some(vm_id) = owner {
            if state.vm_is_running(&vm_id) {
                return Err(Error::conflict(format!(
                    "disk {} is attached to running VM {}",
                    id.name(),
                    vm_id.name()
                )));
            }
        }
        let disk = state.disk_mut(id)?;
        if disk.size_gb.is_some_and(|current| size_gb < current) {
            return Err(Error::invalid(format!(
                "disk {} cannot shrink from {:?} to {size_gb} GB",
                disk.name, disk.size_gb
            )));
        }
        disk.size_gb = Some(size_gb);
        Ok(disk.clone())
    }

    async fn delete_disk(&self, id: &ResourceId) -> Result<()> {
        let mut state = self.begin(Operation::DeleteDisk)?;
        if let Some(owner) = &state.disk_mut(id)?.managed_by {
            return Err(Error::conflict(format!(
                "disk {} is attached to {}",
                id.name(),
                owner.name()
            )));
        }
        state.disks.remove(&key(id));
        Ok(())
    }

    async fn create_virtual_network(
        &self,
        resource_group: &str,
        name: &str,
        _location: &str,
        address_prefix: &str,
        subnet_name: &str,
    ) -> Result<VirtualNetwork> {
        let mut state = self.begin(Operation::CreateVirtualNetwork)?;
        state.require_group(resource_group)?;
        let id = ResourceId::in_group(
            &self.subscription_id,
            resource_group,
            "Microsoft.Network/virtualNetworks",
            name,
        );
        let vnet = VirtualNetwork {
            subnet_id: id.child("subnets", subnet_name),
            id,
            name: name.to_string(),
            address_prefix: address_prefix.to_string(),
        };
        state.vnets.insert(key(&vnet.id), vnet.clone());
        Ok(vnet)
    }

    async fn create_public_ip(
        &self,
        resource_group: &str,
        name: &str,
        location: &str,
        dns_label: &str,
    ) -> Result<PublicIpAddress> {
        let mut state = self.begin(Operation::CreatePublicIp)?;
        state.require_group(resource_group)?;
        let octet = state.next_ip;
        state.next_ip = state.next_ip.wrapping_add(1);
        let pip = PublicIpAddress {
            id: ResourceId::in_group(
                &self.subscription_id,
                resource_group,
                "Microsoft.Network/publicIPAddresses",
                name,
            ),
            name: name.to_string(),
            dns_label: dns_label.to_string(),
            ip_address: Some(format!("20.0.0.{octet}")),
            fqdn: Some(format!("{dns_label}.{location}.cloudapp.azure.com")),
        };
        state.public_ips.insert(key(&pip.id), pip.clone());
        Ok(pip)
    }

    async fn create_network_interface(
        &self,
        resource_group: &str,
        name: &str,
        _location: &str,
        subnet_id: &ResourceId,
        public_ip_id: Option<&ResourceId>,
    ) -> Result<NetworkInterface> {
        let mut state = self.begin(Operation::CreateNetworkInterface)?;
        state.require_group(resource_group)?;
        if !state.vnets.values().any(|v| v.subnet_id == *subnet_id) {
            return Err(Error::not_found(format!("subnet {subnet_id}")));
        }
        if let Some(pip) = public_ip_id {
            if !state.public_ips.contains_key(&key(pip)) {
                return Err(Error::not_found(format!("public ip {pip}")));
            }
        }
        let nic = NetworkInterface {
            id: ResourceId::in_group(
                &self.subscription_id,
                resource_group,
                "Microsoft.Network/networkInterfaces",
                name,
            ),
            name: name.to_string(),
            subnet_id: subnet_id.clone(),
            public_ip_id: public_ip_id.cloned(),
        };
        state.nics.insert(key(&nic.id), nic.clone());
        Ok(nic)
    }

    async fn create_virtual_machine(
        &self,
        resource_group: &str,
        vm: &VmDefinition,
    ) -> Result<VirtualMachine> {
        let mut state = self.begin(Operation::CreateVirtualMachine)?;
        state.require_group(resource_group)?;
        if !state.nics.contains_key(&key(&vm.nic_id)) {
            return Err(Error::not_found(format!("network interface {}", vm.nic_id)));
        }
        let id = ResourceId::in_group(
            &self.subscription_id,
            resource_group,
            "Microsoft.Compute/virtualMachines",
            &vm.name,
        );
        if state.vms.contains_key(&key(&id)) {
            return Err(Error::conflict(format!("VM {} already exists", vm.name)));
        }

        let data_disks = state.materialize_data_disks(
            &self.subscription_id,
            resource_group,
            &id,
            &vm.name,
            &vm.location,
            &vm.data_disks,
        )?;
        let os_name = format!("{}_OsDisk_1", vm.name);
        let os = state.insert_disk(Disk {
            id: ResourceId::in_group(
                &self.subscription_id,
                resource_group,
                "Microsoft.Compute/disks",
                &os_name,
            ),
            name: os_name,
            location: vm.location.clone(),
            size_gb: Some(IMAGE_OS_DISK_GB),
            sku: vm.os_disk_sku,
            state: None,
            managed_by: None,
        });
        state.attach(&os.id, &id)?;

        let created = VirtualMachine {
            id: id.clone(),
            name: vm.name.clone(),
            location: vm.location.clone(),
            size: vm.size.clone(),
            image: Some(vm.image.clone()),
            os_disk: OsDisk {
                name: Some(os.name.clone()),
                disk_id: Some(os.id.clone()),
                size_gb: os.size_gb,
                sku: vm.os_disk_sku,
            },
            data_disks,
            nic_ids: vec![vm.nic_id.clone()],
            provisioning_state: Some("Succeeded".to_string()),
            power_state: Some(PowerState::Running),
        };
        state.vms.insert(key(&id), created.clone());
        Ok(created)
    }

    async fn get_virtual_machine(&self, id: &ResourceId) -> Result<VirtualMachine> {
        let state = self.begin(Operation::GetVirtualMachine)?;
        state
            .vms
            .get(&key(id))
            .map(|vm| state.snapshot(vm))
            .ok_or_else(|| Error::not_found(format!("virtual machine {id}")))
    }

    async fn update_virtual_machine(&self, vm: &VirtualMachine) -> Result<VirtualMachine> {
        let mut state = self.begin(Operation::UpdateVirtualMachine)?;
        let current = state
            .vms
            .get(&key(&vm.id))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("virtual machine {}", vm.id)))?;

        state.check_data_disks(&vm.id, &vm.data_disks)?;
        let kept: HashSet<ResourceId> = vm.data_disks.iter().filter_map(|d| d.disk_id().cloned()).collect();
        for old in &current.data_disks {
            if let Some(old_id) = old.disk_id() {
                if !kept.contains(old_id) {
                    state.detach(old_id);
                }
            }
        }

        let data_disks = state.materialize_data_disks(
            &self.subscription_id,
            vm.id.resource_group_name(),
            &vm.id,
            &current.name,
            &current.location,
            &vm.data_disks,
        )?;
        let mut updated = current;
        updated.data_disks = data_disks;
        state.vms.insert(key(&vm.id), updated.clone());
        Ok(state.snapshot(&updated))
    }

    async fn deallocate_virtual_machine(&self, id: &ResourceId) -> Result<()> {
        let mut state = self.begin(Operation::DeallocateVirtualMachine)?;
        let vm = state
            .vms
            .get_mut(&key(id))
            .ok_or_else(|| Error::not_found(format!("virtual machine {id}")))?;
        vm.power_state = Some(PowerState::Deallocated);
        Ok(())
    }

    async fn start_virtual_machine(&self, id: &ResourceId) -> Result<()> {
        let mut state = self.begin(Operation::StartVirtualMachine)?;
        let vm = state
            .vms
            .get_mut(&key(id))
            .ok_or_else(|| Error::not_found(format!("virtual machine {id}")))?;
        vm.power_state = Some(PowerState::Running);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdminCredentials, Caching, DiskSku};
    use std::collections::BTreeSet;

    const RG: &str = "rgCOMV-test";

    async fn cloud_with_network() -> (SimulatedCloud, NetworkInterface) {
        let cloud = SimulatedCloud::new("sub");
        cloud.create_resource_group(RG, "eastus").await.unwrap();
        let vnet = cloud
            .create_virtual_network(RG, "vnet-1", "eastus", "10.0.0.0/28", "subnet1")
            .await
            .unwrap();
        let nic = cloud
            .create_network_interface(RG, "nic-1", "eastus", &vnet.subnet_id, None)
            .await
            .unwrap();
        (cloud, nic)
    }

    fn definition(nic: &NetworkInterface, data_disks: Vec<DataDisk>) -> VmDefinition {
        VmDefinition {
            name: "VM1-test".to_string(),
            location: "eastus".to_string(),
            size: "Standard_D2a_v4".to_string(),
            image: crate::config::ubuntu_image(),
            admin: AdminCredentials {
                username: "azureuser".to_string(),
                password: "Pa5!secret".to_string(),
            },
            nic_id: nic.id.clone(),
            os_disk_sku: DiskSku::StandardLrs,
            data_disks,
        }
    }

    fn disk_def(name: &str, size_gb: u32) -> DiskDefinition {
        DiskDefinition {
            name: name.to_string(),
            location: "eastus".to_string(),
            size_gb,
            sku: DiskSku::StandardLrs,
        }
    }

    #[tokio::test]
    async fn test_create_disk_requires_group() {
        let cloud = SimulatedCloud::new("sub");
        let err = cloud.create_disk("missing", &disk_def("dsk-a", 50)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got {err}");
    }

    #[tokio::test]
    async fn test_vm_requires_existing_nic() {
        let cloud = SimulatedCloud::new("sub");
        cloud.create_resource_group(RG, "eastus").await.unwrap();
        let ghost_nic = NetworkInterface {
            id: ResourceId::in_group("sub", RG, "Microsoft.Network/networkInterfaces", "ghost"),
            name: "ghost".to_string(),
            subnet_id: ResourceId::in_group("sub", RG, "Microsoft.Network/virtualNetworks", "v")
                .child("subnets", "s"),
            public_ip_id: None,
        };
        let err = cloud
            .create_virtual_machine(RG, &definition(&ghost_nic, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got {err}");
    }

    #[tokio::test]
    async fn test_vm_rejects_duplicate_luns() {
        let (cloud, nic) = cloud_with_network().await;
        let disks = vec![
            DataDisk::empty(1, 10, DiskSku::StandardLrs, Caching::None),
            DataDisk::empty(1, 10, DiskSku::StandardLrs, Caching::None),
        ];
        assert!(cloud
            .create_virtual_machine(RG, &definition(&nic, disks))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_attached_disk_cannot_be_deleted() {
        let (cloud, nic) = cloud_with_network().await;
        let disk = cloud.create_disk(RG, &disk_def("dsk-a", 50)).await.unwrap();
        let vm = cloud
            .create_virtual_machine(
                RG,
                &definition(&nic, vec![DataDisk::attach(0, &disk, Caching::None)]),
            )
            .await
            .unwrap();
        let err = cloud.delete_disk(&disk.id).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "got {err}");

        let mut detached = vm.clone();
        detached.without_data_disk(0).unwrap();
        cloud.update_virtual_machine(&detached).await.unwrap();
        cloud.delete_disk(&disk.id).await.expect("detached disk can be deleted");
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_disks_attached() {
        let (cloud, nic) = cloud_with_network().await;
        let disk = cloud.create_disk(RG, &disk_def("dsk-a", 50)).await.unwrap();
        let vm = cloud
            .create_virtual_machine(
                RG,
                &definition(&nic, vec![DataDisk::attach(0, &disk, Caching::None)]),
            )
            .await
            .unwrap();

        let mut update = vm.clone();
        update.without_data_disk(0).unwrap();
        let mut ghost = disk.clone();
        ghost.id = ResourceId::in_group("sub", RG, "Microsoft.Compute/disks", "dsk-ghost");
        update.data_disks.push(DataDisk::attach(1, &ghost, Caching::None));
        let err = cloud.update_virtual_machine(&update).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got {err}");

        let kept = cloud.get_disk(&disk.id).await.unwrap();
        assert_eq!(kept.managed_by.as_ref(), Some(&vm.id));
        assert_eq!(kept.state.as_deref(), Some("Attached"));
        let current = cloud.get_virtual_machine(&vm.id).await.unwrap();
        assert_eq!(current.luns(), BTreeSet::from([0]));
    }

    #[tokio::test]
    async fn test_resize_needs_deallocated_vm() {
        let (cloud, nic) = cloud_with_network().await;
        let vm = cloud
            .create_virtual_machine(RG, &definition(&nic, vec![]))
            .await
            .unwrap();
        let os_id = vm.os_disk.disk_id.clone().unwrap();
        let err = cloud.resize_disk(&os_id, 60).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "got {err}");

        cloud.deallocate_virtual_machine(&vm.id).await.unwrap();
        let disk = cloud.resize_disk(&os_id, 60).await.unwrap();
        assert_eq!(disk.size_gb, Some(60));
        assert!(cloud.resize_disk(&os_id, 10).await.is_err(), "no shrinking");

        let vm = cloud.get_virtual_machine(&vm.id).await.unwrap();
        assert_eq!(vm.os_disk.size_gb, Some(60));
    }

    #[tokio::test]
    async fn test_delete_group_cascades() {
        let (cloud, nic) = cloud_with_network().await;
        let vm = cloud
            .create_virtual_machine(
                RG,
                &definition(&nic, vec![DataDisk::empty(0, 10, DiskSku::StandardLrs, Caching::None)]),
            )
            .await
            .unwrap();
        assert_eq!(cloud.disks().len(), 2);
        let err = cloud.delete_resource_group(&vm.id).await.unwrap_err();
        assert!(matches!(err, Error::Invalid(_)), "got {err}");
        assert!(cloud.resource_group_exists(RG));
        let rg_id = ResourceId::resource_group("sub", RG);
        cloud.delete_resource_group(&rg_id).await.unwrap();
        assert!(!cloud.resource_group_exists(RG));
        assert!(cloud.disks().is_empty());
        assert!(cloud.get_virtual_machine(&vm.id).await.is_err());
        assert!(cloud.delete_resource_group(&rg_id).await.is_err());
    }

    #[tokio::test]
    async fn test_fail_on_records_call() {
        let cloud = SimulatedCloud::new("sub").fail_on(Operation::CreateResourceGroup);
        assert!(cloud.create_resource_group(RG, "eastus").await.is_err());
        assert_eq!(cloud.calls(), vec![Operation::CreateResourceGroup]);
        assert!(!cloud.resource_group_exists(RG));
    }
}
