//! The remote operations the sample needs.
//!
//! Every mutating call returns only once the long-running operation behind
//! it has reached a terminal state, so callers can treat each one as a
//! blocking step.

use crate::error::Result;
use crate::models::{
    Disk, DiskDefinition, NetworkInterface, PublicIpAddress, ResourceGroup, ResourceId,
    VirtualMachine, VirtualNetwork, VmDefinition,
};

#[allow(async_fn_in_trait)]
pub trait CloudApi {
    async fn create_resource_group(&self, name: &str, location: &str) -> Result<ResourceGroup>;

    /// Deletes the group and everything in it.
    async fn delete_resource_group(&self, id: &ResourceId) -> Result<()>;

    async fn create_disk(&self, resource_group: &str, disk: &DiskDefinition) -> Result<Disk>;

    async fn get_disk(&self, id: &ResourceId) -> Result<Disk>;

    async fn resize_disk(&self, id: &ResourceId, size_gb: u32) -> Result<Disk>;

    async fn delete_disk(&self, id: &ResourceId) -> Result<()>;

    /// Virtual network with one subnet covering `address_prefix`.
    async fn create_virtual_network(
        &self,
        resource_group: &str,
        name: &str,
        location: &str,
        address_prefix: &str,
        subnet_name: &str,
    ) -> Result<VirtualNetwork>;

    async fn create_public_ip(
        &self,
        resource_group: &str,
        name: &str,
        location: &str,
        dns_label: &str,
    ) -> Result<PublicIpAddress>;

    /// NIC with a dynamic private address in `subnet_id`.
    async fn create_network_interface(
        &self,
        resource_group: &str,
        name: &str,
        location: &str,
        subnet_id: &ResourceId,
        public_ip_id: Option<&ResourceId>,
    ) -> Result<NetworkInterface>;

    async fn create_virtual_machine(
        &self,
        resource_group: &str,
        vm: &VmDefinition,
    ) -> Result<VirtualMachine>;

    async fn get_virtual_machine(&self, id: &ResourceId) -> Result<VirtualMachine>;

    /// Resubmit the data-disk list of `vm`: slots missing from it are
    /// detached, `Empty` slots are created and attached.
    async fn update_virtual_machine(&self, vm: &VirtualMachine) -> Result<VirtualMachine>;

    /// Stop the VM and release its compute allocation.
    async fn deallocate_virtual_machine(&self, id: &ResourceId) -> Result<()>;

    async fn start_virtual_machine(&self, id: &ResourceId) -> Result<()>;
}
