//! ARM JSON shapes.
//!
//! Response bodies are parsed into the structs below and converted into
//! [`crate::models`] types. Request bodies are built with `json!`.

use crate::error::{Error, Result};
use crate::models::{
    Caching, DataDisk, Disk, DiskDefinition, DiskSku, DiskSource, ImageReference,
    NetworkInterface, OsDisk, PowerState, PublicIpAddress, ResourceGroup, ResourceId,
    VirtualMachine, VirtualNetwork, VmDefinition,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// Parse `text` and report the JSON path of the first mismatch.
pub fn parse_json<T: DeserializeOwned>(text: &str, context: &str) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", text);
        Error::Parse {
            context: context.to_string(),
            path: e.path().to_string(),
            message: e.inner().to_string(),
        }
    })
}

/// `properties.provisioningState` of a raw body.
pub fn provisioning_state(body: &Value) -> Option<&str> {
    body.get("properties")?.get("provisioningState")?.as_str()
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ArmResource<P> {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub managed_by: Option<String>,
    pub sku: Option<Sku>,
    pub properties: Option<P>,
}

#[derive(Deserialize, Debug)]
pub struct Sku {
    pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct IdRef {
    pub id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn describe(&self) -> String {
        format!(
            "{}: {}",
            self.code.as_deref().unwrap_or("Unknown"),
            self.message.as_deref().unwrap_or("no message")
        )
    }
}

/// Body of an `Azure-AsyncOperation` status URL.
#[derive(Deserialize, Debug)]
pub struct AsyncOperation {
    pub status: String,
    pub error: Option<ErrorBody>,
}

#[derive(Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    pub provisioning_state: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiskProperties {
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: Option<u32>,
    pub disk_state: Option<String>,
    pub provisioning_state: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VmProperties {
    pub hardware_profile: Option<HardwareProfile>,
    pub storage_profile: Option<StorageProfile>,
    pub network_profile: Option<NetworkProfile>,
    pub provisioning_state: Option<String>,
    pub instance_view: Option<InstanceView>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    pub vm_size: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    pub image_reference: Option<WireImageReference>,
    pub os_disk: Option<WireOsDisk>,
    #[serde(default)]
    pub data_disks: Vec<WireDataDisk>,
}

#[derive(Deserialize, Debug)]
pub struct WireImageReference {
    pub publisher: Option<String>,
    pub offer: Option<String>,
    pub sku: Option<String>,
    pub version: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDiskRef {
    pub id: Option<String>,
    pub storage_account_type: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WireOsDisk {
    pub name: Option<String>,
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: Option<u32>,
    pub managed_disk: Option<ManagedDiskRef>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WireDataDisk {
    pub lun: u32,
    pub name: Option<String>,
    pub caching: Option<String>,
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: Option<u32>,
    pub managed_disk: Option<ManagedDiskRef>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(default)]
    pub network_interfaces: Vec<IdRef>,
}

#[derive(Deserialize, Debug)]
pub struct InstanceView {
    #[serde(default)]
    pub statuses: Vec<InstanceViewStatus>,
}

#[derive(Deserialize, Debug)]
pub struct InstanceViewStatus {
    pub code: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct VnetProperties {
    pub address_space: Option<AddressSpace>,
    #[serde(default)]
    pub subnets: Vec<IdRef>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpProperties {
    pub ip_address: Option<String>,
    pub dns_settings: Option<DnsSettings>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DnsSettings {
    pub domain_name_label: Option<String>,
    pub fqdn: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NicProperties {
    #[serde(default)]
    pub ip_configurations: Vec<IpConfiguration>,
}

#[derive(Deserialize, Debug)]
pub struct IpConfiguration {
    pub properties: Option<IpConfigurationProperties>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IpConfigurationProperties {
    pub subnet: Option<IdRef>,
    pub public_ip_address: Option<IdRef>,
}

fn parse_optional_id(id: Option<&str>) -> Result<Option<ResourceId>> {
    id.map(ResourceId::parse).transpose()
}

impl TryFrom<ArmResource<ResourceGroupProperties>> for ResourceGroup {
    type Error = Error;

    fn try_from(r: ArmResource<ResourceGroupProperties>) -> Result<Self> {
        Ok(ResourceGroup {
            id: ResourceId::parse(&r.id)?,
            name: r.name,
            location: r.location,
        })
    }
}

impl TryFrom<ArmResource<DiskProperties>> for Disk {
    type Error = Error;

    fn try_from(r: ArmResource<DiskProperties>) -> Result<Self> {
        let props = r.properties.unwrap_or_default();
        let sku = match r.sku.and_then(|s| s.name) {
            Some(name) => name.parse()?,
            None => DiskSku::default(),
        };
        Ok(Disk {
            id: ResourceId::parse(&r.id)?,
            name: r.name,
            location: r.location,
            size_gb: props.disk_size_gb,
            sku,
            state: props.disk_state,
            managed_by: parse_optional_id(r.managed_by.as_deref())?,
        })
    }
}

impl TryFrom<WireDataDisk> for DataDisk {
    type Error = Error;

    fn try_from(d: WireDataDisk) -> Result<Self> {
        let managed = d.managed_disk;
        let disk_id = parse_optional_id(managed.as_ref().and_then(|m| m.id.as_deref()))?;
        let source = match disk_id {
            Some(disk_id) => DiskSource::Attach { disk_id },
            None => DiskSource::Empty {
                size_gb: d.disk_size_gb.unwrap_or_default(),
                sku: match managed.and_then(|m| m.storage_account_type) {
                    Some(t) => t.parse()?,
                    None => DiskSku::default(),
                },
            },
        };
        Ok(DataDisk {
            lun: d.lun,
            caching: Caching::from_arm(d.caching.as_deref()),
            source,
            name: d.name,
            size_gb: d.disk_size_gb,
        })
    }
}

impl TryFrom<ArmResource<VmProperties>> for VirtualMachine {
    type Error = Error;

    fn try_from(r: ArmResource<VmProperties>) -> Result<Self> {
        let props = r.properties.unwrap_or_default();
        let storage = props.storage_profile;
        let (image, os_disk, data_disks) = match storage {
            Some(s) => {
                let image = s.image_reference.map(|i| ImageReference {
                    publisher: i.publisher.unwrap_or_default(),
                    offer: i.offer.unwrap_or_default(),
                    sku: i.sku.unwrap_or_default(),
                    version: i.version.unwrap_or_default(),
                });
                let os_disk = match s.os_disk {
                    Some(o) => {
                        let managed = o.managed_disk;
                        OsDisk {
                            name: o.name,
                            disk_id: parse_optional_id(
                                managed.as_ref().and_then(|m| m.id.as_deref()),
                            )?,
                            size_gb: o.disk_size_gb,
                            sku: match managed.and_then(|m| m.storage_account_type) {
                                Some(t) => t.parse()?,
                                None => DiskSku::default(),
                            },
                        }
                    }
                    None => OsDisk::default(),
                };
                let data_disks = s
                    .data_disks
                    .into_iter()
                    .map(DataDisk::try_from)
                    .collect::<Result<Vec<_>>>()?;
                (image, os_disk, data_disks)
            }
            None => (None, OsDisk::default(), Vec::new()),
        };
        let nic_ids = props
            .network_profile
            .map(|n| n.network_interfaces)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|n| n.id)
            .map(|id| ResourceId::parse(&id))
            .collect::<Result<Vec<_>>>()?;
        let power_state = props.instance_view.and_then(|v| {
            v.statuses
                .iter()
                .filter_map(|s| s.code.as_deref())
                .find_map(PowerState::from_status_code)
        });

        Ok(VirtualMachine {
            id: ResourceId::parse(&r.id)?,
            name: r.name,
            location: r.location,
            size: props
                .hardware_profile
                .and_then(|h| h.vm_size)
                .unwrap_or_default(),
            image,
            os_disk,
            data_disks,
            nic_ids,
            provisioning_state: props.provisioning_state,
            power_state,
        })
    }
}

impl VirtualNetwork {
    pub(crate) fn from_arm(r: ArmResource<VnetProperties>, subnet_name: &str) -> Result<Self> {
        let id = ResourceId::parse(&r.id)?;
        let props = r.properties.unwrap_or_default();
        let subnet_id = match props.subnets.into_iter().find_map(|s| s.id) {
            Some(sid) => ResourceId::parse(&sid)?,
            None => id.child("subnets", subnet_name),
        };
        Ok(VirtualNetwork {
            address_prefix: props
                .address_space
                .and_then(|a| a.address_prefixes.into_iter().next())
                .unwrap_or_default(),
            id,
            name: r.name,
            subnet_id,
        })
    }
}

impl TryFrom<ArmResource<PublicIpProperties>> for PublicIpAddress {
    type Error = Error;

    fn try_from(r: ArmResource<PublicIpProperties>) -> Result<Self> {
        let props = r.properties.unwrap_or_default();
        let (dns_label, fqdn) = match props.dns_settings {
            Some(d) => (d.domain_name_label.unwrap_or_default(), d.fqdn),
            None => (String::new(), None),
        };
        Ok(PublicIpAddress {
            id: ResourceId::parse(&r.id)?,
            name: r.name,
            dns_label,
            ip_address: props.ip_address,
            fqdn,
        })
    }
}

impl TryFrom<ArmResource<NicProperties>> for NetworkInterface {
    type Error = Error;

    fn try_from(r: ArmResource<NicProperties>) -> Result<Self> {
        let props = r.properties.unwrap_or_default();
        let ip = props
            .ip_configurations
            .into_iter()
            .find_map(|c| c.properties)
            .ok_or_else(|| Error::invalid(format!("NIC {} has no ip configuration", r.name)))?;
        let subnet_id = ip
            .subnet
            .and_then(|s| s.id)
            .ok_or_else(|| Error::invalid(format!("NIC {} has no subnet", r.name)))?;
        Ok(NetworkInterface {
            id: ResourceId::parse(&r.id)?,
            name: r.name,
            subnet_id: ResourceId::parse(&subnet_id)?,
            public_ip_id: parse_optional_id(
                ip.public_ip_address.and_then(|p| p.id).as_deref(),
            )?,
        })
    }
}

pub fn resource_group_body(location: &str) -> Value {
    json!({ "location": location })
}

pub fn disk_body(disk: &DiskDefinition) -> Value {
    json!({
        "location": disk.location,
        "sku": { "name": disk.sku.as_str() },
        "properties": {
            "creationData": { "createOption": "Empty" },
            "diskSizeGB": disk.size_gb,
        }
    })
}

pub fn disk_resize_body(size_gb: u32) -> Value {
    json!({ "properties": { "diskSizeGB": size_gb } })
}

pub fn vnet_body(location: &str, address_prefix: &str, subnet_name: &str) -> Value {
    json!({
        "location": location,
        "properties": {
            "addressSpace": { "addressPrefixes": [address_prefix] },
            "subnets": [
                { "name": subnet_name, "properties": { "addressPrefix": address_prefix } }
            ]
        }
    })
}

pub fn public_ip_body(location: &str, dns_label: &str) -> Value {
    json!({
        "location": location,
        "sku": { "name": "Standard" },
        "properties": {
            "publicIPAllocationMethod": "Static",
            "dnsSettings": { "domainNameLabel": dns_label }
        }
    })
}

pub fn nic_body(location: &str, subnet_id: &ResourceId, public_ip_id: Option<&ResourceId>) -> Value {
    let mut ip_properties = json!({
        "privateIPAllocationMethod": "Dynamic",
        "subnet": { "id": subnet_id.as_str() },
    });
    if let Some(pip) = public_ip_id {
        ip_properties["publicIPAddress"] = json!({ "id": pip.as_str() });
    }
    json!({
        "location": location,
        "properties": {
            "ipConfigurations": [ { "name": "ipconfig1", "properties": ip_properties } ]
        }
    })
}

/// One `storageProfile.dataDisks` entry.
pub fn data_disk_body(disk: &DataDisk) -> Value {
    match &disk.source {
        DiskSource::Empty { size_gb, sku } => json!({
            "lun": disk.lun,
            "createOption": "Empty",
            "caching": disk.caching.as_str(),
            "diskSizeGB": size_gb,
            "managedDisk": { "storageAccountType": sku.as_str() },
        }),
        DiskSource::Attach { disk_id } => json!({
            "lun": disk.lun,
            "createOption": "Attach",
            "caching": disk.caching.as_str(),
            "managedDisk": { "id": disk_id.as_str() },
        }),
    }
}

pub fn vm_body(vm: &VmDefinition) -> Value {
    json!({
        "location": vm.location,
        "properties": {
            "hardwareProfile": { "vmSize": vm.size },
            "storageProfile": {
                "imageReference": {
                    "publisher": vm.image.publisher,
                    "offer": vm.image.offer,
                    "sku": vm.image.sku,
                    "version": vm.image.version,
                },
                "osDisk": {
                    "createOption": "FromImage",
                    "managedDisk": { "storageAccountType": vm.os_disk_sku.as_str() },
                },
                "dataDisks": vm.data_disks.iter().map(data_disk_body).collect::<Vec<_>>(),
            },
            "osProfile": {
                "computerName": vm.name,
                "adminUsername": vm.admin.username,
                "adminPassword": vm.admin.password,
                "linuxConfiguration": { "disablePasswordAuthentication": false },
            },
            "networkProfile": {
                "networkInterfaces": [ { "id": vm.nic_id.as_str(), "properties": { "primary": true } } ]
            }
        }
    })
}

/// PATCH body replacing the data-disk list of a VM.
pub fn vm_data_disks_patch_body(vm: &VirtualMachine) -> Value {
    json!({
        "properties": {
            "storageProfile": {
                "dataDisks": vm.data_disks.iter().map(data_disk_body).collect::<Vec<_>>(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VM_JSON: &str = r#"{
        "id": "/subscriptions/s/resourceGroups/rgCOMV-1/providers/Microsoft.Compute/virtualMachines/VM1-1",
        "name": "VM1-1",
        "location": "eastus",
        "properties": {
            "hardwareProfile": { "vmSize": "Standard_D2a_v4" },
            "provisioningState": "Succeeded",
            "storageProfile": {
                "imageReference": { "publisher": "Canonical", "offer": "0001-com-ubuntu-server-jammy", "sku": "22_04-lts-gen2", "version": "latest" },
                "osDisk": {
                    "name": "VM1-1_OsDisk_1",
                    "diskSizeGB": 30,
                    "managedDisk": { "id": "/subscriptions/s/resourceGroups/RGCOMV-1/providers/Microsoft.Compute/disks/VM1-1_OsDisk_1", "storageAccountType": "Standard_LRS" }
                },
                "dataDisks": [
                    { "lun": 1, "name": "VM1-1_disk2", "caching": "ReadWrite", "createOption": "Empty", "diskSizeGB": 100,
                      "managedDisk": { "id": "/subscriptions/s/resourceGroups/RGCOMV-1/providers/Microsoft.Compute/disks/VM1-1_disk2", "storageAccountType": "Standard_LRS" } },
                    { "lun": 2, "name": "dsk-a", "caching": "ReadOnly", "createOption": "Attach", "diskSizeGB": 50,
                      "managedDisk": { "id": "/subscriptions/s/resourceGroups/RGCOMV-1/providers/Microsoft.Compute/disks/dsk-a" } }
                ]
            },
            "networkProfile": { "networkInterfaces": [ { "id": "/subscriptions/s/resourceGroups/rgCOMV-1/providers/Microsoft.Network/networkInterfaces/nic-1" } ] },
            "instanceView": { "statuses": [ { "code": "ProvisioningState/succeeded" }, { "code": "PowerState/running" } ] }
        }
    }"#;

    #[test]
    fn test_parse_virtual_machine() {
        let r: ArmResource<VmProperties> = parse_json(VM_JSON, "vm").expect("parse vm");
        let vm = VirtualMachine::try_from(r).expect("convert vm");
        assert_eq!(vm.name, "VM1-1");
        assert_eq!(vm.size, "Standard_D2a_v4");
        assert_eq!(vm.luns().into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(vm.os_disk.size_gb, Some(30));
        assert_eq!(vm.power_state, Some(PowerState::Running));
        assert_eq!(vm.data_disk(2).unwrap().caching, Caching::ReadOnly);
        assert_eq!(vm.data_disk(2).unwrap().disk_id().unwrap().name(), "dsk-a");
        assert_eq!(vm.nic_ids[0].name(), "nic-1");
    }

    #[test]
    fn test_parse_error_reports_path() {
        let bad = r#"{ "id": "x", "name": "n", "properties": { "diskSizeGB": "big" } }"#;
        let err = parse_json::<ArmResource<DiskProperties>>(bad, "disk").unwrap_err();
        match err {
            Error::Parse { path, .. } => assert_eq!(path, "properties.diskSizeGB"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_parse_disk() {
        let json = r#"{
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/disks/dsk-a",
            "name": "dsk-a", "location": "eastus",
            "managedBy": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/VM1-1",
            "sku": { "name": "Standard_LRS", "tier": "Standard" },
            "properties": { "diskSizeGB": 50, "diskState": "Attached", "provisioningState": "Succeeded" }
        }"#;
        let disk = Disk::try_from(parse_json::<ArmResource<DiskProperties>>(json, "disk").unwrap())
            .unwrap();
        assert_eq!(disk.size_gb, Some(50));
        assert_eq!(disk.state.as_deref(), Some("Attached"));
        assert_eq!(disk.managed_by.unwrap().name(), "VM1-1");
    }

    #[test]
    fn test_parse_nic_and_vnet() {
        let vnet_json = r#"{
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet-1",
            "name": "vnet-1", "location": "eastus",
            "properties": { "addressSpace": { "addressPrefixes": ["10.0.0.0/28"] },
                "subnets": [ { "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet-1/subnets/subnet1", "name": "subnet1" } ] }
        }"#;
        let vnet = VirtualNetwork::from_arm(parse_json(vnet_json, "vnet").unwrap(), "subnet1").unwrap();
        assert_eq!(vnet.address_prefix, "10.0.0.0/28");
        assert_eq!(vnet.subnet_id.name(), "subnet1");

        let nic_json = r#"{
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/networkInterfaces/nic-1",
            "name": "nic-1", "location": "eastus",
            "properties": { "ipConfigurations": [ { "name": "ipconfig1", "properties": {
                "subnet": { "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet-1/subnets/subnet1" },
                "publicIPAddress": { "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/publicIPAddresses/pip-1" } } } ] }
        }"#;
        let nic = NetworkInterface::try_from(
            parse_json::<ArmResource<NicProperties>>(nic_json, "nic").unwrap(),
        )
        .unwrap();
        assert_eq!(nic.subnet_id, vnet.subnet_id);
        assert_eq!(nic.public_ip_id.unwrap().name(), "pip-1");
    }

    #[test]
    fn test_data_disk_body() {
        let empty = DataDisk::empty(3, 200, DiskSku::StandardLrs, Caching::None);
        let body = data_disk_body(&empty);
        assert_eq!(body["createOption"], "Empty");
        assert_eq!(body["diskSizeGB"], 200);
        assert_eq!(body["lun"], 3);

        let attach = DataDisk {
            lun: 2,
            caching: Caching::ReadOnly,
            source: DiskSource::Attach {
                disk_id: ResourceId::in_group("s", "rg", "Microsoft.Compute/disks", "dsk-a"),
            },
            name: None,
            size_gb: None,
        };
        let body = data_disk_body(&attach);
        assert_eq!(body["createOption"], "Attach");
        assert_eq!(body["caching"], "ReadOnly");
        assert!(body["managedDisk"]["id"].as_str().unwrap().ends_with("/disks/dsk-a"));
    }

    #[test]
    fn test_provisioning_state() {
        let body = json!({ "properties": { "provisioningState": "Creating" } });
        assert_eq!(provisioning_state(&body), Some("Creating"));
        assert_eq!(provisioning_state(&json!({})), None);
    }
}
