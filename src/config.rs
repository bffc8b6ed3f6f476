//! Settings for the VM disk sample.
//!
//! Credentials and overrides come from the environment (a `.env` file is
//! loaded by `main`). Lookup goes through a closure so tests never touch the
//! process environment.

use crate::disk_plan::{DiskAttachStrategy, DiskPlan};
use crate::error::{Error, Result};
use crate::models::{DiskSku, ImageReference};
use crate::names;
use std::fmt;

/// Default wait between long-running-operation polls when the service sends no `Retry-After`.
pub const SLEEP_MSEC: u64 = 5_000;

pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const ARM_SCOPE: &str = "https://management.azure.com/.default";

pub const API_VERSION_RESOURCES: &str = "2021-04-01";
pub const API_VERSION_COMPUTE: &str = "2023-09-01";
pub const API_VERSION_DISKS: &str = "2023-04-02";
pub const API_VERSION_NETWORK: &str = "2023-09-01";

pub const DEFAULT_LOCATION: &str = "eastus";
pub const DEFAULT_VM_SIZE: &str = "Standard_D2a_v4";
pub const DEFAULT_ADMIN_USERNAME: &str = "azureuser";
pub const VNET_ADDRESS_PREFIX: &str = "10.0.0.0/28";
pub const SUBNET_NAME: &str = "subnet1";

/// Subscription used when running against the simulated cloud.
pub const SIMULATED_SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Service principal used to authenticate against Azure.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub subscription_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

impl Credentials {
    /// Read `CLIENT_ID`, `CLIENT_SECRET`, `TENANT_ID` and `SUBSCRIPTION_ID`.
    pub fn from_lookup<F>(lookup: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(Error::MissingEnv(name))
        };
        Ok(Credentials {
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            tenant_id: required("TENANT_ID")?,
            subscription_id: required("SUBSCRIPTION_ID")?,
        })
    }
}

/// Endpoints of the management plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub arm: String,
    pub authority_host: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            arm: DEFAULT_ARM_ENDPOINT.to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
        }
    }
}

/// Names of everything the sample creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub resource_group: String,
    pub vm: String,
    pub vnet: String,
    pub public_ip: String,
    pub public_ip_dns_label: String,
    pub nic: String,
    /// Prefix for the standalone managed disks.
    pub disk_prefix: String,
}

impl ResourceNames {
    pub fn random() -> ResourceNames {
        ResourceNames {
            resource_group: names::random_name("rgCOMV"),
            vm: names::random_name("VM1"),
            vnet: names::random_name("vnet"),
            public_ip: names::random_name("pip"),
            public_ip_dns_label: names::random_dns_label("pip"),
            nic: names::random_name("nic"),
            disk_prefix: "dsk".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        names::validate_resource_name("resource group", &self.resource_group)?;
        names::validate_resource_name("virtual machine", &self.vm)?;
        names::validate_resource_name("virtual network", &self.vnet)?;
        names::validate_resource_name("public IP", &self.public_ip)?;
        names::validate_resource_name("network interface", &self.nic)?;
        names::validate_dns_label(&self.public_ip_dns_label)
    }
}

/// Everything `run_sample` needs apart from the cloud client.
#[derive(Debug, Clone)]
pub struct SampleSettings {
    pub location: String,
    pub names: ResourceNames,
    pub vm_size: String,
    pub image: ImageReference,
    pub admin_username: String,
    pub admin_password: String,
    pub os_disk_sku: DiskSku,
    pub strategy: DiskAttachStrategy,
    pub disk_plan: DiskPlan,
    /// LUNs detached in the update step.
    pub detach_luns: Vec<u32>,
    /// Sizes of the empty disks attached in the update step.
    pub new_disk_sizes_gb: Vec<u32>,
    /// OS disk size is multiplied by this in the resize step.
    pub os_disk_growth_factor: u32,
    /// Added to every data disk in the resize step.
    pub data_disk_growth_gb: u32,
    /// Run against the in-memory cloud instead of Azure.
    pub simulate: bool,
    pub endpoints: Endpoints,
    pub poll_interval_msec: u64,
}

impl Default for SampleSettings {
    fn default() -> Self {
        let strategy = DiskAttachStrategy::default();
        SampleSettings {
            location: DEFAULT_LOCATION.to_string(),
            names: ResourceNames::random(),
            vm_size: DEFAULT_VM_SIZE.to_string(),
            image: ubuntu_image(),
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            admin_password: names::generate_password(),
            os_disk_sku: DiskSku::StandardLrs,
            strategy,
            disk_plan: DiskPlan::for_strategy(strategy),
            detach_luns: vec![3, 4],
            new_disk_sizes_gb: vec![200],
            os_disk_growth_factor: 2,
            data_disk_growth_gb: 10,
            simulate: false,
            endpoints: Endpoints::default(),
            poll_interval_msec: SLEEP_MSEC,
        }
    }
}

impl SampleSettings {
    /// Defaults overridden by the optional `SAMPLE_*`, `ADMIN_*`, `SIMULATE`,
    /// `ARM_ENDPOINT` and `AUTHORITY_HOST` variables.
    pub fn from_lookup<F>(lookup: F) -> Result<SampleSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut settings = SampleSettings::default();

        if let Some(location) = get("SAMPLE_LOCATION") {
            settings.location = location;
        }
        if let Some(size) = get("SAMPLE_VM_SIZE") {
            settings.vm_size = size;
        }
        if let Some(strategy) = get("SAMPLE_DISK_STRATEGY") {
            settings.strategy = strategy.parse()?;
            settings.disk_plan = DiskPlan::for_strategy(settings.strategy);
        }
        if let Some(user) = get("ADMIN_USERNAME") {
            settings.admin_username = user;
        }
        if let Some(password) = get("ADMIN_PASSWORD") {
            settings.admin_password = password;
        }
        if let Some(simulate) = get("SIMULATE") {
            settings.simulate = parse_bool("SIMULATE", &simulate)?;
        }
        if let Some(arm) = get("ARM_ENDPOINT") {
            settings.endpoints.arm = arm.trim_end_matches('/').to_string();
        }
        if let Some(host) = get("AUTHORITY_HOST") {
            settings.endpoints.authority_host = host.trim_end_matches('/').to_string();
        }
        if let Some(poll) = get("SAMPLE_POLL_MSEC") {
            settings.poll_interval_msec = poll.parse().map_err(|e| Error::InvalidSetting {
                name: "SAMPLE_POLL_MSEC",
                reason: format!("{e}"),
            })?;
        }

        settings.names.validate()?;
        Ok(settings)
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(Error::InvalidSetting {
            name,
            reason: format!("'{other}' is not a boolean"),
        }),
    }
}

/// Canonical Ubuntu Server 22.04 LTS, gen2.
pub fn ubuntu_image() -> ImageReference {
    ImageReference {
        publisher: "Canonical".to_string(),
        offer: "0001-com-ubuntu-server-jammy".to_string(),
        sku: "22_04-lts-gen2".to_string(),
        version: "latest".to_string(),
    }
}
