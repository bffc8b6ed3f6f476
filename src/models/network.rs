//! Resource group and networking data models.

use super::ResourceId;
use std::fmt;

/// Container for every resource the sample creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroup {
    pub id: ResourceId,
    pub name: String,
    pub location: String,
}

impl fmt::Display for ResourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.location)
    }
}

/// Virtual network with a single subnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNetwork {
    pub id: ResourceId,
    pub name: String,
    pub address_prefix: String,
    pub subnet_id: ResourceId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicIpAddress {
    pub id: ResourceId,
    pub name: String,
    pub dns_label: String,
    /// Assigned address, may be empty until something uses it.
    pub ip_address: Option<String>,
    pub fqdn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub id: ResourceId,
    pub name: String,
    pub subnet_id: ResourceId,
    pub public_ip_id: Option<ResourceId>,
}
