//! Azure Resource Manager identifiers.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Matches `/subscriptions/{sub}/resourceGroups/{rg}[/providers/{ns}/{type}/{name}[/{child_type}/{child}]]`.
/// ARM is not consistent about the case of `resourceGroups`, so match it insensitively.
static RESOURCE_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_resource_id_regex() -> &'static Regex {
    RESOURCE_ID_REGEX.get_or_init(|| {
        Regex::new(
            r"^/subscriptions/([^/]+)/(?i:resourcegroups)/([^/]+)(?:/providers/([^/]+)/([^/]+)/([^/]+)(?:/([^/]+)/([^/]+))?)?$",
        )
        .expect("Invalid Regex")
    })
}

/// Fully qualified ARM resource id, e.g.
/// `/subscriptions/xxx/resourceGroups/rg1/providers/Microsoft.Compute/disks/dsk-1`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Parse and validate an id string.
    pub fn parse(id: &str) -> Result<ResourceId> {
        if get_resource_id_regex().is_match(id) {
            Ok(ResourceId(id.to_string()))
        } else {
            Err(Error::invalid(format!("not an ARM resource id: '{id}'")))
        }
    }

    /// Id of a resource group.
    pub fn resource_group(subscription_id: &str, resource_group: &str) -> ResourceId {
        ResourceId(format!(
            "/subscriptions/{subscription_id}/resourceGroups/{resource_group}"
        ))
    }

    /// Id of a resource inside a resource group, `resource_type` is `Namespace/type`.
    pub fn in_group(
        subscription_id: &str,
        resource_group: &str,
        resource_type: &str,
        name: &str,
    ) -> ResourceId {
        ResourceId(format!(
            "/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/{resource_type}/{name}"
        ))
    }

    /// Id of a child resource, e.g. a subnet under a virtual network.
    pub fn child(&self, child_type: &str, name: &str) -> ResourceId {
        ResourceId(format!("{}/{child_type}/{name}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resource_group_name(&self) -> &str {
        self.capture(2).unwrap_or_default()
    }

    /// Last segment: the resource name, or the resource group name for a group id.
    pub fn name(&self) -> &str {
        self.capture(7)
            .or_else(|| self.capture(5))
            .unwrap_or_else(|| self.resource_group_name())
    }

    /// True for `/subscriptions/{sub}/resourceGroups/{rg}` with nothing below it.
    pub fn is_resource_group(&self) -> bool {
        self.capture(2).is_some() && self.capture(3).is_none()
    }

    fn capture(&self, i: usize) -> Option<&str> {
        get_resource_id_regex()
            .captures(&self.0)
            .and_then(|c| c.get(i))
            .map(|m| m.as_str())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
