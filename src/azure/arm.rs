//! Azure Resource Manager REST client.
//!
//! Implements [`CloudApi`] with plain HTTPS calls. Every mutating call is
//! followed by a poll loop that returns once the operation is terminal.

use super::auth::ServicePrincipal;
use super::lro::{self, OperationStatus, PollTarget};
use super::wire::{self, ArmResource, AsyncOperation, ErrorResponse};
use crate::cloud::CloudApi;
use crate::config::{
    Credentials, Endpoints, API_VERSION_COMPUTE, API_VERSION_DISKS, API_VERSION_NETWORK,
    API_VERSION_RESOURCES,
};
use crate::error::{Error, Result};
use crate::models::{
    Disk, DiskDefinition, NetworkInterface, PublicIpAddress, ResourceGroup, ResourceId,
    VirtualMachine, VirtualNetwork, VmDefinition,
};
use colored::Colorize;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub struct ArmClient {
    http: reqwest::Client,
    auth: ServicePrincipal,
    subscription_id: String,
    endpoint: String,
    poll_interval: Duration,
}

impl ArmClient {
    pub fn new(
        credentials: &Credentials,
        endpoints: &Endpoints,
        poll_interval: Duration,
    ) -> Result<ArmClient> {
        Ok(ArmClient {
            http: reqwest::Client::new(),
            auth: ServicePrincipal::new(credentials, &endpoints.authority_host)?,
            subscription_id: credentials.subscription_id.clone(),
            endpoint: endpoints.arm.trim_end_matches('/').to_string(),
            poll_interval,
        })
    }

    fn url(&self, path: &str, api_version: &str) -> String {
        format!("{}{path}?api-version={api_version}", self.endpoint)
    }

    fn resource_group_path(&self, resource_group: &str) -> String {
        ResourceId::resource_group(&self.subscription_id, resource_group).to_string()
    }

    fn resource_path(&self, resource_group: &str, resource_type: &str, name: &str) -> String {
        ResourceId::in_group(&self.subscription_id, resource_group, resource_type, name)
            .to_string()
    }

    /// Send one authenticated request, turning non-2xx answers into [`Error::Api`].
    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Response> {
        log::debug!("{} {}", method, url.on_blue());
        let token = self.auth.bearer_token().await?;
        let mut request = self.http.request(method.clone(), url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        log::debug!("{method} {url} -> {status}");

        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error.describe())
            .unwrap_or(text);
        log::warn!("{} {method} {url}: {detail}", "failed".on_red());
        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(format!("{url}: {detail}")));
        }
        Err(Error::Api {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            body: detail,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, context: &str) -> Result<T> {
        let response = self.send(Method::GET, url, None).await?;
        let text = response.text().await?;
        wire::parse_json(&text, context)
    }

    /// Start an operation and wait until it is terminal.
    async fn execute(&self, method: Method, url: &str, body: Option<&Value>) -> Result<()> {
        let response = self.send(method.clone(), url, body).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;
        let initial: Option<Value> = serde_json::from_str(&text).ok();
        let state = initial.as_ref().and_then(wire::provisioning_state);

        let target = lro::poll_target(&method, status, &headers, url, state);
        let delay = lro::retry_after(&headers, self.poll_interval);
        self.wait_until_done(target, delay).await
    }

    async fn wait_until_done(&self, target: PollTarget, mut delay: Duration) -> Result<()> {
        let mut polls: u32 = 0;
        loop {
            let url = match &target {
                PollTarget::Done => return Ok(()),
                PollTarget::AsyncOperation(url)
                | PollTarget::Location(url)
                | PollTarget::Resource(url) => url,
            };
            tokio::time::sleep(delay).await;
            polls += 1;

            let response = self.send(Method::GET, url, None).await?;
            let status = response.status();
            delay = lro::retry_after(response.headers(), self.poll_interval);

            let current = match &target {
                PollTarget::Location(_) => {
                    if status == StatusCode::ACCEPTED {
                        OperationStatus::InProgress
                    } else {
                        OperationStatus::Succeeded
                    }
                }
                PollTarget::AsyncOperation(_) => {
                    let text = response.text().await?;
                    let op: AsyncOperation = wire::parse_json(&text, "operation status")?;
                    let current = OperationStatus::parse(&op.status);
                    if matches!(current, OperationStatus::Failed | OperationStatus::Canceled) {
                        return Err(Error::OperationFailed {
                            url: url.to_string(),
                            status: op.status,
                            message: op
                                .error
                                .map(|e| e.describe())
                                .unwrap_or_else(|| "no error details".to_string()),
                        });
                    }
                    current
                }
                PollTarget::Resource(_) => {
                    let text = response.text().await?;
                    let body: Value = wire::parse_json(&text, "resource")?;
                    let state = wire::provisioning_state(&body).unwrap_or("Succeeded");
                    let current = OperationStatus::parse(state);
                    if matches!(current, OperationStatus::Failed | OperationStatus::Canceled) {
                        return Err(Error::OperationFailed {
                            url: url.to_string(),
                            status: state.to_string(),
                            message: "provisioning did not succeed".to_string(),
                        });
                    }
                    current
                }
                PollTarget::Done => OperationStatus::Succeeded,
            };

            log::debug!("poll #{polls} {url} -> {current:?}");
            if current == OperationStatus::Succeeded {
                return Ok(());
            }
        }
    }

    /// PUT `body` and wait, then read the resource back.
    async fn put_and_read<P: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        body: &Value,
        context: &str,
    ) -> Result<ArmResource<P>> {
        let url = self.url(path, api_version);
        self.execute(Method::PUT, &url, Some(body)).await?;
        self.get_json(&url, context).await
    }

    async fn read_virtual_machine(&self, path: &str) -> Result<VirtualMachine> {
        let url = format!(
            "{}&$expand=instanceView",
            self.url(path, API_VERSION_COMPUTE)
        );
        let r: ArmResource<wire::VmProperties> = self.get_json(&url, "virtual machine").await?;
        VirtualMachine::try_from(r)
    }
}

impl CloudApi for ArmClient {
    async fn create_resource_group(&self, name: &str, location: &str) -> Result<ResourceGroup> {
        let r: ArmResource<wire::ResourceGroupProperties> = self
            .put_and_read(
                &self.resource_group_path(name),
                API_VERSION_RESOURCES,
                &wire::resource_group_body(location),
                "resource group",
            )
            .await?;
        ResourceGroup::try_from(r)
    }

    async fn delete_resource_group(&self, id: &ResourceId) -> Result<()> {
        let url = self.url(id.as_str(), API_VERSION_RESOURCES);
        self.execute(Method::DELETE, &url, None).await
    }

    async fn create_disk(&self, resource_group: &str, disk: &DiskDefinition) -> Result<Disk> {
        let path = self.resource_path(resource_group, "Microsoft.Compute/disks", &disk.name);
        let r: ArmResource<wire::DiskProperties> = self
            .put_and_read(&path, API_VERSION_DISKS, &wire::disk_body(disk), "disk")
            .await?;
        Disk::try_from(r)
    }

    async fn get_disk(&self, id: &ResourceId) -> Result<Disk> {
        let url = self.url(id.as_str(), API_VERSION_DISKS);
        let r: ArmResource<wire::DiskProperties> = self.get_json(&url, "disk").await?;
        Disk::try_from(r)
    }

    async fn resize_disk(&self, id: &ResourceId, size_gb: u32) -> Result<Disk> {
        let url = self.url(id.as_str(), API_VERSION_DISKS);
        self.execute(Method::PATCH, &url, Some(&wire::disk_resize_body(size_gb)))
            .await?;
        self.get_disk(id).await
    }

    async fn delete_disk(&self, id: &ResourceId) -> Result<()> {
        let url = self.url(id.as_str(), API_VERSION_DISKS);
        self.execute(Method::DELETE, &url, None).await
    }

    async fn create_virtual_network(
        &self,
        resource_group: &str,
        name: &str,
        location: &str,
        address_prefix: &str,
        subnet_name: &str,
    ) -> Result<VirtualNetwork> {
        let path = self.resource_path(resource_group, "Microsoft.Network/virtualNetworks", name);
        let r: ArmResource<wire::VnetProperties> = self
            .put_and_read(
                &path,
                API_VERSION_NETWORK,
                &wire::vnet_body(location, address_prefix, subnet_name),
                "virtual network",
            )
            .await?;
        VirtualNetwork::from_arm(r, subnet_name)
    }

    async fn create_public_ip(
        &self,
        resource_group: &str,
        name: &str,
        location: &str,
        dns_label: &str,
    ) -> Result<PublicIpAddress> {
        let path = self.resource_path(resource_group, "Microsoft.Network/publicIPAddresses", name);
        let r: ArmResource<wire::PublicIpProperties> = self
            .put_and_read(
                &path,
                API_VERSION_NETWORK,
                &wire::public_ip_body(location, dns_label),
                "public ip",
            )
            .await?;
        PublicIpAddress::try_from(r)
    }

    async fn create_network_interface(
        &self,
        resource_group: &str,
        name: &str,
        location: &str,
        subnet_id: &ResourceId,
        public_ip_id: Option<&ResourceId>,
    ) -> Result<NetworkInterface> {
        let path = self.resource_path(resource_group, "Microsoft.Network/networkInterfaces", name);
        let r: ArmResource<wire::NicProperties> = self
            .put_and_read(
                &path,
                API_VERSION_NETWORK,
                &wire::nic_body(location, subnet_id, public_ip_id),
                "network interface",
            )
            .await?;
        NetworkInterface::try_from(r)
    }

    async fn create_virtual_machine(
        &self,
        resource_group: &str,
        vm: &VmDefinition,
    ) -> Result<VirtualMachine> {
        let path = self.resource_path(
            resource_group,
            "Microsoft.Compute/virtualMachines",
            &vm.name,
        );
        let url = self.url(&path, API_VERSION_COMPUTE);
        self.execute(Method::PUT, &url, Some(&wire::vm_body(vm)))
            .await?;
        self.read_virtual_machine(&path).await
    }

    async fn get_virtual_machine(&self, id: &ResourceId) -> Result<VirtualMachine> {
        self.read_virtual_machine(id.as_str()).await
    }

    async fn update_virtual_machine(&self, vm: &VirtualMachine) -> Result<VirtualMachine> {
        let url = self.url(vm.id.as_str(), API_VERSION_COMPUTE);
        self.execute(
            Method::PATCH,
            &url,
            Some(&wire::vm_data_disks_patch_body(vm)),
        )
        .await?;
        self.read_virtual_machine(vm.id.as_str()).await
    }

    async fn deallocate_virtual_machine(&self, id: &ResourceId) -> Result<()> {
        let url = self.url(&format!("{id}/deallocate"), API_VERSION_COMPUTE);
        self.execute(Method::POST, &url, None).await
    }

    async fn start_virtual_machine(&self, id: &ResourceId) -> Result<()> {
        let url = self.url(&format!("{id}/start"), API_VERSION_COMPUTE);
        self.execute(Method::POST, &url, None).await
    }
}
