//! Wire shapes of the Docker Engine API, reduced to what templates use.
use std::collections::HashMap;

use serde::Deserialize;

use crate::container::{
    self, Address, ContainerID, DockerImage, RuntimeContainer, SwarmNode, Volume,
    split_key_value_slice,
};

#[derive(Debug, Deserialize)]
pub(super) struct ApiError {
    pub message: String,
}

/// One entry of `GET /containers/json`.
#[derive(Debug, Deserialize)]
pub(super) struct ContainerSummary {
    #[serde(rename = "Id")]
    pub id: String,
}

/// `GET /containers/{id}/json`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(super) struct ContainerInspect {
    pub id: String,
    pub name: String,
    pub config: InspectConfig,
    pub network_settings: NetworkSettings,
    pub mounts: Option<Vec<Mount>>,
    pub node: Option<Node>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(super) struct InspectConfig {
    pub hostname: String,
    pub image: String,
    pub env: Option<Vec<String>>,
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(super) struct NetworkSettings {
    pub gateway: String,
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
    #[serde(rename = "GlobalIPv6Address")]
    pub global_ipv6_address: String,
    #[serde(rename = "LinkLocalIPv6Address")]
    pub link_local_ipv6_address: String,
    /// `"80/tcp" -> [{HostIp, HostPort}]`, bindings are `null` for unpublished ports.
    pub ports: Option<HashMap<String, Option<Vec<PortBinding>>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(super) struct PortBinding {
    pub host_ip: String,
    pub host_port: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(super) struct Mount {
    pub source: String,
    pub destination: String,
    #[serde(rename = "RW")]
    pub rw: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct Node {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "IP")]
    pub ip: String,
}

impl ContainerInspect {
    pub fn into_runtime_container(self) -> container::Result<RuntimeContainer> {
        let net = self.network_settings;
        let mut out = RuntimeContainer::new(ContainerID::new(&self.id)?);
        out.name = self.name.trim_start_matches('/').to_owned();
        out.hostname = self.config.hostname;
        out.image = DockerImage::parse(&self.config.image);
        out.gateway = net.gateway;

        for (port_proto, bindings) in net.ports.unwrap_or_default() {
            let (port, proto) = port_proto
                .split_once('/')
                .unwrap_or((port_proto.as_str(), "tcp"));
            let mut address = Address {
                ip: net.ip_address.clone(),
                ip6_link_local: net.link_local_ipv6_address.clone(),
                ip6_global: net.global_ipv6_address.clone(),
                port: port.to_owned(),
                proto: proto.to_owned(),
                ..Address::default()
            };
            if let Some(binding) = bindings.and_then(|b| b.into_iter().next()) {
                address.host_port = binding.host_port;
                address.host_ip = binding.host_ip;
            }
            out.addresses.push(address);
        }
        out.addresses
            .sort_by(|a, b| (&a.port, &a.proto).cmp(&(&b.port, &b.proto)));

        for mount in self.mounts.unwrap_or_default() {
            out.volumes.insert(
                mount.destination.clone(),
                Volume {
                    path: mount.destination,
                    host_path: mount.source,
                    read_write: mount.rw,
                },
            );
        }

        if let Some(node) = self.node {
            out.node = SwarmNode {
                id: node.id,
                name: node.name,
                address: Address {
                    ip: node.ip,
                    ..Address::default()
                },
            };
        }

        out.env = split_key_value_slice(&self.config.env.unwrap_or_default());
        out.labels = self.config.labels.unwrap_or_default();
        out.ip = net.ip_address;
        out.ip6_link_local = net.link_local_ipv6_address;
        out.ip6_global = net.global_ipv6_address;

        Ok(out)
    }
}
