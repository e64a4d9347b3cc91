//! Container records as seen by templates.
//!
//! A [`Snapshot`] is the full list of running containers at one point in time. The engine never
//! looks inside it; it is handed as a whole to the renderer.
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

mod error;
mod utils;

pub use error::{Error, Result};
pub use utils::{split_docker_image, split_key_value_slice};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// Number of characters shown when a container id is logged.
const SHORT_ID_LEN: usize = 12;

/// A validated container identifier.
///
/// # Examples
///
/// ```
/// # use container_gen::container::ContainerID;
/// let raw_id = "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd";
/// let container_id = ContainerID::new(raw_id).unwrap();
/// assert_eq!(container_id.short(), "abc123abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty or its length exceeds
    /// [`CONTAINER_ID_MAX_LEN`].
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    /// Returns the first 12 characters of the id, the way `docker ps` shows it.
    pub fn short(&self) -> &str {
        self.0.get(..SHORT_ID_LEN).unwrap_or(&self.0)
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for ContainerID {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DockerImage {
    pub registry: String,
    pub repository: String,
    pub tag: String,
}

impl DockerImage {
    pub fn parse(image: &str) -> Self {
        let (registry, repository, tag) = split_docker_image(image);
        Self {
            registry,
            repository,
            tag,
        }
    }
}

impl fmt::Display for DockerImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.registry.is_empty() {
            write!(f, "{}/", self.registry)?;
        }
        f.write_str(&self.repository)?;
        if !self.tag.is_empty() {
            write!(f, ":{}", self.tag)?;
        }
        Ok(())
    }
}

/// A container port together with its host binding, if it is published.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Address {
    pub ip: String,
    pub ip6_link_local: String,
    pub ip6_global: String,
    pub port: String,
    pub host_port: String,
    pub proto: String,
    pub host_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Volume {
    pub path: String,
    pub host_path: String,
    pub read_write: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SwarmNode {
    pub id: String,
    pub name: String,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RuntimeContainer {
    pub id: ContainerID,
    pub name: String,
    pub hostname: String,
    pub gateway: String,
    pub image: DockerImage,
    pub addresses: Vec<Address>,
    pub volumes: HashMap<String, Volume>,
    pub env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub node: SwarmNode,
    pub ip: String,
    pub ip6_link_local: String,
    pub ip6_global: String,
}

impl RuntimeContainer {
    /// Creates a container record with the given id and everything else empty.
    pub fn new(id: ContainerID) -> Self {
        Self {
            id,
            name: String::new(),
            hostname: String::new(),
            gateway: String::new(),
            image: DockerImage::default(),
            addresses: Vec::new(),
            volumes: HashMap::new(),
            env: HashMap::new(),
            labels: HashMap::new(),
            node: SwarmNode::default(),
            ip: String::new(),
            ip6_link_local: String::new(),
            ip6_global: String::new(),
        }
    }

    /// Addresses that are bound to a port on the host.
    pub fn published_addresses(&self) -> impl Iterator<Item = &Address> {
        self.addresses.iter().filter(|a| !a.host_port.is_empty())
    }
}

/// All running containers at one point in time.
pub type Snapshot = Vec<RuntimeContainer>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_validation() {
        assert!(ContainerID::new("").is_err());
        assert!(ContainerID::new("a".repeat(CONTAINER_ID_MAX_LEN + 1)).is_err());
        assert!(ContainerID::new("abc").is_ok());
    }

    #[test]
    fn test_container_id_short() {
        let id = ContainerID::new("0123456789abcdef").unwrap();
        assert_eq!(id.short(), "0123456789ab");
        let id = ContainerID::new("abc").unwrap();
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn test_docker_image_display() {
        for image in ["nginx", "nginx:1.27", "jwilder/nginx-proxy:latest"] {
            assert_eq!(DockerImage::parse(image).to_string(), image);
        }
    }

    #[test]
    fn test_published_addresses() {
        let mut container = RuntimeContainer::new(ContainerID::new("abc").unwrap());
        container.addresses.push(Address {
            port: "80".to_owned(),
            host_port: "8080".to_owned(),
            ..Address::default()
        });
        container.addresses.push(Address {
            port: "443".to_owned(),
            ..Address::default()
        });

        let published: Vec<_> = container.published_addresses().collect();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].port, "80");
    }
}
