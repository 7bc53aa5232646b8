//! Service discovery records

use super::meta::{ObjectMeta, API_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stable name and address in front of a set of pods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ServiceSpec,
}

impl Service {
    /// Service routing `ports` to the pods matched by `selector`
    pub fn new(
        name: impl Into<String>,
        selector: BTreeMap<String, String>,
        ports: Vec<ServicePort>,
    ) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: "Service".to_string(),
            metadata: ObjectMeta::named(name),
            spec: ServiceSpec { selector, ports },
        }
    }
}

/// Service contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub selector: BTreeMap<String, String>,
    pub ports: Vec<ServicePort>,
}

/// A port exposed by a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    pub name: String,
    pub protocol: String,
    pub port: u16,
    pub target_port: u16,
}

impl ServicePort {
    /// Port forwarded unchanged to the pods, named `<port>-<protocol>`
    pub fn new(port: u16, protocol: &str) -> Self {
        Self {
            name: format!("{}-{}", port, protocol.to_lowercase()),
            protocol: protocol.to_string(),
            port,
            target_port: port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_port_name() {
        let port = ServicePort::new(53, "UDP");
        assert_eq!(port.name, "53-udp");
        assert_eq!(port.target_port, 53);

        let json = serde_json::to_value(&port).unwrap();
        assert_eq!(json["targetPort"], 53);
    }
}
