//! Services in front of deployments that expose ports

use super::aliases::{single_alias, AliasMap};
use crate::platform::{Object, Service, ServicePort};

/// One service per deployment config exposing ports, in object order.
/// The service takes the deployment's name, or its alias when exactly one
/// is declared.
pub fn synthesize_services(objects: &[Object], aliases: &AliasMap) -> Vec<Object> {
    let mut services = Vec::new();
    for dc in objects.iter().filter_map(Object::as_deployment_config) {
        let mut ports: Vec<ServicePort> = Vec::new();
        for port in dc.containers().iter().flat_map(|c| &c.ports) {
            let exists = ports
                .iter()
                .any(|p| p.port == port.container_port && p.protocol == port.protocol);
            if !exists {
                ports.push(ServicePort::new(port.container_port, &port.protocol));
            }
        }
        if ports.is_empty() {
            tracing::debug!("Deployment {} exposes no ports", dc.metadata.name);
            continue;
        }

        let name = single_alias(aliases, &dc.metadata.name).unwrap_or(dc.metadata.name.as_str());
        tracing::info!("Created service {} with {} port(s)", name, ports.len());
        services.push(Service::new(name, dc.spec.selector.clone(), ports).into());
    }
    services
}
