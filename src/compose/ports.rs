//! Compose port short syntax

use std::net::IpAddr;

/// A port mapping reduced to the first port of each range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    /// Container port
    pub container: String,
    /// Host port; equal to the container port when none is published
    pub host: String,
    /// Protocol, upper case
    pub protocol: String,
}

/// Parse `[[IP:]HOST:]CONTAINER[/PROTOCOL]`. The protocol defaults to TCP.
pub fn parse_port_spec(spec: &str) -> PortSpec {
    let (ports, protocol) = match spec.rsplit_once('/') {
        Some((ports, protocol)) if !protocol.is_empty() => (ports, protocol.to_uppercase()),
        Some((ports, _)) => (ports, "TCP".to_string()),
        None => (spec, "TCP".to_string()),
    };
    let (container, host) = extract_first_ports(ports);
    PortSpec {
        container,
        host,
        protocol,
    }
}

/// Converts a compose port spec (CONTAINER, HOST:CONTAINER, or
/// IP:HOST:CONTAINER) to the first container and host port of the range.
/// The host port defaults to the container port.
pub fn extract_first_ports(port: &str) -> (String, String) {
    let segments: Vec<&str> = port.split(':').collect();
    let container = range_to_port(segments[segments.len() - 1]).to_string();
    let host = match segments.len() {
        3 => range_to_port(segments[1]).to_string(),
        2 if segments[0].parse::<IpAddr>().is_err() => range_to_port(segments[0]).to_string(),
        _ => container.clone(),
    };
    (container, host)
}

fn range_to_port(s: &str) -> &str {
    s.split_once('-').map(|(first, _)| first).unwrap_or(s)
}
