//! Docker Compose input model
//!
//! Parsing of compose files into a [`Project`], plus the helpers the
//! translation needs to read compose short syntax (ports) and to report
//! fields that cannot be carried over.

pub mod config;
pub mod parser;
pub mod ports;
pub mod warnings;

use std::collections::BTreeMap;

pub use config::{ComposeConfig, ServiceConfig};
pub use parser::ComposeParser;
pub use ports::{extract_first_ports, parse_port_spec, PortSpec};
pub use warnings::WarningTable;

/// A loaded compose project
#[derive(Debug, Clone, Default)]
pub struct Project {
    /// Project name
    pub name: String,
    /// Services by name
    pub services: BTreeMap<String, ServiceConfig>,
}

impl Project {
    /// Create a project from its services
    pub fn new(name: impl Into<String>, services: BTreeMap<String, ServiceConfig>) -> Self {
        Self {
            name: name.into(),
            services,
        }
    }

    /// Add a service
    pub fn with_service(mut self, name: impl Into<String>, service: ServiceConfig) -> Self {
        self.services.insert(name.into(), service);
        self
    }

    /// Service names in sorted order
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Name the container for a service will carry
    pub fn container_name(&self, service: &str) -> String {
        self.services
            .get(service)
            .and_then(|s| s.container_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| service.to_string())
    }
}
