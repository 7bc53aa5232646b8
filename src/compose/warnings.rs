//! Compose fields that cannot be translated
//!
//! Unsupported fields never fail a conversion. Each one is recorded here
//! against the services that used it and reported as an annotation on the
//! generated document.

use super::{Project, ServiceConfig};
use std::collections::BTreeMap;

/// Warning messages and the services that triggered them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl WarningTable {
    /// Collect warnings for every service of a project, in service order
    pub fn collect(project: &Project) -> Self {
        let mut table = Self::default();
        for (name, service) in &project.services {
            warn_unusable_elements(name, service, &mut table);
        }
        table
    }

    /// Record that `service` triggered `message`
    pub fn warn(&mut self, service: &str, message: impl Into<String>) {
        self.entries.entry(message.into()).or_default().push(service.to_string());
    }

    /// Whether no warnings were recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Services that triggered a message
    pub fn services(&self, message: &str) -> &[String] {
        self.entries.get(message).map(Vec::as_slice).unwrap_or_default()
    }

    /// One `services: message` line per message, sorted
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .entries
            .iter()
            .map(|(message, services)| format!("{}: {}", services.join(","), message))
            .collect();
        lines.sort();
        lines
    }

    /// Human readable summary for the output document
    pub fn annotation(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!(
            "not all docker-compose fields were honored:\n* {}",
            self.lines().join("\n* ")
        ))
    }
}

/// Add warnings for unsupported elements in the provided service config.
/// Links are not checked; they only feed service aliases.
pub fn warn_unusable_elements(name: &str, service: &ServiceConfig, warnings: &mut WarningTable) {
    let mut warn = |message: &str| warnings.warn(name, message);

    if !service.cap_add.is_empty() || !service.cap_drop.is_empty() {
        warn("cap_add and cap_drop are not supported");
    }
    if is_set(&service.cgroup_parent) {
        warn("cgroup_parent is not supported");
    }
    if is_set(&service.cpuset) {
        warn("cpuset is not supported");
    }
    if !service.devices.is_empty() {
        warn("devices are not supported");
    }
    let has_dns = service.dns.as_ref().is_some_and(|d| !d.is_empty());
    let has_dns_search = service.dns_search.as_ref().is_some_and(|d| !d.is_empty());
    if has_dns || has_dns_search {
        warn("dns and dns_search are not supported");
    }
    if is_set(&service.domainname) {
        warn("domainname is not supported");
    }
    if is_set(&service.hostname) {
        warn("hostname is not supported");
    }
    if service.labels.as_ref().is_some_and(|l| !l.is_empty()) {
        warn("labels is ignored");
    }
    if is_set(&service.log_driver) {
        warn("log_driver is not supported");
    }
    if is_set(&service.mac_address) {
        warn("mac_address is not supported");
    }
    if is_set(&service.net) || is_set(&service.network_mode) {
        warn("net is not supported");
    }
    if is_set(&service.pid) {
        warn("pid is not supported");
    }
    if is_set(&service.uts) {
        warn("uts is not supported");
    }
    if is_set(&service.ipc) {
        warn("ipc is not supported");
    }
    if service.memswap_limit.as_ref().and_then(|m| m.bytes()).unwrap_or(0) > 0 {
        warn("mem_swap_limit is not supported");
    }
    if is_set(&service.restart) {
        warn("restart is ignored - all pods are automatically restarted");
    }
    if !service.security_opt.is_empty() {
        warn("security_opt is not supported");
    }
    if service.user().is_some_and(|u| !u.is_empty()) && service.numeric_user().is_none() {
        warn("setting user to a string is not supported - use numeric user value");
    }
    if is_set(&service.volume_driver) {
        warn("volume_driver is not supported");
    }
    if !service.volumes_from.is_empty() {
        warn("volumes_from is not supported");
    }
    if !service.external_links.is_empty() {
        warn("external_links are not supported - use services");
    }
    if !service.log_opt.is_empty() {
        warn("log_opt is not supported");
    }
    if service.extra_hosts.as_ref().is_some_and(|h| !h.is_empty()) {
        warn("extra_hosts is not supported");
    }
    if !service.ulimits.is_empty() {
        warn("ulimits is not supported");
    }
    if service.env_file.as_ref().is_some_and(|f| !f.is_empty()) {
        warn("env_file is not supported");
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_ref().is_some_and(|v| !v.is_empty())
}
