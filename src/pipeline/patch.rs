//! Recorded service configuration for a container

use crate::platform::{cpu_quantity, memory_quantity, Container, ContainerPort, EnvVar, VolumeMount};

/// Runtime settings of one service, applied to its container when the
/// deployment is realized
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerPatch {
    /// Container name override
    pub container_name: Option<String>,
    /// Declared ports; replace the image's ports when non-empty
    pub ports: Vec<ContainerPort>,
    /// Process arguments
    pub args: Vec<String>,
    /// Entrypoint override; ignored when empty
    pub command: Vec<String>,
    /// Working directory override
    pub working_dir: Option<String>,
    /// Environment, sorted by name
    pub env: Vec<EnvVar>,
    /// Numeric user id
    pub run_as_user: Option<i64>,
    pub tty: bool,
    /// Keep stdin open for a single attach
    pub stdin: bool,
    pub privileged: bool,
    pub read_only_root_filesystem: bool,
    /// Memory limit in bytes
    pub memory_limit: Option<i64>,
    /// CPU limit in thousandths of a CPU
    pub cpu_limit: Option<i64>,
    /// CPU request in thousandths of a CPU
    pub cpu_request: Option<i64>,
    /// Volume mounts, already named within the deployment
    pub volume_mounts: Vec<VolumeMount>,
}

impl ContainerPatch {
    /// Name the patched container will end up with
    pub fn container_name<'a>(&'a self, default: &'a str) -> &'a str {
        self.container_name.as_deref().unwrap_or(default)
    }

    /// Apply the recorded settings to a container skeleton
    pub fn apply(&self, container: &mut Container) {
        if let Some(name) = &self.container_name {
            container.name = name.clone();
        }
        if !self.ports.is_empty() {
            container.ports = self.ports.clone();
        }
        container.args = self.args.clone();
        if !self.command.is_empty() {
            container.command = self.command.clone();
        }
        if let Some(dir) = &self.working_dir {
            container.working_dir = Some(dir.clone());
        }
        container.env.extend(self.env.iter().cloned());

        if let Some(uid) = self.run_as_user {
            container.security_context_mut().run_as_user = Some(uid);
        }
        container.tty = self.tty;
        if self.stdin {
            container.stdin = true;
            container.stdin_once = true;
        }
        if self.privileged {
            container.security_context_mut().privileged = Some(true);
        }
        if self.read_only_root_filesystem {
            container.security_context_mut().read_only_root_filesystem = Some(true);
        }

        let resources = &mut container.resources;
        if let Some(bytes) = self.memory_limit {
            resources.limits.insert("memory".to_string(), memory_quantity(bytes));
        }
        if let Some(milli_cpu) = self.cpu_limit {
            resources.limits.insert("cpu".to_string(), cpu_quantity(milli_cpu));
        }
        if let Some(milli_cpu) = self.cpu_request {
            resources.requests.insert("cpu".to_string(), cpu_quantity(milli_cpu));
        }

        container.volume_mounts.extend(self.volume_mounts.iter().cloned());
    }
}
