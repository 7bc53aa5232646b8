//! Deployment configurations and the pods they run

use super::meta::{ObjectMeta, ObjectReference, API_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label selecting the pods of a deployment
pub const DEPLOYMENT_LABEL: &str = "deploymentconfig";

/// A deployment unit: one pod template run with a number of replicas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: DeploymentConfigSpec,
}

impl DeploymentConfig {
    /// Deployment of `template`
    pub fn new(
        name: impl Into<String>,
        replicas: u32,
        selector: BTreeMap<String, String>,
        triggers: Vec<DeploymentTrigger>,
        template: PodTemplateSpec,
    ) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: "DeploymentConfig".to_string(),
            metadata: ObjectMeta::named(name),
            spec: DeploymentConfigSpec {
                replicas,
                selector,
                triggers,
                template,
            },
        }
    }

    /// Containers of the pod template
    pub fn containers(&self) -> &[Container] {
        &self.spec.template.spec.containers
    }

    /// Containers of the pod template, mutably
    pub fn containers_mut(&mut self) -> &mut Vec<Container> {
        &mut self.spec.template.spec.containers
    }
}

/// Deployment contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfigSpec {
    pub replicas: u32,
    pub selector: BTreeMap<String, String>,
    pub triggers: Vec<DeploymentTrigger>,
    pub template: PodTemplateSpec,
}

/// What rolls out a new deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTrigger {
    #[serde(rename = "type")]
    pub trigger_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_change_params: Option<ImageChangeParams>,
}

impl DeploymentTrigger {
    /// Redeploy when the configuration changes
    pub fn config_change() -> Self {
        Self {
            trigger_type: "ConfigChange".to_string(),
            image_change_params: None,
        }
    }

    /// Redeploy `container` when `from` gets a new image
    pub fn image_change(container: impl Into<String>, from: ObjectReference) -> Self {
        Self {
            trigger_type: "ImageChange".to_string(),
            image_change_params: Some(ImageChangeParams {
                automatic: true,
                container_names: vec![container.into()],
                from,
            }),
        }
    }
}

/// Image change trigger parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageChangeParams {
    pub automatic: bool,
    pub container_names: Vec<String>,
    pub from: ObjectReference,
}

/// Pod template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodTemplateSpec {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

/// Pod contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    pub containers: Vec<Container>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

/// A container in a pod
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "ResourceRequirements::is_empty")]
    pub resources: ResourceRequirements,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stdin: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stdin_once: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tty: bool,
}

impl Container {
    /// Security context, created on first use
    pub fn security_context_mut(&mut self) -> &mut SecurityContext {
        self.security_context.get_or_insert_with(SecurityContext::default)
    }
}

/// A port a container listens on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub container_port: u16,
    pub protocol: String,
}

/// An environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Compute resources, keyed by resource name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, String>,
}

impl ResourceRequirements {
    /// Whether no limits or requests are set
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty() && self.requests.is_empty()
    }
}

/// A volume mounted into a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
}

/// A pod volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    pub empty_dir: EmptyDirVolumeSource,
}

impl Volume {
    /// Scratch volume living as long as the pod
    pub fn empty_dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            empty_dir: EmptyDirVolumeSource::default(),
        }
    }
}

/// Scratch volume source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyDirVolumeSource {}

/// Process security settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only_root_filesystem: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_omits_unset_fields() {
        let container = Container {
            name: "web".to_string(),
            image: "web:latest".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&container).unwrap();
        assert_eq!(json, serde_json::json!({"name": "web", "image": "web:latest"}));
    }

    #[test]
    fn test_container_wire_names() {
        let mut container = Container {
            name: "web".to_string(),
            stdin_once: true,
            ..Default::default()
        };
        container.security_context_mut().read_only_root_filesystem = Some(true);
        container.volume_mounts.push(VolumeMount {
            name: "dir-1".to_string(),
            mount_path: "/data".to_string(),
        });
        let json = serde_json::to_value(&container).unwrap();
        assert_eq!(json["stdinOnce"], true);
        assert_eq!(json["securityContext"]["readOnlyRootFilesystem"], true);
        assert_eq!(json["volumeMounts"][0]["mountPath"], "/data");
    }

    #[test]
    fn test_image_change_trigger() {
        let trigger =
            DeploymentTrigger::image_change("web", ObjectReference::image_stream_tag("web", "latest"));
        let json = serde_json::to_value(&trigger).unwrap();
        assert_eq!(json["type"], "ImageChange");
        assert_eq!(json["imageChangeParams"]["containerNames"][0], "web");
        assert_eq!(json["imageChangeParams"]["from"]["name"], "web:latest");
    }
}
