//! Platform object model
//!
//! The subset of the OpenShift `v1` API the translation produces, with serde
//! representations matching the wire format.

pub mod build;
pub mod meta;
pub mod service;
pub mod workload;

use serde::Serialize;

pub use build::{BuildConfig, BuildSource, ImageStream, TagReference};
pub use meta::{cpu_quantity, memory_quantity, ObjectMeta, ObjectReference, API_VERSION};
pub use service::{Service, ServicePort};
pub use workload::{
    Container, ContainerPort, DeploymentConfig, DeploymentTrigger, EnvVar, PodTemplateSpec,
    SecurityContext, Volume, VolumeMount, DEPLOYMENT_LABEL,
};

/// Any generated platform object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Object {
    ImageStream(ImageStream),
    BuildConfig(BuildConfig),
    DeploymentConfig(DeploymentConfig),
    Service(Service),
}

impl Object {
    /// Object kind
    pub fn kind(&self) -> &str {
        match self {
            Object::ImageStream(o) => &o.kind,
            Object::BuildConfig(o) => &o.kind,
            Object::DeploymentConfig(o) => &o.kind,
            Object::Service(o) => &o.kind,
        }
    }

    /// Object metadata
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Object::ImageStream(o) => &o.metadata,
            Object::BuildConfig(o) => &o.metadata,
            Object::DeploymentConfig(o) => &o.metadata,
            Object::Service(o) => &o.metadata,
        }
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    /// The deployment config, if this is one
    pub fn as_deployment_config(&self) -> Option<&DeploymentConfig> {
        match self {
            Object::DeploymentConfig(dc) => Some(dc),
            _ => None,
        }
    }

    /// The deployment config, if this is one, mutably
    pub fn as_deployment_config_mut(&mut self) -> Option<&mut DeploymentConfig> {
        match self {
            Object::DeploymentConfig(dc) => Some(dc),
            _ => None,
        }
    }
}

impl From<ImageStream> for Object {
    fn from(o: ImageStream) -> Self {
        Object::ImageStream(o)
    }
}

impl From<BuildConfig> for Object {
    fn from(o: BuildConfig) -> Self {
        Object::BuildConfig(o)
    }
}

impl From<DeploymentConfig> for Object {
    fn from(o: DeploymentConfig) -> Self {
        Object::DeploymentConfig(o)
    }
}

impl From<Service> for Object {
    fn from(o: Service) -> Self {
        Object::Service(o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_kind_and_name() {
        let object = Object::from(ImageStream::new("web"));
        assert_eq!(object.kind(), "ImageStream");
        assert_eq!(object.name(), "web");
        assert!(object.as_deployment_config().is_none());
    }

    #[test]
    fn test_object_serializes_without_wrapper() {
        let json = serde_json::to_value(Object::from(ImageStream::new("web"))).unwrap();
        assert_eq!(json["kind"], "ImageStream");
        assert_eq!(json["metadata"]["name"], "web");
    }
}
