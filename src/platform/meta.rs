//! Object metadata shared by every platform object

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// API version of every generated object
pub const API_VERSION: &str = "v1";

/// Standard object metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name
    pub name: String,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    /// Set by the server once an object exists there
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

impl ObjectMeta {
    /// Metadata carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Reference to another object, or to an external image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference {
    /// Referenced kind, e.g. `ImageStreamTag` or `DockerImage`
    pub kind: String,
    /// Referenced name
    pub name: String,
}

impl ObjectReference {
    /// Reference to `stream:tag`
    pub fn image_stream_tag(stream: &str, tag: &str) -> Self {
        Self {
            kind: "ImageStreamTag".to_string(),
            name: format!("{}:{}", stream, tag),
        }
    }

    /// Reference to an image in a registry
    pub fn docker_image(pull_spec: impl Into<String>) -> Self {
        Self {
            kind: "DockerImage".to_string(),
            name: pull_spec.into(),
        }
    }
}

/// Render milli-CPU as a quantity: whole cores as `N`, otherwise `Nm`
pub fn cpu_quantity(milli_cpu: i64) -> String {
    if milli_cpu % 1000 == 0 {
        (milli_cpu / 1000).to_string()
    } else {
        format!("{}m", milli_cpu)
    }
}

/// Render a byte count as a decimal quantity
pub fn memory_quantity(bytes: i64) -> String {
    bytes.to_string()
}
