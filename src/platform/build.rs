//! Image streams and build configurations

use super::meta::{ObjectMeta, ObjectReference, API_VERSION};
use serde::{Deserialize, Serialize};

/// A tracked image repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStream {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ImageStreamSpec,
}

impl ImageStream {
    /// Empty image stream, filled by builds
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: "ImageStream".to_string(),
            metadata: ObjectMeta::named(name),
            spec: ImageStreamSpec::default(),
        }
    }
}

/// Image stream contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamSpec {
    /// External repository the stream imports from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_image_repository: Option<String>,
    /// Tags pointing directly at external images
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagReference>,
}

/// One tag of an image stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagReference {
    pub name: String,
    pub from: ObjectReference,
}

/// How to build an image from source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: BuildConfigSpec,
}

impl BuildConfig {
    /// Docker build of `source` starting from `from`, pushed to `to`
    pub fn docker(
        name: impl Into<String>,
        source: BuildSource,
        from: ObjectReference,
        to: ObjectReference,
    ) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: "BuildConfig".to_string(),
            metadata: ObjectMeta::named(name),
            spec: BuildConfigSpec {
                triggers: vec![
                    BuildTrigger {
                        trigger_type: "ConfigChange".to_string(),
                        image_change: None,
                    },
                    BuildTrigger {
                        trigger_type: "ImageChange".to_string(),
                        image_change: Some(ImageChangeTrigger::default()),
                    },
                ],
                source,
                strategy: BuildStrategy {
                    strategy_type: "Docker".to_string(),
                    docker_strategy: DockerBuildStrategy { from },
                },
                output: BuildOutput { to },
            },
        }
    }
}

/// Build configuration contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfigSpec {
    pub triggers: Vec<BuildTrigger>,
    pub source: BuildSource,
    pub strategy: BuildStrategy,
    pub output: BuildOutput,
}

/// What starts a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTrigger {
    #[serde(rename = "type")]
    pub trigger_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_change: Option<ImageChangeTrigger>,
}

/// Rebuild when the base image changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageChangeTrigger {}

/// Where build sources come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub git: GitBuildSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_dir: Option<String>,
}

impl BuildSource {
    /// Git source at `uri`, optionally in a subdirectory
    pub fn git(uri: impl Into<String>, context_dir: Option<String>) -> Self {
        Self {
            source_type: "Git".to_string(),
            git: GitBuildSource { uri: uri.into() },
            context_dir,
        }
    }
}

/// Git repository location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitBuildSource {
    pub uri: String,
}

/// Build strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStrategy {
    #[serde(rename = "type")]
    pub strategy_type: String,
    pub docker_strategy: DockerBuildStrategy,
}

/// Dockerfile build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerBuildStrategy {
    /// Replaces the FROM image of the Dockerfile
    pub from: ObjectReference,
}

/// Where the built image goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutput {
    pub to: ObjectReference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_wire_format() {
        let build = BuildConfig::docker(
            "web",
            BuildSource::git("https://example.com/app.git", Some("web".to_string())),
            ObjectReference::image_stream_tag("web", "from"),
            ObjectReference::image_stream_tag("web", "latest"),
        );
        let json = serde_json::to_value(&build).unwrap();
        assert_eq!(json["apiVersion"], "v1");
        assert_eq!(json["kind"], "BuildConfig");
        assert_eq!(json["spec"]["source"]["type"], "Git");
        assert_eq!(json["spec"]["source"]["contextDir"], "web");
        assert_eq!(json["spec"]["strategy"]["dockerStrategy"]["from"]["name"], "web:from");
        assert_eq!(json["spec"]["output"]["to"]["kind"], "ImageStreamTag");
        assert_eq!(json["spec"]["triggers"][1]["imageChange"], serde_json::json!({}));
    }

    #[test]
    fn test_empty_image_stream() {
        let json = serde_json::to_value(ImageStream::new("web")).unwrap();
        assert_eq!(json["spec"], serde_json::json!({}));
    }
}
