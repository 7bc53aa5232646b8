//! Image references as pipelines consume and produce them

use crate::compose::parse_port_spec;
use crate::error::Result;
use crate::image::reference::{ImageReference, DEFAULT_TAG};
use crate::platform::{Container, ContainerPort, ImageStream, ObjectReference, TagReference};

/// An image a pipeline builds from, builds to, or deploys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Underlying registry reference
    pub reference: ImageReference,
    /// Track the image through an image stream
    pub as_image_stream: bool,
    /// Point a stream tag straight at the registry image instead of importing the repository
    pub tag_directly: bool,
    /// Produced by a build rather than pulled
    pub output: bool,
    /// Name of the image stream and default container name
    pub object_name: String,
    /// Stream tag
    pub tag: String,
    /// Ports the image listens on
    pub exposed_ports: Vec<ContainerPort>,
}

impl ImageRef {
    /// Resolve an image name like `redis` or `registry.example.com/team/app:1.2`
    pub fn from_name(name: &str) -> Result<Self> {
        let reference = ImageReference::parse(name)?;
        Ok(Self {
            object_name: reference.name.clone(),
            tag: reference.tag_or_default().to_string(),
            reference,
            as_image_stream: false,
            tag_directly: false,
            output: false,
            exposed_ports: Vec::new(),
        })
    }

    /// Resolve an image name together with the ports it listens on.
    /// Port specs that are not numeric are ignored.
    pub fn from_name_and_ports(name: &str, ports: &[String]) -> Result<Self> {
        let mut image = Self::from_name(name)?;
        image.exposed_ports = container_ports(ports);
        Ok(image)
    }

    /// Image stream a build named `name` pushes to
    pub fn output(name: &str) -> Self {
        Self {
            reference: ImageReference {
                name: name.to_string(),
                tag: Some(DEFAULT_TAG.to_string()),
                ..Default::default()
            },
            as_image_stream: true,
            tag_directly: false,
            output: true,
            object_name: name.to_string(),
            tag: DEFAULT_TAG.to_string(),
            exposed_ports: Vec::new(),
        }
    }

    /// Reference to the image, as builds and triggers consume it
    pub fn stream_tag(&self) -> ObjectReference {
        if self.as_image_stream {
            ObjectReference::image_stream_tag(&self.object_name, &self.tag)
        } else {
            ObjectReference::docker_image(self.pull_spec())
        }
    }

    /// Registry pull spec
    pub fn pull_spec(&self) -> String {
        self.reference.to_string()
    }

    /// Image stream tracking this image, if it is tracked by one
    pub fn image_stream(&self) -> Option<ImageStream> {
        if !self.as_image_stream {
            return None;
        }
        let mut stream = ImageStream::new(&self.object_name);
        if self.output {
            return Some(stream);
        }
        if self.tag_directly {
            stream.spec.tags.push(TagReference {
                name: self.tag.clone(),
                from: ObjectReference::docker_image(self.pull_spec()),
            });
        } else {
            stream.spec.docker_image_repository = Some(self.reference.repository());
        }
        Some(stream)
    }

    /// Container running this image, before any service configuration
    pub fn container(&self) -> Container {
        let image = if self.as_image_stream {
            format!("{}:{}", self.object_name, self.tag)
        } else {
            self.pull_spec()
        };
        Container {
            name: self.object_name.clone(),
            image,
            ports: self.exposed_ports.clone(),
            ..Default::default()
        }
    }
}

/// Container ports for compose port specs, first port of each range
pub fn container_ports(ports: &[String]) -> Vec<ContainerPort> {
    ports
        .iter()
        .filter_map(|spec| {
            let spec = parse_port_spec(spec);
            let container_port = spec.container.parse().ok()?;
            Some(ContainerPort {
                container_port,
                protocol: spec.protocol,
            })
        })
        .collect()
}
