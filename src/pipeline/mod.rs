//! Build and deployment pipelines
//!
//! A pipeline ties an image to what happens to it: built from source,
//! deployed, or both. Pipelines are assembled first and realized into
//! platform objects in a separate step.

pub mod accept;
pub mod image;
pub mod patch;

use crate::error::{OsComposeError, Result};
use crate::platform::{
    BuildConfig, BuildSource, Container, DeploymentConfig, DeploymentTrigger, Object,
    PodTemplateSpec, Volume, DEPLOYMENT_LABEL,
};
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

pub use accept::{AcceptFirst, AcceptNew, AcceptUnique, Acceptor, Acceptors};
pub use image::ImageRef;
pub use patch::ContainerPatch;

/// Where build sources live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Repository URL or local path
    pub location: String,
    /// Subdirectory holding the build context
    pub context_dir: Option<String>,
    pub name: String,
}

/// Build of an output image from source and an input image
#[derive(Debug, Clone)]
pub struct BuildRef {
    pub source: SourceRef,
    pub input: Rc<ImageRef>,
    pub output: Rc<ImageRef>,
}

impl BuildRef {
    /// Build configuration for this build
    pub fn build_config(&self) -> BuildConfig {
        BuildConfig::docker(
            &self.source.name,
            BuildSource::git(&self.source.location, self.source.context_dir.clone()),
            self.input.stream_tag(),
            self.output.stream_tag(),
        )
    }
}

/// One container of a deployment: an image plus its service settings
#[derive(Debug, Clone)]
pub struct ContainerBinding {
    pub image: Rc<ImageRef>,
    pub patch: ContainerPatch,
}

impl ContainerBinding {
    /// Name of the container this binding produces
    pub fn container_name(&self) -> &str {
        self.patch.container_name(&self.image.object_name)
    }

    /// Realize the container
    pub fn container(&self) -> Container {
        let mut container = self.image.container();
        self.patch.apply(&mut container);
        container
    }
}

/// Deployment of one or more containers as a unit
#[derive(Debug, Clone)]
pub struct DeploymentRef {
    pub name: String,
    pub bindings: Vec<ContainerBinding>,
    pub replicas: u32,
}

impl DeploymentRef {
    /// Labels selecting this deployment's pods
    pub fn selector(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(DEPLOYMENT_LABEL.to_string(), self.name.clone())])
    }

    /// Deployment configuration for this deployment
    pub fn deployment_config(&self) -> DeploymentConfig {
        let containers: Vec<Container> = self.bindings.iter().map(ContainerBinding::container).collect();

        let mut triggers = vec![DeploymentTrigger::config_change()];
        for (binding, container) in self.bindings.iter().zip(&containers) {
            if binding.image.as_image_stream {
                triggers.push(DeploymentTrigger::image_change(
                    &container.name,
                    binding.image.stream_tag(),
                ));
            }
        }

        let mut volumes: Vec<Volume> = Vec::new();
        for mount in containers.iter().flat_map(|c| &c.volume_mounts) {
            if !volumes.iter().any(|v| v.name == mount.name) {
                volumes.push(Volume::empty_dir(&mount.name));
            }
        }

        let mut template = PodTemplateSpec::default();
        template.metadata.labels = self.selector();
        template.spec.containers = containers;
        template.spec.volumes = volumes;

        DeploymentConfig::new(&self.name, self.replicas, self.selector(), triggers, template)
    }
}

/// A unit of translation: an image and what is done with it
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub name: String,
    pub build: Option<BuildRef>,
    pub image: Rc<ImageRef>,
    pub deployment: Option<DeploymentRef>,
    /// Settings for the container running `image`, once deployed
    pub patch: ContainerPatch,
}

impl Pipeline {
    /// Pipeline building `name` from `source` on top of `input`; its image is the build output
    pub fn build(name: &str, source: SourceRef, input: ImageRef) -> Self {
        let mut output = ImageRef::output(name);
        output.exposed_ports = input.exposed_ports.clone();
        let output = Rc::new(output);
        Self {
            name: name.to_string(),
            build: Some(BuildRef {
                source,
                input: Rc::new(input),
                output: Rc::clone(&output),
            }),
            image: output,
            deployment: None,
            patch: ContainerPatch::default(),
        }
    }

    /// Pipeline running an existing image
    pub fn image(name: &str, image: Rc<ImageRef>, patch: ContainerPatch) -> Self {
        Self {
            name: name.to_string(),
            build: None,
            image,
            deployment: None,
            patch,
        }
    }

    /// Attach a single-replica deployment of this pipeline's image
    pub fn needs_deployment(&mut self) -> Result<()> {
        if self.deployment.is_some() {
            return Ok(());
        }
        if self.name.is_empty() {
            return Err(OsComposeError::Internal(format!(
                "cannot deploy image {} from an unnamed pipeline",
                self.image.pull_spec()
            )));
        }
        self.deployment = Some(DeploymentRef {
            name: self.name.clone(),
            bindings: vec![ContainerBinding {
                image: Rc::clone(&self.image),
                patch: self.patch.clone(),
            }],
            replicas: 1,
        });
        Ok(())
    }

    /// Realize this pipeline into platform objects, in dependency order
    pub fn objects(&self, accept: &mut AcceptFirst, acceptors: &mut dyn Acceptor) -> Result<Vec<Object>> {
        let mut candidates: Vec<Object> = Vec::new();

        if let Some(build) = &self.build {
            if accept.accept(&build.input) {
                candidates.extend(build.input.image_stream().map(Object::from));
            }
            candidates.push(build.build_config().into());
            if accept.accept(&build.output) {
                candidates.extend(build.output.image_stream().map(Object::from));
            }
        }

        if let Some(deployment) = &self.deployment {
            for binding in &deployment.bindings {
                if accept.accept(&binding.image) {
                    candidates.extend(binding.image.image_stream().map(Object::from));
                }
            }
            candidates.push(deployment.deployment_config().into());
        }

        Ok(candidates
            .into_iter()
            .filter(|object| acceptors.accept(object))
            .collect())
    }
}

/// Pipelines deployed together as one unit
#[derive(Debug, Clone, Default)]
pub struct PipelineGroup(pub Vec<Pipeline>);

impl PipelineGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pipeline: Pipeline) {
        self.0.push(pipeline);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge every deployment of the group into the first one, so the group
    /// runs as a single unit named after its first member
    pub fn reduce(&mut self) -> Result<()> {
        let mut pipelines = self.0.iter_mut().filter(|p| p.deployment.is_some());
        let Some(first) = pipelines.next() else {
            return Ok(());
        };
        let Some(mut merged) = first.deployment.take() else {
            return Ok(());
        };
        for pipeline in pipelines {
            if let Some(deployment) = pipeline.deployment.take() {
                merged.bindings.extend(deployment.bindings);
            }
        }

        if let Some(duplicate) = duplicate_container_name(&merged) {
            return Err(OsComposeError::Reduction(format!(
                "the container name {:?} is used more than once in deployment {:?}",
                duplicate, merged.name
            )));
        }

        first.deployment = Some(merged);
        Ok(())
    }

    pub fn into_inner(self) -> Vec<Pipeline> {
        self.0
    }
}

fn duplicate_container_name(deployment: &DeploymentRef) -> Option<String> {
    let mut names = HashSet::new();
    deployment
        .bindings
        .iter()
        .map(ContainerBinding::container_name)
        .find(|name| !names.insert(*name))
        .map(str::to_string)
}
