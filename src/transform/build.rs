//! Build pipelines for services with a build context

use crate::compose::Project;
use crate::error::{OsComposeError, Result};
use crate::image::BuildInspector;
use crate::pipeline::{ImageRef, Pipeline, SourceRef};
use crate::scm::SourceControl;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Build pipelines keyed by the build context they were created for
#[derive(Debug, Default)]
pub struct Builds {
    /// Output image of the build for each context
    pub outputs: BTreeMap<String, Rc<ImageRef>>,
    /// Build pipelines in creation order
    pub pipelines: Vec<Pipeline>,
}

impl Builds {
    /// Output image of the build of `context`
    pub fn output(&self, context: &str) -> Option<Rc<ImageRef>> {
        self.outputs.get(context).cloned()
    }
}

/// Creates one build pipeline per distinct build context
pub struct BuildSynthesizer<'a> {
    pub bases: &'a [PathBuf],
    pub scm: &'a dyn SourceControl,
    pub inspector: &'a dyn BuildInspector,
}

impl BuildSynthesizer<'_> {
    /// Create build pipelines for every service with a build context, in
    /// service order. Failures of one service do not stop the others; they
    /// are reported together at the end.
    pub fn synthesize(&self, project: &Project) -> Result<Builds> {
        let mut builds = Builds::default();
        let mut errors = Vec::new();

        for (name, service) in &project.services {
            let Some(context) = service.build_context() else {
                continue;
            };
            if builds.outputs.contains_key(context) {
                tracing::debug!("Build context {} of {} already has a pipeline", context, name);
                continue;
            }
            match self.pipeline(name, context, &service.port_specs()) {
                Ok(pipeline) => {
                    tracing::info!("Created build pipeline for {} from {}", name, context);
                    builds
                        .outputs
                        .insert(context.to_string(), Rc::clone(&pipeline.image));
                    builds.pipelines.push(pipeline);
                }
                Err(e) => {
                    tracing::warn!("Cannot build {}: {}", name, e);
                    errors.push(e);
                }
            }
        }

        match OsComposeError::aggregate(errors) {
            Some(e) => Err(e),
            None => Ok(builds),
        }
    }

    fn pipeline(&self, name: &str, context: &str, ports: &[String]) -> Result<Pipeline> {
        let (base, relative) = self
            .resolve(context)
            .ok_or_else(|| OsComposeError::PathResolution(context.to_string()))?;

        // a root the context cannot be expressed against leaves the declared path
        let rebased = self
            .scm
            .repository_root_of(&base)
            .and_then(|root| rebase(&root, &base.join(&relative)).map(|rel| (root, rel)));
        let (base, relative, root_found) = match rebased {
            Some((root, relative)) => (root, relative, true),
            None => (base, relative, false),
        };
        let build_path = base.join(&relative);
        tracing::debug!(
            "Build context of {} is {} in {}",
            name,
            relative.display(),
            base.display()
        );

        let recipe = self.inspector.inspect(&build_path)?.ok_or_else(|| {
            OsComposeError::Recipe(format!("unable to locate a Dockerfile in {}", context))
        })?;
        let base_image = self.inspector.last_base_image(&recipe).ok_or_else(|| {
            OsComposeError::Recipe(format!(
                "the Dockerfile in {} has no FROM instruction",
                build_path.display()
            ))
        })?;

        let ports = if ports.is_empty() {
            self.inspector.exposed_ports(&recipe)
        } else {
            ports.to_vec()
        };

        let mut input = ImageRef::from_name_and_ports(&base_image, &ports)?;
        input.as_image_stream = true;
        input.tag_directly = true;
        input.object_name = name.to_string();
        input.tag = "from".to_string();

        let location = root_found
            .then(|| self.scm.origin_url(&base))
            .flatten()
            .unwrap_or_else(|| base.display().to_string());
        let context_dir = if relative.as_os_str().is_empty() {
            None
        } else {
            Some(relative.to_string_lossy().into_owned())
        };

        Ok(Pipeline::build(
            name,
            SourceRef {
                location,
                context_dir,
                name: name.to_string(),
            },
            input,
        ))
    }

    /// First permitted base the context lies under, and the path relative to it
    fn resolve(&self, context: &str) -> Option<(PathBuf, PathBuf)> {
        self.bases.iter().find_map(|base| {
            if !context.starts_with(base.to_string_lossy().as_ref()) {
                return None;
            }
            let relative = Path::new(context).strip_prefix(base).ok()?;
            Some((base.clone(), relative.to_path_buf()))
        })
    }
}

/// `path` relative to a repository root, resolving symlinks if needed
fn rebase(root: &Path, path: &Path) -> Option<PathBuf> {
    if let Ok(relative) = path.strip_prefix(root) {
        return Some(relative.to_path_buf());
    }
    let canonical = path.canonicalize().ok()?;
    canonical.strip_prefix(root).ok().map(Path::to_path_buf)
}
