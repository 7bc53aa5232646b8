//! Deployment pipelines, one per colocation set

use super::build::Builds;
use super::colocation::ColocationSet;
use crate::compose::{Project, ServiceConfig};
use crate::error::{OsComposeError, Result};
use crate::pipeline::image::container_ports;
use crate::pipeline::{ContainerPatch, ImageRef, Pipeline, PipelineGroup};
use crate::platform::{EnvVar, VolumeMount};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Smallest CPU quota honored, in microseconds per period
const MIN_QUOTA: i64 = 1000;
/// CFS scheduling period, in microseconds
const QUOTA_PERIOD: i64 = 100_000;
/// Smallest CPU share count honored
const MIN_SHARES: i64 = 2;
/// Shares equivalent to one CPU
const SHARES_PER_CPU: i64 = 1024;

/// CPU limit in thousandths of a CPU for a CPU quota
pub fn cpu_limit_from_quota(quota: i64) -> i64 {
    quota.max(MIN_QUOTA).saturating_mul(1000) / QUOTA_PERIOD
}

/// CPU request in thousandths of a CPU for a share count
pub fn cpu_request_from_shares(shares: i64) -> i64 {
    shares.max(MIN_SHARES).saturating_mul(1000) / SHARES_PER_CPU
}

/// Volume names of one deployment, keyed by mount source
#[derive(Debug, Clone, Default)]
pub struct VolumeMountTable {
    names: HashMap<String, String>,
}

impl VolumeMountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the volume for `source`, assigned `dir-N` on first use
    pub fn name_for(&mut self, source: &str) -> String {
        let next = self.names.len() + 1;
        self.names
            .entry(source.to_string())
            .or_insert_with(|| format!("dir-{}", next))
            .clone()
    }
}

/// Record the runtime settings of service `name`
pub fn container_patch(
    name: &str,
    service: &ServiceConfig,
    mounts: &mut VolumeMountTable,
) -> ContainerPatch {
    let container_name = service
        .container_name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| name.to_string());

    let env: BTreeMap<String, String> = service
        .environment
        .as_ref()
        .map(|e| e.declarations())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|declaration| {
            let (key, value) = declaration.split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect();

    ContainerPatch {
        container_name: Some(container_name),
        ports: container_ports(&service.port_specs()),
        args: service.command.as_ref().map(|c| c.words()).unwrap_or_default(),
        command: service.entrypoint.as_ref().map(|c| c.words()).unwrap_or_default(),
        working_dir: service.working_dir.clone().filter(|d| !d.is_empty()),
        env: env
            .into_iter()
            .map(|(name, value)| EnvVar { name, value })
            .collect(),
        run_as_user: service.numeric_user(),
        tty: service.tty,
        stdin: service.stdin_open,
        privileged: service.privileged,
        read_only_root_filesystem: service.read_only,
        memory_limit: service
            .mem_limit
            .as_ref()
            .and_then(|m| m.bytes())
            .filter(|bytes| *bytes > 0),
        cpu_limit: service
            .cpu_quota
            .filter(|q| *q > 0)
            .map(cpu_limit_from_quota),
        cpu_request: service
            .cpu_shares
            .filter(|s| *s > 0)
            .map(cpu_request_from_shares),
        volume_mounts: volume_mounts(&service.volume_specs(), mounts),
    }
}

/// Mounts for `SOURCE:TARGET[:MODE]` or bare `TARGET` volume specs, grouped
/// per source in first-seen order
fn volume_mounts(specs: &[String], mounts: &mut VolumeMountTable) -> Vec<VolumeMount> {
    let mut by_source: Vec<(&str, Vec<&str>)> = Vec::new();
    for spec in specs {
        let parts: Vec<&str> = spec.splitn(3, ':').collect();
        let (source, target) = match parts.as_slice() {
            [target] => ("", *target),
            [source, target, ..] => (*source, *target),
            [] => continue,
        };
        match by_source.iter_mut().find(|(s, _)| *s == source) {
            Some((_, targets)) => targets.push(target),
            None => by_source.push((source, vec![target])),
        }
    }

    let mut result = Vec::new();
    for (source, targets) in by_source {
        let name = mounts.name_for(source);
        for target in targets {
            result.push(VolumeMount {
                name: name.clone(),
                mount_path: target.to_string(),
            });
        }
    }
    result
}

/// Deployment pipelines, plus the members that could not be deployed
#[derive(Debug, Default)]
pub struct Deployments {
    pub pipelines: Vec<Pipeline>,
    pub errors: Vec<OsComposeError>,
}

/// Turn every colocation set into one deployment. Members without an image
/// are skipped and reported in [`Deployments::errors`]; reduction failures
/// abort.
pub fn synthesize_deployments(
    project: &Project,
    colocated: &[ColocationSet],
    builds: &Builds,
) -> Result<Deployments> {
    let mut deployments = Deployments::default();

    for set in colocated {
        let mut group = PipelineGroup::new();
        let mut mounts = VolumeMountTable::new();

        for name in set {
            let (service, image) = match resolve_image(project, name, builds) {
                Ok(resolved) => resolved,
                Err(e) => {
                    tracing::warn!("Skipping deployment of {}: {}", name, e);
                    deployments.errors.push(e);
                    continue;
                }
            };

            let patch = container_patch(name, service, &mut mounts);
            let mut pipeline = Pipeline::image(name, image, patch);
            pipeline.needs_deployment()?;
            group.push(pipeline);
        }

        group.reduce()?;
        if let Some(deployment) = group.0.iter().find_map(|p| p.deployment.as_ref()) {
            tracing::info!(
                "Deployment {} runs {} container(s)",
                deployment.name,
                deployment.bindings.len()
            );
        }
        deployments.pipelines.extend(group.into_inner());
    }

    Ok(deployments)
}

/// Service `name` and the image it runs: its named image, or the output of
/// its build
fn resolve_image<'a>(
    project: &'a Project,
    name: &str,
    builds: &Builds,
) -> Result<(&'a ServiceConfig, Rc<ImageRef>)> {
    let service = project
        .services
        .get(name)
        .ok_or_else(|| OsComposeError::ImageResolution(name.to_string()))?;

    if let Some(image) = service.image.as_deref().filter(|i| !i.is_empty()) {
        let mut image = ImageRef::from_name(image)?;
        image.as_image_stream = true;
        image.tag_directly = true;
        image.object_name = name.to_string();
        return Ok((service, Rc::new(image)));
    }

    service
        .build_context()
        .and_then(|context| builds.output(context))
        .map(|image| (service, image))
        .ok_or_else(|| OsComposeError::ImageResolution(name.to_string()))
}
