//! Realization of pipelines into the final object list

use crate::compose::Project;
use crate::error::{OsComposeError, Result};
use crate::pipeline::{AcceptFirst, Acceptors, Pipeline};
use crate::platform::{Container, Object, VolumeMount};
use std::collections::BTreeMap;

/// Realize every pipeline in order, dropping duplicates and objects that
/// already exist
pub fn accumulate(pipelines: &[Pipeline]) -> Result<Vec<Object>> {
    let mut accept = AcceptFirst::new();
    let mut acceptors = Acceptors::standard();
    let mut objects = Vec::new();

    for pipeline in pipelines {
        let accepted = pipeline
            .objects(&mut accept, &mut acceptors)
            .map_err(|e| OsComposeError::Internal(format!("can't setup {:?}: {}", pipeline.name, e)))?;
        tracing::debug!("Pipeline {} produced {} object(s)", pipeline.name, accepted.len());
        objects.extend(accepted);
    }
    Ok(objects)
}

/// Give every container declaring `volumes_from` the mounts of the containers
/// it reads from. Mounts it already has are not repeated. Chains
/// (`a` from `b` from `c`) are followed, so passes repeat until nothing
/// changes.
pub fn propagate_volumes_from(
    objects: &mut [Object],
    project: &Project,
    volumes_from: &BTreeMap<String, Vec<String>>,
) {
    loop {
        let mut changed = false;
        for (target, sources) in volumes_from {
            let target_name = project.container_name(target);
            for source in sources {
                let source_name = project.container_name(source);
                let Some(mounts) = find_container(objects, &source_name).map(|c| c.volume_mounts.clone()) else {
                    tracing::debug!("No container {} to share volumes from", source_name);
                    continue;
                };
                let Some(container) = find_container_mut(objects, &target_name) else {
                    tracing::debug!("No container {} to share volumes with", target_name);
                    continue;
                };
                changed |= append_mounts(container, mounts);
            }
        }
        if !changed {
            break;
        }
    }
}

/// Append mounts the container lacks; true if any were added
fn append_mounts(container: &mut Container, mounts: Vec<VolumeMount>) -> bool {
    let mut added = false;
    for mount in mounts {
        if !container.volume_mounts.contains(&mount) {
            container.volume_mounts.push(mount);
            added = true;
        }
    }
    added
}

fn find_container<'a>(objects: &'a [Object], name: &str) -> Option<&'a Container> {
    objects
        .iter()
        .filter_map(Object::as_deployment_config)
        .flat_map(|dc| dc.containers())
        .find(|c| c.name == name)
}

fn find_container_mut<'a>(objects: &'a mut [Object], name: &str) -> Option<&'a mut Container> {
    objects
        .iter_mut()
        .filter_map(Object::as_deployment_config_mut)
        .flat_map(|dc| dc.containers_mut().iter_mut())
        .find(|c| c.name == name)
}
