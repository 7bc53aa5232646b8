//! Grouping of services that share volumes

use crate::compose::Project;
use crate::error::{OsComposeError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Services that must run in one deployment unit
pub type ColocationSet = BTreeSet<String>;

/// Service a `volumes_from` declaration reads from.
///
/// Accepted forms are `NAME`, `NAME:ro|rw`, `service:NAME` and
/// `container:NAME:MODE`.
pub fn volumes_from_target(declaration: &str) -> Option<String> {
    let parts: Vec<&str> = declaration.split(':').collect();
    let target = match parts.as_slice() {
        [name] => *name,
        [name, mode] if *mode == "ro" || *mode == "rw" => *name,
        [_, name] => *name,
        [_, name, _] => *name,
        _ => return None,
    };
    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

/// Which services share volumes with which
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeSharing {
    /// Each service and the services it joins, itself included
    pub joins: BTreeMap<String, BTreeSet<String>>,
    /// Targets of each service's `volumes_from`, in declaration order
    pub volumes_from: BTreeMap<String, Vec<String>>,
}

impl VolumeSharing {
    /// Read the `volumes_from` declarations of every service
    pub fn from_project(project: &Project) -> Self {
        let mut sharing = Self::default();
        for (name, service) in &project.services {
            let joins = sharing
                .joins
                .entry(name.clone())
                .or_insert_with(|| BTreeSet::from([name.clone()]));
            for declaration in &service.volumes_from {
                let Some(target) = volumes_from_target(declaration) else {
                    tracing::debug!("Ignoring volumes_from {:?} of {}", declaration, name);
                    continue;
                };
                joins.insert(target.clone());
                sharing
                    .volumes_from
                    .entry(name.clone())
                    .or_default()
                    .push(target);
            }
        }
        sharing
    }

    /// Partition the services into colocation sets
    pub fn solve(&self) -> Result<Vec<ColocationSet>> {
        solve(&self.joins)
    }
}

/// Merge join sets into disjoint colocation sets, visiting services in
/// sorted order. A join set overlapping two existing sets is a conflict.
pub fn solve(joins: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<ColocationSet>> {
    let mut colocated: Vec<ColocationSet> = Vec::new();
    for (service, set) in joins {
        let matched: Vec<usize> = colocated
            .iter()
            .enumerate()
            .filter(|(_, existing)| !existing.is_disjoint(set))
            .map(|(i, _)| i)
            .collect();

        match matched.as_slice() {
            [] => colocated.push(set.clone()),
            [i] => colocated[*i].extend(set.iter().cloned()),
            [first, ..] => {
                return Err(OsComposeError::Conflict {
                    service: service.clone(),
                    joins: set.iter().cloned().collect(),
                    existing: colocated[*first].iter().cloned().collect(),
                })
            }
        }
    }
    Ok(colocated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ServiceConfig;

    fn sharing(volumes_from: &[&str]) -> ServiceConfig {
        ServiceConfig {
            volumes_from: volumes_from.iter().map(|v| v.to_string()).collect(),
            ..Default::default()
        }
    }

    fn set(names: &[&str]) -> ColocationSet {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_volumes_from_target_forms() {
        assert_eq!(volumes_from_target("web"), Some("web".to_string()));
        assert_eq!(volumes_from_target("web:ro"), Some("web".to_string()));
        assert_eq!(volumes_from_target("web:rw"), Some("web".to_string()));
        assert_eq!(volumes_from_target("service:web"), Some("web".to_string()));
        assert_eq!(volumes_from_target("container:web:ro"), Some("web".to_string()));
        assert_eq!(volumes_from_target("a:b:c:d"), None);
        assert_eq!(volumes_from_target(""), None);
    }

    #[test]
    fn test_partition_of_sharing_services() {
        let project = Project::default()
            .with_service("web", ServiceConfig::default())
            .with_service("worker", sharing(&["web"]))
            .with_service("logs", sharing(&["web:ro"]))
            .with_service("db", ServiceConfig::default());

        let volumes = VolumeSharing::from_project(&project);
        assert_eq!(volumes.volumes_from["logs"], vec!["web"]);
        assert!(!volumes.volumes_from.contains_key("web"));

        let sets = volumes.solve().unwrap();
        assert_eq!(sets, vec![set(&["db"]), set(&["logs", "web", "worker"])]);

        let mut seen = BTreeSet::new();
        for s in &sets {
            for name in s {
                assert!(seen.insert(name.clone()), "{} in two sets", name);
            }
        }
        assert_eq!(seen, set(&["db", "logs", "web", "worker"]));
    }

    #[test]
    fn test_declaration_order_does_not_matter() {
        let a = Project::default()
            .with_service("a", sharing(&["b", "c"]))
            .with_service("b", ServiceConfig::default())
            .with_service("c", ServiceConfig::default());
        let b = Project::default()
            .with_service("a", sharing(&["c", "b"]))
            .with_service("c", ServiceConfig::default())
            .with_service("b", ServiceConfig::default());

        let left = VolumeSharing::from_project(&a).solve().unwrap();
        let right = VolumeSharing::from_project(&b).solve().unwrap();
        assert_eq!(left, right);
        assert_eq!(left, vec![set(&["a", "b", "c"])]);
    }

    #[test]
    fn test_overlapping_two_sets_is_a_conflict() {
        let mut joins = BTreeMap::new();
        joins.insert("a".to_string(), set(&["a"]));
        joins.insert("b".to_string(), set(&["b"]));
        joins.insert("c".to_string(), set(&["a", "b", "c"]));

        let err = solve(&joins).unwrap_err();
        match err {
            OsComposeError::Conflict {
                service,
                joins,
                existing,
            } => {
                assert_eq!(service, "c");
                assert_eq!(joins, vec!["a", "b", "c"]);
                assert_eq!(existing, vec!["a"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
