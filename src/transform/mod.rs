//! Translation of a compose project into platform objects
//!
//! The phases run in a fixed order: warnings and aliases are read from the
//! project, services sharing volumes are grouped, build pipelines are
//! created, every group becomes one deployment, and the pipelines are
//! realized into objects. Services are generated last, for deployments that
//! expose ports.

pub mod accumulate;
pub mod aliases;
pub mod build;
pub mod colocation;
pub mod deploy;
pub mod services;

use crate::compose::{Project, WarningTable};
use crate::error::{OsComposeError, Result};
use crate::image::{BuildInspector, DockerfileInspector};
use crate::platform::Object;
use crate::scm::{GitRepository, SourceControl};
use std::path::PathBuf;

pub use aliases::AliasMap;
pub use colocation::ColocationSet;

/// Result of a translation
#[derive(Debug)]
pub struct Transformation {
    /// Generated objects: image streams, builds and deployments, then services
    pub objects: Vec<Object>,
    /// Compose fields that were not carried over
    pub warnings: WarningTable,
    /// Services deployed together
    pub colocated: Vec<ColocationSet>,
}

/// Translates compose projects
pub struct Transformer {
    bases: Vec<PathBuf>,
    scm: Box<dyn SourceControl>,
    inspector: Box<dyn BuildInspector>,
}

impl Transformer {
    /// Transformer permitting builds under `bases`, using git and Dockerfiles
    pub fn new(bases: Vec<PathBuf>) -> Self {
        Self {
            bases,
            scm: Box::new(GitRepository::new()),
            inspector: Box::new(DockerfileInspector::new()),
        }
    }

    /// Use a different source control lookup
    pub fn source_control(mut self, scm: impl SourceControl + 'static) -> Self {
        self.scm = Box::new(scm);
        self
    }

    /// Use a different build recipe inspector
    pub fn inspector(mut self, inspector: impl BuildInspector + 'static) -> Self {
        self.inspector = Box::new(inspector);
        self
    }

    /// Permitted build context directories
    pub fn bases(&self) -> &[PathBuf] {
        &self.bases
    }

    /// Translate a project
    pub fn transform(&self, project: &Project) -> Result<Transformation> {
        tracing::info!(
            "Translating project {} with {} services",
            project.name,
            project.services.len()
        );

        let warnings = WarningTable::collect(project);
        let sharing = colocation::VolumeSharing::from_project(project);
        let colocated = sharing.solve()?;
        let aliases = aliases::resolve_aliases(project);
        tracing::debug!("Colocation sets: {:?}", colocated);

        let builds = build::BuildSynthesizer {
            bases: &self.bases,
            scm: self.scm.as_ref(),
            inspector: self.inspector.as_ref(),
        }
        .synthesize(project)?;

        let deployments = deploy::synthesize_deployments(project, &colocated, &builds)?;
        if let Some(e) = OsComposeError::aggregate(deployments.errors) {
            return Err(e);
        }

        let mut pipelines = builds.pipelines;
        pipelines.extend(deployments.pipelines);
        let mut objects = accumulate::accumulate(&pipelines)?;
        accumulate::propagate_volumes_from(&mut objects, project, &sharing.volumes_from);

        let services = services::synthesize_services(&objects, &aliases);
        objects.extend(services);

        tracing::info!("Generated {} objects", objects.len());
        Ok(Transformation {
            objects,
            warnings,
            colocated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::config::{BuildConfig, PortConfig, VolumeMount};
    use crate::compose::ServiceConfig;
    use crate::image::{Dockerfile, Recipe};
    use std::path::Path;

    struct StaticInspector(&'static str);

    impl BuildInspector for StaticInspector {
        fn inspect(&self, path: &Path) -> Result<Option<Recipe>> {
            Dockerfile::parse(path.join("Dockerfile"), self.0).map(Some)
        }

        fn last_base_image(&self, recipe: &Recipe) -> Option<String> {
            recipe.last_base_image().map(str::to_string)
        }
    }

    struct NoRepository;

    impl SourceControl for NoRepository {
        fn repository_root_of(&self, _path: &Path) -> Option<PathBuf> {
            None
        }
    }

    fn transformer() -> Transformer {
        Transformer::new(vec![PathBuf::from("/src/app")])
            .source_control(NoRepository)
            .inspector(StaticInspector("FROM python:3\n"))
    }

    fn web_and_worker() -> Project {
        Project::new("app", Default::default())
            .with_service(
                "web",
                ServiceConfig {
                    build: Some(BuildConfig::Simple("/src/app/web".to_string())),
                    ports: vec![PortConfig::Short("8080".to_string())],
                    volumes: vec![VolumeMount::Short("/var/www".to_string())],
                    ..Default::default()
                },
            )
            .with_service(
                "worker",
                ServiceConfig {
                    image: Some("redis".to_string()),
                    volumes_from: vec!["web".to_string()],
                    ..Default::default()
                },
            )
    }

    #[test]
    fn test_web_and_worker() {
        let result = transformer().transform(&web_and_worker()).unwrap();

        assert_eq!(result.colocated.len(), 1);
        assert_eq!(
            result.colocated[0].iter().collect::<Vec<_>>(),
            vec!["web", "worker"]
        );

        let kinds: Vec<(&str, &str)> = result.objects.iter().map(|o| (o.kind(), o.name())).collect();
        assert_eq!(
            kinds,
            vec![
                ("ImageStream", "web"),
                ("BuildConfig", "web"),
                ("ImageStream", "worker"),
                ("DeploymentConfig", "web"),
                ("Service", "web"),
            ]
        );

        let dc = result.objects[3].as_deployment_config().unwrap();
        let containers = dc.containers();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].name, "web");
        assert_eq!(containers[0].image, "web:latest");
        assert_eq!(containers[1].name, "worker");
        for mount in &containers[0].volume_mounts {
            assert!(containers[1].volume_mounts.contains(mount));
        }
        assert_eq!(containers[1].volume_mounts.len(), 1);
        assert_eq!(dc.spec.template.spec.volumes.len(), 1);

        let Object::Service(service) = &result.objects[4] else {
            panic!("expected a service");
        };
        assert_eq!(service.spec.ports.len(), 1);
        assert_eq!(service.spec.ports[0].port, 8080);

        assert_eq!(
            result.warnings.lines(),
            vec!["worker: volumes_from is not supported"]
        );
    }

    #[test]
    fn test_repeated_transform_is_deterministic() {
        let project = web_and_worker();
        let first = transformer().transform(&project).unwrap();
        let second = transformer().transform(&project).unwrap();
        assert_eq!(first.objects, second.objects);
    }

    #[test]
    fn test_colocation_conflict_is_fatal() {
        let sharing = |from: &[&str]| ServiceConfig {
            image: Some("busybox".to_string()),
            volumes_from: from.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let project = Project::default()
            .with_service("a", sharing(&[]))
            .with_service("b", sharing(&[]))
            .with_service("c", sharing(&["a", "b"]));

        let err = transformer().transform(&project).unwrap_err();
        assert!(matches!(err, OsComposeError::Conflict { .. }));
    }

    #[test]
    fn test_build_errors_stop_before_deployment() {
        let project = Project::default().with_service(
            "web",
            ServiceConfig {
                build: Some(BuildConfig::Simple("/elsewhere/web".to_string())),
                ..Default::default()
            },
        );
        let err = transformer().transform(&project).unwrap_err();
        assert!(matches!(err, OsComposeError::PathResolution(_)));
    }

    #[test]
    fn test_missing_images_are_reported_together() {
        let project = Project::default()
            .with_service("a", ServiceConfig::default())
            .with_service("b", ServiceConfig::default());
        let err = transformer().transform(&project).unwrap_err();
        assert_eq!(err.errors().len(), 2);
    }
}
