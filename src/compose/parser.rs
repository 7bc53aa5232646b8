//! Docker Compose file parser

use super::config::{BuildConfig, ComposeConfig, ServiceConfig};
use super::Project;
use crate::error::{OsComposeError, Result};
use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Default compose file names
pub const DEFAULT_COMPOSE_FILES: &[&str] = &[
    "compose.yaml",
    "compose.yml",
    "docker-compose.yaml",
    "docker-compose.yml",
];

/// Compose file parser
pub struct ComposeParser;

impl ComposeParser {
    /// Find compose file in directory
    pub fn find_compose_file(dir: &Path) -> Option<PathBuf> {
        for name in DEFAULT_COMPOSE_FILES {
            let path = dir.join(name);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Parse compose file from path
    pub fn parse_file(path: &Path) -> Result<ComposeConfig> {
        let value = Self::read_value(path)?;
        Self::from_value(value)
    }

    /// Parse compose file from string
    pub fn parse_str(content: &str) -> Result<ComposeConfig> {
        let value: Value = serde_yaml::from_str(content)
            .map_err(|e| OsComposeError::ComposeParse(format!("Failed to parse YAML: {}", e)))?;
        Self::from_value(value)
    }

    /// Parse multiple compose files, later files overriding earlier ones
    pub fn parse_files(paths: &[&Path]) -> Result<ComposeConfig> {
        let mut merged = Value::Mapping(Mapping::new());
        for path in paths {
            let overlay = Self::read_value(path)?;
            merged = merge_values(merged, overlay);
        }
        Self::from_value(merged)
    }

    /// Load a project from compose files: merge, interpolate, and resolve
    /// build contexts against the directory of the first file.
    pub fn load_project(
        paths: &[&Path],
        name: Option<&str>,
        env: &HashMap<String, String>,
    ) -> Result<Project> {
        let first = paths
            .first()
            .ok_or_else(|| OsComposeError::ComposeParse("No compose file given".to_string()))?;

        let mut merged = Value::Mapping(Mapping::new());
        for path in paths {
            let overlay = Self::read_value(path)?;
            merged = merge_values(merged, overlay);
        }
        let pattern = interpolation_pattern()?;
        interpolate_value(&mut merged, env, &pattern);

        let mut config = Self::from_value(merged)?;
        let dir = project_dir(first);
        Self::resolve_build_contexts(&mut config, &dir);

        let name = name
            .map(str::to_string)
            .or_else(|| config.name.clone())
            .unwrap_or_else(|| {
                dir.file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or("default")
                    .to_string()
            });

        tracing::info!("Loaded project {} with {} services", name, config.services.len());
        Ok(Project::new(name, config.services))
    }

    /// Make relative build contexts absolute against the project directory.
    /// Remote contexts (git URLs) are left alone.
    pub fn resolve_build_contexts(config: &mut ComposeConfig, dir: &Path) {
        for service in config.services.values_mut() {
            let context = match service.build.as_mut() {
                Some(BuildConfig::Simple(path)) => path,
                Some(BuildConfig::Full(full)) => match full.context.as_mut() {
                    Some(path) => path,
                    None => continue,
                },
                None => continue,
            };
            if context.is_empty() || is_remote(context) || Path::new(context.as_str()).is_absolute() {
                continue;
            }
            let resolved = normalize(&dir.join(context.as_str()));
            *context = resolved.display().to_string();
        }
    }

    /// Validate compose configuration, returning non-fatal findings
    pub fn validate(config: &ComposeConfig) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        for (name, service) in &config.services {
            // Service must have either image or build
            if service.image.is_none() && service.build_context().is_none() {
                return Err(OsComposeError::ComposeParse(format!(
                    "Service '{}' must have either 'image' or 'build' specified",
                    name
                )));
            }

            for from in &service.volumes_from {
                if let Some(target) = crate::transform::colocation::volumes_from_target(from) {
                    if !config.services.contains_key(&target) {
                        warnings.push(format!(
                            "Service '{}' shares volumes with unknown service '{}'",
                            name, target
                        ));
                    }
                }
            }

            for (target, _) in service.link_aliases() {
                if !config.services.contains_key(target) {
                    warnings.push(format!("Service '{}' links to unknown service '{}'", name, target));
                }
            }
        }

        Ok(warnings)
    }

    /// Interpolate environment variables in every string of the config
    pub fn interpolate(config: &mut ComposeConfig, env: &HashMap<String, String>) -> Result<()> {
        let mut value = serde_yaml::to_value(&*config).map_err(|e| OsComposeError::Yaml(e.to_string()))?;
        let pattern = interpolation_pattern()?;
        interpolate_value(&mut value, env, &pattern);
        *config = Self::from_value(value)?;
        Ok(())
    }

    fn read_value(path: &Path) -> Result<Value> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OsComposeError::ComposeParse(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            OsComposeError::ComposeParse(format!("Failed to parse YAML in {}: {}", path.display(), e))
        })
    }

    /// Version 2+ files nest services under `services:`; version 1 files
    /// declare them at the top level.
    fn from_value(value: Value) -> Result<ComposeConfig> {
        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(ComposeConfig::default()),
            _ => {
                return Err(OsComposeError::ComposeParse(
                    "Top level of a compose file must be a mapping".to_string(),
                ))
            }
        };

        if mapping.contains_key("services") {
            return serde_yaml::from_value(Value::Mapping(mapping))
                .map_err(|e| OsComposeError::ComposeParse(format!("Failed to parse YAML: {}", e)));
        }

        let mut services = BTreeMap::new();
        for (key, value) in mapping {
            let Some(name) = key.as_str() else {
                return Err(OsComposeError::ComposeParse(format!("Invalid service name: {:?}", key)));
            };
            if name == "version" {
                continue;
            }
            let service: ServiceConfig = serde_yaml::from_value(value).map_err(|e| {
                OsComposeError::ComposeParse(format!("Failed to parse service '{}': {}", name, e))
            })?;
            services.insert(name.to_string(), service);
        }
        Ok(ComposeConfig {
            version: Some("1".to_string()),
            name: None,
            services,
        })
    }
}

/// Directory holding a compose file
pub fn project_dir(path: &Path) -> PathBuf {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::canonicalize(&dir).unwrap_or(dir)
}

fn is_remote(context: &str) -> bool {
    ["git://", "git@", "github.com/", "http://", "https://"]
        .iter()
        .any(|prefix| context.starts_with(prefix))
}

/// Lexically remove `.` and resolve `..` components
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Deep merge of two YAML documents; mappings merge key by key, anything
/// else in the overlay replaces the base.
fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Mapping(base)
        }
        (_, overlay) => overlay,
    }
}

fn interpolation_pattern() -> Result<Regex> {
    Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_]*)(?::?-([^}]*))?\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .map_err(|e| OsComposeError::Internal(format!("invalid interpolation pattern: {}", e)))
}

fn interpolate_value(value: &mut Value, env: &HashMap<String, String>, pattern: &Regex) {
    match value {
        Value::String(s) => *s = interpolate_string(s, env, pattern),
        Value::Sequence(seq) => {
            for item in seq.iter_mut() {
                interpolate_value(item, env, pattern);
            }
        }
        Value::Mapping(mapping) => {
            for (_, item) in mapping.iter_mut() {
                interpolate_value(item, env, pattern);
            }
        }
        _ => {}
    }
}

/// Interpolate `$VAR`, `${VAR}` and `${VAR:-default}`; `$$` is a literal `$`
fn interpolate_string(s: &str, env: &HashMap<String, String>, pattern: &Regex) -> String {
    pattern
        .replace_all(s, |caps: &Captures| {
            if &caps[0] == "$$" {
                return "$".to_string();
            }
            let var = caps.get(1).or_else(|| caps.get(3)).map(|m| m.as_str()).unwrap_or_default();
            match (env.get(var), caps.get(2)) {
                (Some(value), _) if !value.is_empty() => value.clone(),
                (Some(value), None) => value.clone(),
                (_, Some(default)) => default.as_str().to_string(),
                (None, None) => {
                    tracing::warn!("The {} variable is not set. Defaulting to a blank string.", var);
                    String::new()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::config::PortConfig;

    #[test]
    fn test_parse_simple_compose() {
        let yaml = r#"
version: "2"
services:
  web:
    build: ./web
    ports:
      - "8080"
  worker:
    image: redis
    volumes_from:
      - web
"#;

        let config = ComposeParser::parse_str(yaml).unwrap();
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services["web"].build_context(), Some("./web"));
        assert_eq!(config.services["worker"].volumes_from, vec!["web"]);
    }

    #[test]
    fn test_parse_version_one_layout() {
        let yaml = r#"
db:
  image: postgres:9.4
  ports:
    - 5432
app:
  build: .
  links:
    - db:database
"#;

        let config = ComposeParser::parse_str(yaml).unwrap();
        assert_eq!(config.version.as_deref(), Some("1"));
        assert_eq!(config.services.len(), 2);
        assert!(matches!(config.services["db"].ports[0], PortConfig::Number(5432)));
        assert_eq!(
            config.services["app"].link_aliases().collect::<Vec<_>>(),
            vec![("db", "database")]
        );
    }

    #[test]
    fn test_validate_missing_image() {
        let yaml = r#"
services:
  web:
    ports:
      - "80:80"
"#;

        let config = ComposeParser::parse_str(yaml).unwrap();
        let result = ComposeParser::validate(&config);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_unknown_references() {
        let yaml = r#"
services:
  web:
    image: nginx
    volumes_from:
      - data:ro
    links:
      - cache:redis
"#;

        let config = ComposeParser::parse_str(yaml).unwrap();
        let warnings = ComposeParser::validate(&config).unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("'data'"));
        assert!(warnings[1].contains("'cache'"));
    }

    #[test]
    fn test_interpolate() {
        let mut env = HashMap::new();
        env.insert("TAG".to_string(), "1.0.0".to_string());
        let pattern = interpolation_pattern().unwrap();

        assert_eq!(interpolate_string("nginx:${TAG}", &env, &pattern), "nginx:1.0.0");
        assert_eq!(interpolate_string("nginx:$TAG", &env, &pattern), "nginx:1.0.0");
        assert_eq!(interpolate_string("${MISSING:-3.9}", &env, &pattern), "3.9");
        assert_eq!(interpolate_string("${MISSING}", &env, &pattern), "");
        assert_eq!(interpolate_string("cost: $$5", &env, &pattern), "cost: $5");
    }

    #[test]
    fn test_interpolate_config() {
        let mut config = ComposeParser::parse_str(
            r#"
services:
  web:
    image: "nginx:${TAG:-stable}"
"#,
        )
        .unwrap();

        ComposeParser::interpolate(&mut config, &HashMap::new()).unwrap();
        assert_eq!(config.services["web"].image.as_deref(), Some("nginx:stable"));
    }

    #[test]
    fn test_parse_files_merges_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("docker-compose.yml");
        let overlay = dir.path().join("docker-compose.override.yml");
        std::fs::write(
            &base,
            "services:\n  web:\n    image: nginx\n    tty: true\n  db:\n    image: postgres\n",
        )
        .unwrap();
        std::fs::write(&overlay, "services:\n  web:\n    image: nginx:alpine\n").unwrap();

        let config = ComposeParser::parse_files(&[base.as_path(), overlay.as_path()]).unwrap();
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services["web"].image.as_deref(), Some("nginx:alpine"));
        assert!(config.services["web"].tty);
    }

    #[test]
    fn test_load_project_resolves_build_contexts() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("docker-compose.yml");
        std::fs::write(
            &file,
            "name: shop\nservices:\n  web:\n    build: ./web\n  git:\n    build: https://github.com/example/app.git\n",
        )
        .unwrap();

        let project = ComposeParser::load_project(&[file.as_path()], None, &HashMap::new()).unwrap();
        assert_eq!(project.name, "shop");

        let root = std::fs::canonicalize(dir.path()).unwrap();
        let expected = root.join("web").display().to_string();
        assert_eq!(project.services["web"].build_context(), Some(expected.as_str()));
        assert_eq!(
            project.services["git"].build_context(),
            Some("https://github.com/example/app.git")
        );
    }

    #[test]
    fn test_find_compose_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ComposeParser::find_compose_file(dir.path()).is_none());

        std::fs::write(dir.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        let found = ComposeParser::find_compose_file(dir.path()).unwrap();
        assert!(found.ends_with("docker-compose.yml"));
    }
}
