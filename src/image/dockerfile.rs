//! Dockerfile inspection
//!
//! Only the parts of a Dockerfile the translation needs are modelled: the
//! base images of every stage, build arguments that feed them and exposed
//! ports. Every other instruction is kept verbatim.

use crate::error::{OsComposeError, Result};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Build recipe file name
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// A Dockerfile instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// FROM instruction - base image of a stage
    From {
        image: String,
        alias: Option<String>,
    },
    /// ARG instruction - build argument
    Arg {
        name: String,
        default: Option<String>,
    },
    /// EXPOSE instruction - exposed ports, `PORT[/PROTOCOL]`
    Expose { ports: Vec<String> },
    /// Anything else
    Other { keyword: String, args: String },
}

/// A parsed Dockerfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dockerfile {
    /// Where the file was read from
    pub path: PathBuf,
    /// Instructions in declaration order
    pub instructions: Vec<Instruction>,
}

/// Build recipe handed out by a [`BuildInspector`]
pub type Recipe = Dockerfile;

impl Dockerfile {
    /// Read and parse a Dockerfile
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Parse Dockerfile content
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let mut instructions = Vec::new();
        let mut continued_line = String::new();
        let mut args: HashMap<String, String> = HashMap::new();
        let mut seen_from = false;

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(line_without_backslash) = line.strip_suffix('\\') {
                continued_line.push_str(line_without_backslash);
                continued_line.push(' ');
                continue;
            }

            let full_line = if !continued_line.is_empty() {
                let result = format!("{}{}", continued_line, line);
                continued_line.clear();
                result
            } else {
                line.to_string()
            };

            let instruction = match parse_instruction(&full_line, line_num + 1)? {
                Instruction::From { image, alias } => {
                    seen_from = true;
                    Instruction::From {
                        image: substitute_args(&image, &args)?,
                        alias,
                    }
                }
                Instruction::Arg { name, default } => {
                    // only arguments declared before the first stage apply to FROM
                    if !seen_from {
                        if let Some(value) = &default {
                            args.insert(name.clone(), value.clone());
                        }
                    }
                    Instruction::Arg { name, default }
                }
                other => other,
            };
            instructions.push(instruction);
        }

        // a trailing backslash on the last line still ends the instruction
        if !continued_line.trim().is_empty() {
            instructions.push(parse_instruction(continued_line.trim(), content.lines().count())?);
        }

        Ok(Self {
            path: path.into(),
            instructions,
        })
    }

    /// Base image of every stage, in order
    pub fn base_images(&self) -> Vec<&str> {
        self.instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::From { image, .. } => Some(image.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Base image of the final stage
    pub fn last_base_image(&self) -> Option<&str> {
        self.base_images().last().copied()
    }

    /// Ports exposed by the final stage
    pub fn exposed_ports(&self) -> Vec<&str> {
        let start = self
            .instructions
            .iter()
            .rposition(|i| matches!(i, Instruction::From { .. }))
            .unwrap_or(0);
        self.instructions[start..]
            .iter()
            .flat_map(|i| match i {
                Instruction::Expose { ports } => ports.iter().map(String::as_str).collect(),
                _ => Vec::new(),
            })
            .collect()
    }
}

fn parse_instruction(line: &str, line_num: usize) -> Result<Instruction> {
    let (keyword, args) = match line.split_once(char::is_whitespace) {
        Some((keyword, args)) => (keyword, args.trim()),
        None => (line, ""),
    };
    let keyword = keyword.to_uppercase();

    match keyword.as_str() {
        "FROM" => parse_from(args, line_num),
        "ARG" => Ok(parse_arg(args)),
        "EXPOSE" => Ok(Instruction::Expose {
            ports: args.split_whitespace().map(str::to_string).collect(),
        }),
        _ => Ok(Instruction::Other {
            keyword,
            args: args.to_string(),
        }),
    }
}

fn parse_from(args: &str, line_num: usize) -> Result<Instruction> {
    let parts: Vec<&str> = args
        .split_whitespace()
        .filter(|p| !p.starts_with("--"))
        .collect();
    let image = parts.first().ok_or_else(|| OsComposeError::DockerfileParse {
        line: line_num,
        message: "FROM requires an image".to_string(),
    })?;

    let alias = if parts.len() >= 3 && parts[1].eq_ignore_ascii_case("AS") {
        Some(parts[2].to_string())
    } else {
        None
    };

    Ok(Instruction::From {
        image: image.to_string(),
        alias,
    })
}

fn parse_arg(args: &str) -> Instruction {
    match args.split_once('=') {
        Some((name, default)) => Instruction::Arg {
            name: name.trim().to_string(),
            default: Some(default.trim().trim_matches('"').to_string()),
        },
        None => Instruction::Arg {
            name: args.trim().to_string(),
            default: None,
        },
    }
}

fn substitute_args(image: &str, args: &HashMap<String, String>) -> Result<String> {
    if !image.contains('$') {
        return Ok(image.to_string());
    }
    let pattern = Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .map_err(|e| OsComposeError::Internal(e.to_string()))?;
    Ok(pattern
        .replace_all(image, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            args.get(name).cloned().unwrap_or_default()
        })
        .into_owned())
}

/// Locates and reads build recipes
pub trait BuildInspector {
    /// Recipe in the build context at `path`, `None` when there is none
    fn inspect(&self, path: &Path) -> Result<Option<Recipe>>;

    /// Base image of the final build stage
    fn last_base_image(&self, recipe: &Recipe) -> Option<String>;

    /// Ports the final build stage exposes
    fn exposed_ports(&self, recipe: &Recipe) -> Vec<String> {
        recipe.exposed_ports().into_iter().map(str::to_string).collect()
    }
}

/// Reads `Dockerfile` from a build context directory
#[derive(Debug, Clone)]
pub struct DockerfileInspector {
    file_name: String,
}

impl DockerfileInspector {
    /// Create an inspector looking for `Dockerfile`
    pub fn new() -> Self {
        Self {
            file_name: DOCKERFILE_NAME.to_string(),
        }
    }

    /// Look for a differently named recipe file
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = name.to_string();
        self
    }
}

impl Default for DockerfileInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildInspector for DockerfileInspector {
    fn inspect(&self, path: &Path) -> Result<Option<Recipe>> {
        let file = path.join(&self.file_name);
        if !file.is_file() {
            debug!("No {} in {}", self.file_name, path.display());
            return Ok(None);
        }
        let dockerfile = Dockerfile::load(&file)?;
        debug!(
            "Parsed {} with {} instructions",
            file.display(),
            dockerfile.instructions.len()
        );
        Ok(Some(dockerfile))
    }

    fn last_base_image(&self, recipe: &Recipe) -> Option<String> {
        recipe
            .last_base_image()
            .filter(|image| !image.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_dockerfile() {
        let content = r#"
FROM ubuntu:22.04

RUN apt-get update && apt-get install -y curl

WORKDIR /app
EXPOSE 8080 9090/udp

CMD ["./start.sh"]
"#;

        let parsed = Dockerfile::parse("Dockerfile", content).unwrap();
        assert_eq!(parsed.instructions.len(), 5);
        assert_eq!(parsed.last_base_image(), Some("ubuntu:22.04"));
        assert_eq!(parsed.exposed_ports(), vec!["8080", "9090/udp"]);
    }

    #[test]
    fn test_parse_multistage_build() {
        let content = r#"
FROM rust:1.70 AS builder
WORKDIR /app
EXPOSE 1234
RUN cargo build \
    --release

FROM --platform=linux/amd64 debian:bookworm-slim
COPY --from=builder /app/target/release/myapp /usr/local/bin/
CMD ["myapp"]
"#;

        let parsed = Dockerfile::parse("Dockerfile", content).unwrap();
        assert_eq!(parsed.base_images(), vec!["rust:1.70", "debian:bookworm-slim"]);
        assert_eq!(parsed.last_base_image(), Some("debian:bookworm-slim"));
        assert!(parsed.exposed_ports().is_empty());
        assert!(parsed.instructions.contains(&Instruction::Other {
            keyword: "RUN".to_string(),
            args: "cargo build  --release".to_string(),
        }));
    }

    #[test]
    fn test_arg_before_from_is_substituted() {
        let content = "ARG VERSION=3.12\nARG VARIANT\nFROM python:${VERSION}$VARIANT\nARG VERSION=4\n";
        let parsed = Dockerfile::parse("Dockerfile", content).unwrap();
        assert_eq!(parsed.last_base_image(), Some("python:3.12"));
    }

    #[test]
    fn test_no_from_is_not_an_error() {
        let parsed = Dockerfile::parse("Dockerfile", "# nothing here\nRUN true\n").unwrap();
        assert_eq!(parsed.last_base_image(), None);
    }

    #[test]
    fn test_from_without_image() {
        let err = Dockerfile::parse("Dockerfile", "FROM\n").unwrap_err();
        assert!(matches!(err, OsComposeError::DockerfileParse { line: 1, .. }));
    }

    #[test]
    fn test_inspector_reads_context_directory() {
        let dir = tempfile::tempdir().unwrap();
        let inspector = DockerfileInspector::new();
        assert!(inspector.inspect(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join("Dockerfile"), "FROM node:20\n").unwrap();
        let recipe = inspector.inspect(dir.path()).unwrap().unwrap();
        assert_eq!(recipe.path, dir.path().join("Dockerfile"));
        assert_eq!(inspector.last_base_image(&recipe), Some("node:20".to_string()));
    }

    #[test]
    fn test_inspector_custom_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Containerfile"), "FROM alpine\n").unwrap();
        let inspector = DockerfileInspector::new().file_name("Containerfile");
        assert!(inspector.inspect(dir.path()).unwrap().is_some());
    }
}
