//! oscompose - translate docker-compose projects into OpenShift objects
//!
//! This is the main CLI entry point for oscompose.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use oscompose::compose::config::ComposeConfig;
use oscompose::compose::parser::project_dir;
use oscompose::compose::{ComposeParser, Project};
use oscompose::config::Settings;
use oscompose::emit::{Document, OutputFormat};
use oscompose::Transformer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// oscompose - docker-compose to OpenShift translator
#[derive(Parser)]
#[command(name = "oscompose")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Translate docker-compose projects into OpenShift objects", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a compose project into a list of OpenShift objects
    Convert {
        /// Compose file; repeat to merge several files
        #[arg(short, long)]
        file: Vec<PathBuf>,
        /// Directory build contexts may live under; repeatable
        #[arg(long)]
        base: Vec<PathBuf>,
        /// Output format (yaml or json)
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Project name
        #[arg(long)]
        name: Option<String>,
    },

    /// Check that a compose project can be converted
    Check {
        /// Compose file; repeat to merge several files
        #[arg(short, long)]
        file: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the document
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::discover(cli.config.as_deref()).context("failed to load settings")?;

    match cli.command {
        Commands::Convert {
            file,
            base,
            format,
            output,
            name,
        } => {
            let files = compose_files(file)?;
            let name = name.or_else(|| settings.project_name.clone());
            let project = load_project(&files, name.as_deref())?;
            let bases = if base.is_empty() {
                settings.bases_for(&project_dir(&files[0]))
            } else {
                base.iter()
                    .map(|b| std::fs::canonicalize(b).unwrap_or_else(|_| b.clone()))
                    .collect()
            };

            let result = Transformer::new(bases)
                .transform(&project)
                .with_context(|| format!("failed to convert project {}", project.name))?;
            for line in result.warnings.lines() {
                tracing::warn!("{}", line);
            }

            let format = format.unwrap_or(settings.format);
            let rendered = Document::new(result.objects, &result.warnings).render(format)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!("Wrote {}", path.display());
                }
                None => print!("{}", rendered),
            }
        }

        Commands::Check { file } => {
            let files = compose_files(file)?;
            let project = load_project(&files, settings.project_name.as_deref())?;

            let config = ComposeConfig {
                name: Some(project.name.clone()),
                services: project.services.clone(),
                ..Default::default()
            };
            for finding in ComposeParser::validate(&config)? {
                println!("warning: {}", finding);
            }

            let bases = settings.bases_for(&project_dir(&files[0]));
            let result = Transformer::new(bases)
                .transform(&project)
                .with_context(|| format!("project {} cannot be converted", project.name))?;
            for line in result.warnings.lines() {
                println!("warning: {}", line);
            }
            println!(
                "{}: {} services, {} objects",
                project.name,
                project.services.len(),
                result.objects.len()
            );
        }
    }

    Ok(())
}

/// Compose files given on the command line, or the default one in the
/// current directory
fn compose_files(files: Vec<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
    if !files.is_empty() {
        return Ok(files);
    }
    let working_dir = std::env::current_dir()?;
    match ComposeParser::find_compose_file(&working_dir) {
        Some(file) => Ok(vec![file]),
        None => bail!("no compose file found in {}", working_dir.display()),
    }
}

fn load_project(files: &[PathBuf], name: Option<&str>) -> anyhow::Result<Project> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let paths: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
    ComposeParser::load_project(&paths, name, &env).context("failed to load compose project")
}
