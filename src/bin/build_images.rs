//! Builds and pushes service images to Docker Hub
//!
//! This is the CLI entry point for dcs-build-images: it resolves the
//! Hub token and the set of services, makes sure each repository exists
//! on the Hub, then builds and pushes each image with streamed output.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use dcs_ops::config::{PublishPlan, ServiceBuildSpec, DOCKER_NAMESPACE, VERSION};
use dcs_ops::docker::prereq::ensure_docker;
use dcs_ops::docker::SystemDocker;
use dcs_ops::image::publish_service;
use dcs_ops::registry::{HubClient, RepoStatus};
use dcs_ops::ui::{self, prompts};
use dcs_ops::{OpsError, Result};
use tracing_subscriber::EnvFilter;

/// Build and push DotCodeSchool service images
#[derive(Parser)]
#[command(name = "dotcodeschool-build-images")]
#[command(author = "DotCodeSchool")]
#[command(version = concat!("v", env!("CARGO_PKG_VERSION")))]
#[command(about = "Build and push service images to Docker Hub", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Show version number
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Service name (can be used multiple times)
    #[arg(short = 's', long = "service")]
    service: Vec<String>,

    /// Path to service directory (must follow --service)
    #[arg(short = 'p', long = "path")]
    path: Vec<PathBuf>,

    /// Docker Hub token
    #[arg(short = 't', long = "token")]
    token: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(error) = run(cli).await {
        eprintln!();
        ui::failure(&format!("Error: {}", error));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    ui::heading("Docker Build and Push Tool");

    let docker = SystemDocker;
    ensure_docker(&docker)?;

    let token = resolve_token(cli.token)?;
    let services = resolve_services(cli.service, cli.path)?;
    let plan = PublishPlan { token, services };

    let hub = HubClient::new(DOCKER_NAMESPACE, &plan.token);
    for spec in &plan.services {
        let repository = spec.repository();
        ui::info(&format!("Checking repository {}...", repository));
        match hub.ensure_repository(&repository).await? {
            RepoStatus::AlreadyExists => {
                ui::success(&format!("Repository {} exists.", repository))
            }
            RepoStatus::Created => ui::success(&format!("Repository {} created!", repository)),
        }

        publish_service(spec, VERSION).await?;
    }

    println!();
    ui::success("All selected images have been built and pushed successfully!");
    Ok(())
}

/// Token resolution order: flag, then environment, then a prompt. The
/// token stays in this process; persisting it is only ever suggested.
fn resolve_token(flag: Option<String>) -> Result<String> {
    if let Some(token) = flag.filter(|token| !token.is_empty()) {
        return Ok(token);
    }

    if let Ok(token) = std::env::var("DOCKER_TOKEN") {
        if !token.is_empty() {
            return Ok(token);
        }
    }

    ui::warn("Docker Hub token not found in environment variables");
    let token = prompts::hub_token()?;
    if prompts::confirm("Would you like to save this token to your environment?", false)? {
        ui::token_save_hint(&token);
    }
    Ok(token)
}

/// Pair up repeated `--service`/`--path` flags, or fall back to the
/// interactive collection flow when no services were given. A path
/// without a service to attach to is rejected; a service without a
/// path builds from `./<name>`.
fn resolve_services(names: Vec<String>, paths: Vec<PathBuf>) -> Result<Vec<ServiceBuildSpec>> {
    if names.is_empty() {
        if !paths.is_empty() {
            return Err(OpsError::InvalidService(
                "--path must follow a --service flag".to_string(),
            ));
        }
        return prompts::collect_services();
    }

    if paths.len() > names.len() {
        return Err(OpsError::InvalidService(
            "more --path flags than --service flags".to_string(),
        ));
    }

    let mut specs = Vec::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        let context = match paths.get(index) {
            Some(path) => path.clone(),
            None => PathBuf::from(format!("./{}", name)),
        };
        specs.push(ServiceBuildSpec::new(name, context));
    }
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_services_pair_with_paths_in_order() {
        let specs = resolve_services(
            vec!["backend".to_string(), "git-server".to_string()],
            vec![PathBuf::from("/srv/backend"), PathBuf::from("/srv/git")],
        )
        .unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "backend");
        assert_eq!(specs[0].context, PathBuf::from("/srv/backend"));
        assert_eq!(specs[1].name, "git-server");
        assert_eq!(specs[1].context, PathBuf::from("/srv/git"));
    }

    #[test]
    fn test_missing_path_defaults_to_service_directory() {
        let specs = resolve_services(vec!["backend".to_string()], Vec::new()).unwrap();
        assert_eq!(specs[0].context, PathBuf::from("./backend"));
    }

    #[test]
    fn test_path_without_service_is_rejected() {
        let error =
            resolve_services(Vec::new(), vec![PathBuf::from("/srv/backend")]).unwrap_err();
        assert!(error.to_string().contains("--service"));
    }

    #[test]
    fn test_more_paths_than_services_is_rejected() {
        let error = resolve_services(
            vec!["backend".to_string()],
            vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")],
        )
        .unwrap_err();
        assert!(error.to_string().contains("--path"));
    }

    #[test]
    fn test_token_flag_wins_without_prompting() {
        let token = resolve_token(Some("hub-token".to_string())).unwrap();
        assert_eq!(token, "hub-token");
    }

    #[test]
    fn test_repeatable_flags_parse() {
        let cli = Cli::try_parse_from([
            "dotcodeschool-build-images",
            "-s",
            "backend",
            "-p",
            "/srv/backend",
            "-s",
            "git-server",
            "-t",
            "hub-token",
        ])
        .unwrap();

        assert_eq!(cli.service, vec!["backend", "git-server"]);
        assert_eq!(cli.path, vec![PathBuf::from("/srv/backend")]);
        assert_eq!(cli.token.as_deref(), Some("hub-token"));
    }
}
