//! DotCodeSchool stack bootstrapper
//!
//! This is the CLI entry point for dcs-setup: it resolves configuration
//! from flags or prompts, renders the compose file, builds the stack
//! images, starts every service, and probes each one for health.

use clap::{ArgAction, Parser};
use dcs_ops::compose::{render_stack, ComposeRuntime};
use dcs_ops::config::{StackConfig, COMPOSE_FILE, DEFAULT_REDIS_PASSWORD, VERSION};
use dcs_ops::docker::buildx::{build_stack_images, ensure_builder};
use dcs_ops::docker::prereq::{ensure_compose, ensure_docker};
use dcs_ops::docker::SystemDocker;
use dcs_ops::health::StackProber;
use dcs_ops::ports::resolve_stack_ports;
use dcs_ops::ui::{self, prompts};
use dcs_ops::{OpsError, Result};
use tracing_subscriber::EnvFilter;

/// Set up the local DotCodeSchool stack
#[derive(Parser)]
#[command(name = "dotcodeschool-setup")]
#[command(author = "DotCodeSchool")]
#[command(version = concat!("v", env!("CARGO_PKG_VERSION")))]
#[command(about = "Configure and launch the local DotCodeSchool stack", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Show version number
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Backend domain
    #[arg(short = 'b', long = "backend-domain")]
    backend_domain: Option<String>,

    /// Git server domain
    #[arg(short = 'g', long = "git-domain")]
    git_domain: Option<String>,

    /// Redis password (default: changeme)
    #[arg(short = 'r', long = "redis-pass")]
    redis_pass: Option<String>,

    /// Redis username (optional)
    #[arg(short = 'u', long = "redis-user")]
    redis_user: Option<String>,

    /// Test runner URL (optional)
    #[arg(short = 't', long = "test-runner")]
    test_runner: Option<String>,
}

impl Cli {
    /// Prompts are skipped only when both domains arrive as flags.
    fn interactive(&self) -> bool {
        self.backend_domain.is_none() || self.git_domain.is_none()
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(error) = run(cli).await {
        eprintln!();
        match error {
            OpsError::Cancelled => ui::failure(&error.to_string()),
            _ => ui::failure(&format!("Error: {}", error)),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let docker = SystemDocker;

    ui::heading("Checking Dependencies");
    ensure_docker(&docker)?;
    ensure_compose(&docker)?;

    let interactive = cli.interactive();
    let config = resolve_config(&cli)?;

    ui::config_summary(&config);
    if interactive && !prompts::confirm("Do you want to proceed with this configuration?", false)? {
        return Err(OpsError::Cancelled);
    }

    std::fs::create_dir_all("logs")?;

    ui::heading("Creating Configuration");
    let ports = resolve_stack_ports(&docker, interactive)?;
    let document = render_stack(&config, &ports);
    std::fs::write(COMPOSE_FILE, document.to_yaml()?)?;
    ui::success("Configuration created");

    ui::heading("Building Multi-Architecture Images");
    ensure_builder(&docker)?;
    build_stack_images(VERSION).await?;

    ui::heading("Starting Services");
    let runtime = ComposeRuntime::new(&docker);
    runtime.up().await?;
    ui::success("Services started");

    ui::heading("Testing Services");
    let prober = StackProber::new(&runtime);
    let outcomes = prober.probe_all(&config, &ports).await;
    let all_healthy = outcomes.iter().all(|outcome| outcome.healthy);

    ui::stack_summary(all_healthy);
    ui::useful_commands();
    print_export_suggestions(&config);

    Ok(())
}

/// Build the stack configuration from flags when both domains were
/// given, otherwise walk the operator through the prompts.
fn resolve_config(cli: &Cli) -> Result<StackConfig> {
    if let (Some(backend_domain), Some(git_domain)) = (&cli.backend_domain, &cli.git_domain) {
        return Ok(StackConfig {
            backend_domain: backend_domain.clone(),
            git_domain: git_domain.clone(),
            redis_password: cli
                .redis_pass
                .clone()
                .unwrap_or_else(|| DEFAULT_REDIS_PASSWORD.to_string()),
            redis_username: cli.redis_user.clone().filter(|user| !user.is_empty()),
            test_runner_url: cli.test_runner.clone().filter(|url| !url.is_empty()),
        });
    }

    ui::heading("Domain Configuration");
    ui::info("Let's start by configuring your domains");
    let backend_domain = prompts::input_required("🖥️ Enter your backend domain")?;
    let git_domain = prompts::input_required("🖥️ Enter your git server domain")?;

    ui::heading("Redis Configuration");
    ui::info("Now, let's set up Redis");
    let redis_password = prompts::input_with_default("🔑 Enter Redis password", DEFAULT_REDIS_PASSWORD)?;
    let redis_username = prompts::input_optional("🔑 Enter Redis username (optional)")?;

    ui::heading("Test Runner Configuration");
    ui::info("Finally, let's configure the test runner");
    let test_runner_url = prompts::input_optional("🔗 Enter test runner URL (optional)")?;

    Ok(StackConfig {
        backend_domain,
        git_domain,
        redis_password,
        redis_username,
        test_runner_url,
    })
}

fn print_export_suggestions(config: &StackConfig) {
    let mut pairs = vec![
        ("BACKEND_DOMAIN", config.backend_domain.as_str()),
        ("GIT_DOMAIN", config.git_domain.as_str()),
        ("REDIS_PASS", config.redis_password.as_str()),
    ];
    if let Some(user) = &config.redis_username {
        pairs.push(("REDIS_USER", user.as_str()));
    }
    if let Some(url) = &config.test_runner_url {
        pairs.push(("TEST_RUNNER_URL", url.as_str()));
    }
    ui::export_suggestions(&pairs);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_both_domains_skip_prompting() {
        let cli = parse(&[
            "dotcodeschool-setup",
            "-b",
            "api.example.com",
            "-g",
            "git.example.com",
        ]);
        assert!(!cli.interactive());

        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.backend_domain, "api.example.com");
        assert_eq!(config.redis_password, DEFAULT_REDIS_PASSWORD);
        assert_eq!(config.redis_username, None);
        assert_eq!(config.test_runner_url, None);
    }

    #[test]
    fn test_missing_domain_flag_means_interactive() {
        let cli = parse(&["dotcodeschool-setup", "-b", "api.example.com"]);
        assert!(cli.interactive());
    }

    #[test]
    fn test_optional_flags_flow_into_config() {
        let cli = parse(&[
            "dotcodeschool-setup",
            "--backend-domain",
            "api.example.com",
            "--git-domain",
            "git.example.com",
            "--redis-pass",
            "hunter2",
            "--redis-user",
            "admin",
            "--test-runner",
            "https://runner.example.com",
        ]);

        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.redis_password, "hunter2");
        assert_eq!(config.redis_username.as_deref(), Some("admin"));
        assert_eq!(
            config.test_runner_url.as_deref(),
            Some("https://runner.example.com")
        );
    }

    #[test]
    fn test_empty_optional_flags_are_dropped() {
        let cli = parse(&[
            "dotcodeschool-setup",
            "-b",
            "api.example.com",
            "-g",
            "git.example.com",
            "-u",
            "",
            "-t",
            "",
        ]);

        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.redis_username, None);
        assert_eq!(config.test_runner_url, None);
    }
}
