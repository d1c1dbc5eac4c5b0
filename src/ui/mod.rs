//! Terminal presentation
//!
//! All user-facing styling lives here: status glyphs, classified build
//! output, and the summary blocks both binaries print. Classification
//! never drives control flow; exit codes do.

pub mod prompts;

use dialoguer::console::style;

use crate::config::{StackConfig, COMPOSE_FILE};

/// Presentation class for one line of subprocess output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Step,
    Progress,
    Success,
    CacheHit,
    Other,
}

/// Classes for `docker build` stdout, first match wins.
pub fn classify_build_line(line: &str) -> LineClass {
    if line.contains("Step") {
        LineClass::Step
    } else if line.contains("Pulling") {
        LineClass::Progress
    } else if line.contains("Successfully") {
        LineClass::Success
    } else if line.contains("Using cache") {
        LineClass::CacheHit
    } else {
        LineClass::Other
    }
}

/// Classes for `docker push` stdout, first match wins.
pub fn classify_push_line(line: &str) -> LineClass {
    if line.contains("Pushing") {
        LineClass::Step
    } else if line.contains("Pushed") {
        LineClass::Success
    } else if line.contains("Layer") {
        LineClass::Progress
    } else if line.contains("Preparing") {
        LineClass::CacheHit
    } else {
        LineClass::Other
    }
}

/// Paint one stdout line by its class. Blank unclassified lines are
/// dropped to keep the stream compact.
pub fn print_line(line: &str, class: LineClass) {
    let styled = match class {
        LineClass::Step => style(line).cyan(),
        LineClass::Progress => style(line).blue(),
        LineClass::Success => style(line).green(),
        LineClass::CacheHit => style(line).magenta(),
        LineClass::Other => {
            if line.trim().is_empty() {
                return;
            }
            style(line).dim()
        }
    };
    println!("{}", styled);
}

/// Stderr is informational for build tools; only lines that mention an
/// error are painted red.
pub fn print_stderr_line(line: &str) {
    if line.to_lowercase().contains("error") {
        eprintln!("{}", style(line).red());
    } else {
        println!("{}", style(line).blue());
    }
}

pub fn heading(title: &str) {
    println!("\n{}\n", style(format!("🚀 {}", title)).blue().bold());
}

pub fn success(message: &str) {
    println!("{}", style(format!("✅ {}", message)).green());
}

pub fn failure(message: &str) {
    eprintln!("{}", style(format!("❌ {}", message)).red());
}

pub fn warn(message: &str) {
    println!("{}", style(format!("⚠️ {}", message)).yellow());
}

pub fn info(message: &str) {
    println!("{}", style(format!("ℹ️ {}", message)).cyan());
}

/// Verbatim block of captured output, dimmed.
pub fn dim_block(text: &str) {
    println!("{}", style(text).dim());
}

/// Resolved configuration, shown before anything is written.
pub fn config_summary(config: &StackConfig) {
    heading("Configuration Summary");
    println!("{}", style("Here's what we're going to set up:\n").bold());
    println!(
        "  {} Backend Domain:    {}",
        style("🖥️").dim(),
        style(&config.backend_domain).green()
    );
    println!(
        "  {} Git Server Domain: {}",
        style("🖥️").dim(),
        style(&config.git_domain).green()
    );
    println!(
        "  {} Redis Password:     {}",
        style("🔑").dim(),
        style(&config.redis_password).green()
    );
    if let Some(username) = &config.redis_username {
        println!(
            "  {} Redis Username:     {}",
            style("🔑").dim(),
            style(username).green()
        );
    }
    if let Some(url) = &config.test_runner_url {
        println!(
            "  {} Test Runner URL:    {}",
            style("🔗").dim(),
            style(url).green()
        );
    }
}

/// Closing summary once every probe has reported.
pub fn stack_summary(all_healthy: bool) {
    heading("Setup Complete");
    if all_healthy {
        success("All services have been set up successfully!");
    } else {
        warn("Some services may not be running properly. Please check the logs above.");
    }
}

pub fn useful_commands() {
    println!();
    println!("{}", style("Useful Commands").blue().bold());
    println!(
        "  {} View logs:    {}",
        style("ℹ️").dim(),
        style(format!("docker compose -f {} logs -f", COMPOSE_FILE)).green()
    );
    println!(
        "  {} Stop services: {}",
        style("ℹ️").dim(),
        style(format!("docker compose -f {} down", COMPOSE_FILE)).green()
    );
}

/// Shell profile the export suggestions should target.
pub fn profile_for_shell(shell: Option<&str>) -> &'static str {
    match shell {
        Some(shell) if shell.contains("zsh") => "~/.zshrc",
        _ => "~/.bashrc",
    }
}

fn shell_profile() -> &'static str {
    let shell = std::env::var("SHELL").ok();
    profile_for_shell(shell.as_deref())
}

/// Print `export` lines the operator can append to their profile. The
/// suggestions are printed, never executed, and nothing is written to
/// this process's environment.
pub fn export_suggestions(pairs: &[(&str, &str)]) {
    let profile = shell_profile();
    println!();
    println!(
        "{}",
        style("ℹ️ To save this configuration for future use, run:").dim()
    );
    for (key, value) in pairs {
        println!(
            "  {} echo 'export {}={}' >> {}",
            style("⚙️").dim(),
            key,
            value,
            profile
        );
    }
}

/// Suggestion block for persisting the registry token after a prompted
/// run. Printed only; the token stays in memory.
pub fn token_save_hint(token: &str) {
    let export = format!("export DOCKER_TOKEN={}", token);
    info("Add this line to your shell configuration file:");
    println!("{}", style(&export).yellow());
    info("Or run this command to add it to your current session:");
    println!(
        "{}",
        style(format!("echo '{}' >> {}", export, shell_profile())).yellow()
    );
}
