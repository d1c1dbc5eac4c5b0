//! Interactive prompts
//!
//! Every prompt validates in a loop and re-asks with a short notice, so
//! callers always receive a usable value or a prompt error (EOF, broken
//! terminal).

use std::path::Path;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};

use crate::config::{ServiceBuildSpec, BUILD_FILE};
use crate::error::Result;
use crate::ports::{self, PortChoice};
use crate::ui;

/// Free-form input that must be non-empty.
pub fn input_required(prompt: &str) -> Result<String> {
    let theme = ColorfulTheme::default();
    loop {
        let value: String = Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        let value = value.trim().to_string();
        if !value.is_empty() {
            return Ok(value);
        }
        ui::warn("This field is required");
    }
}

/// Input with a visible default; Enter accepts the default.
pub fn input_with_default(prompt: &str, default: &str) -> Result<String> {
    let theme = ColorfulTheme::default();
    let value: String = Input::<String>::with_theme(&theme)
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()?;
    Ok(value.trim().to_string())
}

/// Input where Enter on an empty line means "none".
pub fn input_optional(prompt: &str) -> Result<Option<String>> {
    let theme = ColorfulTheme::default();
    let value: String = Input::<String>::with_theme(&theme)
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim().to_string();
    Ok(if value.is_empty() { None } else { Some(value) })
}

pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    let theme = ColorfulTheme::default();
    Ok(Confirm::with_theme(&theme)
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Hidden prompt for the Docker Hub token.
pub fn hub_token() -> Result<String> {
    let theme = ColorfulTheme::default();
    loop {
        let token = Password::with_theme(&theme)
            .with_prompt("Enter your Docker Hub token")
            .allow_empty_password(true)
            .interact()?;
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
        ui::warn("Docker token cannot be empty");
    }
}

/// Gather services to build one by one, then let the operator pick the
/// subset to actually run.
pub fn collect_services() -> Result<Vec<ServiceBuildSpec>> {
    let theme = ColorfulTheme::default();
    let mut services: Vec<ServiceBuildSpec> = Vec::new();

    loop {
        let name = loop {
            let name: String = Input::<String>::with_theme(&theme)
                .with_prompt("Enter service name (e.g., backend, git-server)")
                .allow_empty(true)
                .interact_text()?;
            let name = name.trim().to_string();
            if name.is_empty() {
                ui::warn("Service name cannot be empty");
            } else if services.iter().any(|spec| spec.name == name) {
                ui::warn("Service name already exists");
            } else {
                break name;
            }
        };

        let context = loop {
            let path: String = Input::<String>::with_theme(&theme)
                .with_prompt("Enter absolute path to service directory")
                .allow_empty(true)
                .interact_text()?;
            let path = path.trim().to_string();
            if path.is_empty() {
                ui::warn("Path cannot be empty");
                continue;
            }
            let candidate = Path::new(&path);
            if !candidate.is_dir() {
                ui::warn("Directory does not exist");
            } else if !candidate.join(BUILD_FILE).is_file() {
                ui::warn("Dockerfile not found in directory");
            } else {
                break path;
            }
        };

        services.push(ServiceBuildSpec::new(name, context));

        if !confirm("Add another service?", false)? {
            break;
        }
    }

    select_services(services)
}

fn select_services(services: Vec<ServiceBuildSpec>) -> Result<Vec<ServiceBuildSpec>> {
    let theme = ColorfulTheme::default();
    let names: Vec<&str> = services.iter().map(|spec| spec.name.as_str()).collect();
    loop {
        let picked = MultiSelect::with_theme(&theme)
            .with_prompt("Select services to build and push")
            .items(&names)
            .interact()?;
        if picked.is_empty() {
            ui::warn("Please select at least one service");
            continue;
        }
        return Ok(picked
            .into_iter()
            .map(|index| services[index].clone())
            .collect());
    }
}

/// Menu shown when a default port is held by an unrelated process.
pub fn conflict_choice() -> Result<PortChoice> {
    let theme = ColorfulTheme::default();
    let items = [
        "Try another port automatically",
        "Specify a custom port",
        "Exit setup",
    ];
    let selection = Select::with_theme(&theme)
        .with_prompt("What would you like to do?")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(match selection {
        0 => PortChoice::Auto,
        1 => PortChoice::Custom,
        _ => PortChoice::Abort,
    })
}

/// Ask for a replacement port until the operator names one that is
/// valid, currently free, and not already assigned in this run.
pub fn custom_port(service: &str, taken: &[u16]) -> Result<u16> {
    let theme = ColorfulTheme::default();
    loop {
        let input: String = Input::<String>::with_theme(&theme)
            .with_prompt(format!("Enter a custom port for {}", service))
            .interact_text()?;
        let port = match input.trim().parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => {
                ui::warn("Please enter a valid port number (1-65535)");
                continue;
            }
        };
        if taken.contains(&port) || !ports::port_is_free(port) {
            ui::warn("This port is already in use");
            continue;
        }
        return Ok(port);
    }
}
