//! Driving `docker compose` against the rendered file

use tokio::process::Command;

use crate::config::COMPOSE_FILE;
use crate::docker::{CommandOutput, DockerCli};
use crate::error::{OpsError, Result};

/// Handle for compose operations on the stack file. Inspection calls go
/// through the injected CLI seam; `up` inherits the terminal so compose
/// renders its own progress.
pub struct ComposeRuntime<'a> {
    docker: &'a dyn DockerCli,
    file: String,
}

impl<'a> ComposeRuntime<'a> {
    pub fn new(docker: &'a dyn DockerCli) -> Self {
        Self {
            docker,
            file: COMPOSE_FILE.to_string(),
        }
    }

    /// Start every service detached.
    pub async fn up(&self) -> Result<()> {
        let status = Command::new("docker")
            .args(["compose", "-f", &self.file, "up", "-d"])
            .status()
            .await?;

        if !status.success() {
            return Err(OpsError::CommandFailed {
                command: "docker compose up".to_string(),
                code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }

    /// Process listing for one service.
    pub fn ps(&self, service: &str) -> std::io::Result<CommandOutput> {
        self.docker.run(&["compose", "-f", &self.file, "ps", service])
    }

    /// Captured logs for one service.
    pub fn logs(&self, service: &str) -> std::io::Result<CommandOutput> {
        self.docker.run(&["compose", "-f", &self.file, "logs", service])
    }

    /// PING against the stack's Redis through `redis-cli` inside the
    /// container. `-T` keeps exec away from TTY allocation so the reply
    /// can be captured.
    pub fn redis_ping(&self, password: &str) -> std::io::Result<CommandOutput> {
        self.docker.run(&[
            "compose", "-f", &self.file, "exec", "-T", "redis", "redis-cli", "-a", password,
            "ping",
        ])
    }
}
