//! Local tool presence checks with remediation hints

use crate::docker::DockerCli;
use crate::error::{OpsError, Result};
use crate::ui;

/// Verify the `docker` binary itself responds.
pub fn ensure_docker(docker: &dyn DockerCli) -> Result<()> {
    match docker.run(&["--version"]) {
        Ok(output) if output.success() => {
            ui::success("Docker is installed");
            Ok(())
        }
        _ => Err(OpsError::MissingPrerequisite {
            tool: "docker".to_string(),
            hint: "Install it from https://docs.docker.com/get-docker/".to_string(),
        }),
    }
}

/// Verify the compose plugin is available.
pub fn ensure_compose(docker: &dyn DockerCli) -> Result<()> {
    match docker.run(&["compose", "version"]) {
        Ok(output) if output.success() => {
            ui::success("Docker Compose is available");
            Ok(())
        }
        _ => Err(OpsError::MissingPrerequisite {
            tool: "docker compose".to_string(),
            hint: "Install Docker Desktop or the Compose plugin".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::testkit::{ok, ScriptedDocker};

    #[test]
    fn test_ensure_docker_passes_when_version_responds() {
        let docker = ScriptedDocker::new().respond("--version", ok("Docker version 27.0.3"));
        assert!(ensure_docker(&docker).is_ok());
    }

    #[test]
    fn test_ensure_docker_hints_at_install_page() {
        let docker = ScriptedDocker::new();
        let error = ensure_docker(&docker).unwrap_err();
        assert!(error.to_string().contains("docs.docker.com/get-docker"));
    }

    #[test]
    fn test_ensure_compose_requires_plugin() {
        let docker = ScriptedDocker::new().respond("--version", ok("Docker version 27.0.3"));
        let error = ensure_compose(&docker).unwrap_err();
        assert!(error.to_string().contains("Compose plugin"));
    }

    #[test]
    fn test_ensure_compose_passes_when_plugin_responds() {
        let docker =
            ScriptedDocker::new().respond("compose version", ok("Docker Compose version v2.29.1"));
        assert!(ensure_compose(&docker).is_ok());
    }
}
