//! Multi-architecture image builds through `docker buildx`

use crate::config::{DOCKER_NAMESPACE, REPOSITORY_PREFIX};
use crate::docker::DockerCli;
use crate::error::{OpsError, Result};
use crate::ui;
use tokio::process::Command;
use tracing::debug;

/// Name of the buildx builder instance the bootstrapper provisions.
pub const BUILDER_NAME: &str = "multi-platform-builder";

/// Platforms every stack image is built for.
pub const PLATFORMS: &str = "linux/amd64,linux/arm64";

/// Services the bootstrapper builds, with build contexts in the sibling
/// directories `../<service>`.
pub const STACK_SERVICES: [&str; 3] = ["backend", "git-server", "log-streamer"];

/// Make sure the multi-platform builder exists and is selected.
pub fn ensure_builder(docker: &dyn DockerCli) -> Result<()> {
    let listing = docker
        .run(&["buildx", "ls"])?
        .require_success("docker buildx ls")?;

    if listing.stdout.contains(BUILDER_NAME) {
        ui::success("Multi-platform builder already exists");
    } else {
        docker
            .run(&[
                "buildx",
                "create",
                "--name",
                BUILDER_NAME,
                "--driver",
                "docker-container",
                "--bootstrap",
            ])?
            .require_success("docker buildx create")?;
        ui::success("Created new multi-platform builder");
    }

    docker
        .run(&["buildx", "use", BUILDER_NAME])?
        .require_success("docker buildx use")?;
    ui::success("Multi-platform builder is ready");
    Ok(())
}

/// Build and push every stack image for all supported platforms. Output is
/// captured; stderr is shown only when a build fails.
pub async fn build_stack_images(version: &str) -> Result<()> {
    for service in STACK_SERVICES {
        let image = format!("{}/{}{}", DOCKER_NAMESPACE, REPOSITORY_PREFIX, service);
        let context = format!("../{}", service);
        debug!(service, %image, "building multi-arch image");

        let output = Command::new("docker")
            .arg("buildx")
            .arg("build")
            .arg("--platform")
            .arg(PLATFORMS)
            .arg("-t")
            .arg(format!("{}:latest", image))
            .arg("-t")
            .arg(format!("{}:{}", image, version))
            .arg("--push")
            .arg(&context)
            .output()
            .await?;

        if !output.status.success() {
            ui::failure(&format!("Failed to build {}", service));
            eprint!("{}", String::from_utf8_lossy(&output.stderr));
            return Err(OpsError::CommandFailed {
                command: format!("docker buildx build {}", context),
                code: output.status.code().unwrap_or(-1),
            });
        }

        ui::success(&format!("Built and pushed {} for {}", image, PLATFORMS));
    }
    Ok(())
}
