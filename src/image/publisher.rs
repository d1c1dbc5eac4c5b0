//! Build-and-push pipeline for a single service image

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::info;

use crate::config::ServiceBuildSpec;
use crate::error::{OpsError, Result};
use crate::ui::{self, LineClass};

/// Build the image for `spec` and push it to Docker Hub.
///
/// The Dockerfile is checked before any process is spawned so a bad
/// `--path` fails immediately instead of after a long build.
pub async fn publish_service(spec: &ServiceBuildSpec, tag: &str) -> Result<()> {
    let dockerfile = spec.dockerfile();
    if !dockerfile.is_file() {
        return Err(OpsError::MissingDockerfile(dockerfile));
    }

    let image = spec.image(tag);
    info!(image, context = %spec.context.display(), "building image");

    ui::heading(&format!("Building {}...", spec.name));
    let mut build = Command::new("docker");
    build
        .arg("build")
        .arg("-t")
        .arg(&image)
        .arg("-f")
        .arg(&dockerfile)
        .arg(&spec.context);
    run_streamed(build, "docker build", ui::classify_build_line).await?;

    ui::heading(&format!("Pushing {}...", spec.name));
    let mut push = Command::new("docker");
    push.arg("push").arg(&image);
    run_streamed(push, "docker push", ui::classify_push_line).await?;

    ui::success(&format!("Successfully built and pushed {}!", spec.name));
    Ok(())
}

/// Run a docker subcommand, painting each stdout line by its class and
/// relaying stderr as it arrives. Both pipes are drained concurrently so
/// neither side can fill and stall the child.
async fn run_streamed(
    mut command: Command,
    label: &str,
    classify: fn(&str) -> LineClass,
) -> Result<()> {
    command.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = command.spawn()?;

    let stderr_task = child.stderr.take().map(|stderr| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                ui::print_stderr_line(&line);
            }
        })
    });

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            ui::print_line(&line, classify(&line));
        }
    }

    let status = child.wait().await?;
    if let Some(task) = stderr_task {
        let _ = task.await;
    }

    if !status.success() {
        ui::failure(&format!("{} failed", label));
        return Err(OpsError::CommandFailed {
            command: label.to_string(),
            code: status.code().unwrap_or(-1),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_dockerfile_fails_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ServiceBuildSpec::new("backend", dir.path());

        let error = publish_service(&spec, "latest").await.unwrap_err();

        match error {
            OpsError::MissingDockerfile(path) => {
                assert_eq!(path, dir.path().join("Dockerfile"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
