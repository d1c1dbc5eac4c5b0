//! Seam over the Docker CLI for captured (non-streaming) invocations

pub mod buildx;
pub mod prereq;

use crate::error::{OpsError, Result};
use std::process::Command;

/// Captured output of a finished CLI invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }

    /// Convert a non-zero exit into the command-failure error.
    pub fn require_success(self, command: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(OpsError::CommandFailed {
                command: command.to_string(),
                code: self.status_code.unwrap_or(-1),
            })
        }
    }
}

/// Interface for `docker` invocations whose output is captured and
/// inspected. Long-running builds stream instead and do not go through
/// here; tests substitute a scripted implementation.
pub trait DockerCli {
    fn run(&self, args: &[&str]) -> std::io::Result<CommandOutput>;
}

/// Runs the real `docker` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDocker;

impl DockerCli for SystemDocker {
    fn run(&self, args: &[&str]) -> std::io::Result<CommandOutput> {
        let output = Command::new("docker").args(args).output()?;
        Ok(CommandOutput {
            status_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testkit {
    use super::{CommandOutput, DockerCli};
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub(crate) fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            status_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub(crate) fn failed(stderr: &str) -> CommandOutput {
        CommandOutput {
            status_code: Some(1),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    /// Scripted stand-in keyed by the space-joined argument list.
    /// Unscripted invocations report exit code 1.
    pub(crate) struct ScriptedDocker {
        responses: HashMap<String, CommandOutput>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedDocker {
        pub(crate) fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn respond(mut self, args: &str, output: CommandOutput) -> Self {
            self.responses.insert(args.to_string(), output);
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DockerCli for ScriptedDocker {
        fn run(&self, args: &[&str]) -> std::io::Result<CommandOutput> {
            let key = args.join(" ");
            self.calls.lock().unwrap().push(key.clone());
            Ok(self
                .responses
                .get(&key)
                .cloned()
                .unwrap_or_else(|| failed("not scripted")))
        }
    }
}
