//! Host port selection for the local stack
//!
//! Each published service wants a well-known default port. Before the
//! compose file is rendered, every default is checked against the host:
//! a port held by a previous run of the same service is kept, anything
//! else is resolved automatically or through the operator.

use std::net::TcpListener;

use tracing::{debug, warn};

use crate::config::COMPOSE_FILE;
use crate::docker::DockerCli;
use crate::error::{OpsError, Result};
use crate::ui::{self, prompts};

/// Upper bound of the TCP port range; the automatic probe never wraps.
pub const MAX_PORT: u16 = 65535;

pub const DEFAULT_LOG_STREAMER_PORT: u16 = 8080;
pub const DEFAULT_BACKEND_PORT: u16 = 3000;
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_MONGODB_PORT: u16 = 27017;

/// One resolved service port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortAssignment {
    pub service: String,
    pub requested: u16,
    pub resolved: u16,
}

impl PortAssignment {
    pub fn reassigned(&self) -> bool {
        self.requested != self.resolved
    }
}

/// Host ports for every published service, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackPorts {
    pub log_streamer: u16,
    pub backend: u16,
    pub redis: u16,
    pub mongodb: u16,
}

impl Default for StackPorts {
    fn default() -> Self {
        Self {
            log_streamer: DEFAULT_LOG_STREAMER_PORT,
            backend: DEFAULT_BACKEND_PORT,
            redis: DEFAULT_REDIS_PORT,
            mongodb: DEFAULT_MONGODB_PORT,
        }
    }
}

/// Operator decision for a port held by an unrelated process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortChoice {
    Auto,
    Custom,
    Abort,
}

/// A port is free when a listener can be bound to it right now.
pub fn port_is_free(port: u16) -> bool {
    TcpListener::bind(("0.0.0.0", port)).is_ok()
}

/// First free port at or above `start`, skipping ports already handed to
/// other services in this run.
pub fn find_free_port(start: u16, taken: &[u16]) -> Result<u16> {
    let mut port = start;
    loop {
        if !taken.contains(&port) && port_is_free(port) {
            return Ok(port);
        }
        if port == MAX_PORT {
            return Err(OpsError::PortsExhausted { start });
        }
        port += 1;
    }
}

/// True when the process on `port` is a prior instance of `service`
/// from our own compose stack. Any failure to inspect the stack counts
/// as "not ours".
fn occupied_by_own_service(docker: &dyn DockerCli, service: &str, port: u16) -> bool {
    match docker.run(&["compose", "-f", COMPOSE_FILE, "ps", service]) {
        Ok(output) if output.success() => output.stdout.contains(&format!(":{}->", port)),
        _ => false,
    }
}

/// Resolve one service's host port. `taken` holds ports already assigned
/// to earlier services in this run; the same port is never handed out
/// twice.
pub fn resolve_port(
    docker: &dyn DockerCli,
    service: &str,
    default: u16,
    interactive: bool,
    taken: &[u16],
) -> Result<PortAssignment> {
    let assignment = |resolved: u16| PortAssignment {
        service: service.to_string(),
        requested: default,
        resolved,
    };

    if !taken.contains(&default) && port_is_free(default) {
        return Ok(assignment(default));
    }

    if occupied_by_own_service(docker, service, default) {
        ui::info(&format!(
            "Port {} is already in use by our {} service",
            default, service
        ));
        return Ok(assignment(default));
    }

    ui::warn(&format!(
        "Port {} is already in use by another service",
        default
    ));

    if !interactive {
        warn!(service, port = default, "port conflict, reassigning automatically");
        let port = find_free_port(default, taken)?;
        ui::success(&format!("Using port {} for {}", port, service));
        return Ok(assignment(port));
    }

    match prompts::conflict_choice()? {
        PortChoice::Auto => {
            let port = find_free_port(default, taken)?;
            ui::success(&format!("Using port {} for {}", port, service));
            Ok(assignment(port))
        }
        PortChoice::Custom => Ok(assignment(prompts::custom_port(service, taken)?)),
        PortChoice::Abort => Err(OpsError::Cancelled),
    }
}

/// Resolve every stack port in a fixed order. Earlier assignments are
/// treated as taken by later ones.
pub fn resolve_stack_ports(docker: &dyn DockerCli, interactive: bool) -> Result<StackPorts> {
    let defaults = [
        ("log-streamer", DEFAULT_LOG_STREAMER_PORT),
        ("backend", DEFAULT_BACKEND_PORT),
        ("redis", DEFAULT_REDIS_PORT),
        ("mongodb", DEFAULT_MONGODB_PORT),
    ];

    let mut taken = Vec::new();
    let mut resolved = Vec::new();
    for (service, default) in defaults {
        let assignment = resolve_port(docker, service, default, interactive, &taken)?;
        debug!(
            service = assignment.service,
            requested = assignment.requested,
            resolved = assignment.resolved,
            "port assigned"
        );
        taken.push(assignment.resolved);
        resolved.push(assignment);
    }

    Ok(StackPorts {
        log_streamer: resolved[0].resolved,
        backend: resolved[1].resolved,
        redis: resolved[2].resolved,
        mongodb: resolved[3].resolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::testkit::{ok, ScriptedDocker};

    fn free_port() -> u16 {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_free_default_is_kept() {
        let docker = ScriptedDocker::new();
        let port = free_port();

        let assignment = resolve_port(&docker, "backend", port, false, &[]).unwrap();

        assert_eq!(assignment.resolved, port);
        assert!(!assignment.reassigned());
        assert!(docker.calls().is_empty());
    }

    #[test]
    fn test_port_held_by_own_service_is_kept() {
        let listener = TcpListener::bind(("0.0.0.0", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let docker = ScriptedDocker::new().respond(
            "compose -f test-compose.yml ps backend",
            ok(&format!("backend  running  0.0.0.0:{}->8080/tcp", port)),
        );

        let assignment = resolve_port(&docker, "backend", port, false, &[]).unwrap();

        assert_eq!(assignment.resolved, port);
        assert!(!assignment.reassigned());
    }

    #[test]
    fn test_unrelated_conflict_reassigns_forward_without_prompting() {
        let listener = TcpListener::bind(("0.0.0.0", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let docker = ScriptedDocker::new();

        let assignment = resolve_port(&docker, "redis", port, false, &[]).unwrap();

        assert!(assignment.resolved > port);
        assert!(assignment.reassigned());
        assert!(port_is_free(assignment.resolved));
    }

    #[test]
    fn test_taken_ports_are_never_reused() {
        let start = free_port();
        let taken = [start];

        let found = find_free_port(start, &taken).unwrap();

        assert_ne!(found, start);
        assert!(found > start);
    }

    #[test]
    fn test_probe_fails_at_range_end() {
        let taken = [MAX_PORT];
        // Every port from here up is either taken or likely bindable, so
        // pin the scan to the very top of the range.
        let error = match find_free_port(MAX_PORT, &taken) {
            Err(error) => error,
            Ok(port) => panic!("expected exhaustion, got port {}", port),
        };

        assert!(error.to_string().contains("65535"));
    }
}
