//! Post-start health probing
//!
//! Once the stack is up, each service is probed until it answers or a
//! deadline passes. Probes report outcomes; they never abort the run.
//! The wait between attempts starts short and doubles up to a cap, so a
//! fast service is confirmed quickly and a slow one still gets time.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::compose::ComposeRuntime;
use crate::config::StackConfig;
use crate::docker::CommandOutput;
use crate::ports::StackPorts;
use crate::ui;

/// Health endpoint the git server exposes on the host.
pub const GIT_SERVER_HEALTH_URL: &str = "http://localhost:80/api/v0/health";

/// Log line the streamer emits once it accepts connections.
const LOG_STREAMER_READY: &str = "started";

/// Retry pacing for one probe.
#[derive(Debug, Clone, Copy)]
pub struct ProbeSettings {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub deadline: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            deadline: Duration::from_secs(60),
        }
    }
}

/// Result of probing one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub service: String,
    pub healthy: bool,
}

impl ProbeOutcome {
    fn healthy(service: &str) -> Self {
        Self {
            service: service.to_string(),
            healthy: true,
        }
    }

    fn unhealthy(service: &str) -> Self {
        Self {
            service: service.to_string(),
            healthy: false,
        }
    }
}

/// Probes every stack service after `docker compose up`.
pub struct StackProber<'a> {
    runtime: &'a ComposeRuntime<'a>,
    client: reqwest::Client,
    settings: ProbeSettings,
}

impl<'a> StackProber<'a> {
    pub fn new(runtime: &'a ComposeRuntime<'a>) -> Self {
        Self::with_settings(runtime, ProbeSettings::default())
    }

    pub fn with_settings(runtime: &'a ComposeRuntime<'a>, settings: ProbeSettings) -> Self {
        Self {
            runtime,
            client: reqwest::Client::new(),
            settings,
        }
    }

    /// Probe every service in a fixed order. Failures are reported, not
    /// fatal; the caller decides what the summary looks like.
    pub async fn probe_all(&self, config: &StackConfig, ports: &StackPorts) -> Vec<ProbeOutcome> {
        vec![
            self.probe_backend(config, ports).await,
            self.probe_git_server().await,
            self.probe_log_streamer().await,
            self.probe_redis(&config.redis_password).await,
            self.probe_mongodb().await,
        ]
    }

    pub async fn probe_backend(&self, config: &StackConfig, ports: &StackPorts) -> ProbeOutcome {
        ui::info("Testing backend...");
        let url = format!("http://localhost:{}/health", ports.backend);
        if self.poll_http(&url).await {
            ui::success("Backend is running locally");
            self.check_backend_domain(&config.backend_domain).await;
            return ProbeOutcome::healthy("backend");
        }

        ui::failure("Backend is not responding locally");
        self.dump_logs("backend", "backend");
        ProbeOutcome::unhealthy("backend")
    }

    /// One-shot reachability check through the public domain. Outcome is
    /// informational; local health already decided the probe result.
    async fn check_backend_domain(&self, domain: &str) {
        ui::info("Testing domain configuration...");
        let url = format!("https://{}/health", domain);
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                ui::success("Domain configuration is working");
            }
            _ => {
                ui::failure("Domain configuration is not working");
                ui::warn("This might be due to:");
                ui::warn("1. DNS not configured for the domain");
                ui::warn("2. SSL/TLS not set up");
                ui::warn("3. Caddy reverse proxy not configured correctly");
            }
        }
    }

    pub async fn probe_git_server(&self) -> ProbeOutcome {
        ui::info("Testing git-server...");
        if self.poll_http(GIT_SERVER_HEALTH_URL).await {
            ui::success("Git server is running");
            return ProbeOutcome::healthy("git-server");
        }

        ui::failure("Git server is not responding");
        ui::warn("Checking git-server logs...");
        match self.runtime.logs("git-server") {
            Ok(output) => {
                ui::dim_block(&output.stdout);
                if output.stdout.contains("could not get certificate from issuer") {
                    ui::warn("Note: SSL certificate errors are expected in local development.");
                    ui::warn("The git server is running but cannot obtain SSL certificates.");
                    ui::warn("This is normal and won't affect local development.");
                }
            }
            Err(_) => ui::failure("Could not fetch git-server logs"),
        }
        ProbeOutcome::unhealthy("git-server")
    }

    pub async fn probe_log_streamer(&self) -> ProbeOutcome {
        ui::info("Testing log-streamer...");
        let ready = self
            .poll_stdout(|| self.runtime.logs("log-streamer"), LOG_STREAMER_READY)
            .await;
        if ready {
            ui::success("Log streamer is running");
            return ProbeOutcome::healthy("log-streamer");
        }

        ui::failure("Log streamer is not responding");
        match self.runtime.logs("log-streamer") {
            Ok(output) => {
                ui::warn("Log streamer output:");
                ui::dim_block(&output.stdout);
            }
            Err(_) => ui::failure("Could not fetch log-streamer logs"),
        }
        ProbeOutcome::unhealthy("log-streamer")
    }

    pub async fn probe_redis(&self, password: &str) -> ProbeOutcome {
        ui::info("Testing Redis...");
        let replied = self
            .poll_stdout(|| self.runtime.redis_ping(password), "PONG")
            .await;
        if replied {
            ui::success("Redis is running");
            return ProbeOutcome::healthy("redis");
        }

        ui::failure("Redis is not responding");
        self.dump_logs("Redis", "redis");
        ProbeOutcome::unhealthy("redis")
    }

    pub async fn probe_mongodb(&self) -> ProbeOutcome {
        ui::info("Testing MongoDB...");
        let running = self.poll_stdout(|| self.runtime.ps("mongodb"), "Up").await;
        if running {
            ui::success("MongoDB is running");
            return ProbeOutcome::healthy("mongodb");
        }

        ui::failure("MongoDB is not running");
        self.dump_logs("MongoDB", "mongodb");
        ProbeOutcome::unhealthy("mongodb")
    }

    /// GET `url` until a success status or the deadline.
    async fn poll_http(&self, url: &str) -> bool {
        let start = Instant::now();
        let mut delay = self.settings.initial_delay;
        loop {
            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return true,
                Ok(response) => {
                    debug!(url, status = %response.status(), "probe attempt failed")
                }
                Err(error) => debug!(url, %error, "probe attempt failed"),
            }

            if start.elapsed() >= self.settings.deadline {
                return false;
            }
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(self.settings.max_delay);
        }
    }

    /// Re-run a captured command until its stdout contains `needle` or
    /// the deadline passes.
    async fn poll_stdout<F>(&self, mut fetch: F, needle: &str) -> bool
    where
        F: FnMut() -> std::io::Result<CommandOutput>,
    {
        let start = Instant::now();
        let mut delay = self.settings.initial_delay;
        loop {
            if let Ok(output) = fetch() {
                if output.success() && output.stdout.contains(needle) {
                    return true;
                }
            }

            if start.elapsed() >= self.settings.deadline {
                return false;
            }
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(self.settings.max_delay);
        }
    }

    fn dump_logs(&self, label: &str, service: &str) {
        ui::warn(&format!("Checking {} logs...", label));
        match self.runtime.logs(service) {
            Ok(output) => ui::dim_block(&output.stdout),
            Err(_) => ui::failure(&format!("Could not fetch {} logs", label)),
        }
    }
}
