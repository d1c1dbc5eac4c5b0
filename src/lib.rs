//! dcs-ops - Operator tooling for the DotCodeSchool stack
//!
//! Two binaries share this library:
//!
//! - `dcs-build-images` ensures Docker Hub repositories exist, then
//!   builds and pushes each selected service image with streamed,
//!   color-classified output
//! - `dcs-setup` collects configuration, resolves host ports, renders
//!   the compose file, builds multi-architecture images, starts the
//!   stack and probes every service's health

pub mod compose;
pub mod config;
pub mod docker;
pub mod error;
pub mod health;
pub mod image;
pub mod ports;
pub mod registry;
pub mod ui;

pub use error::{OpsError, Result};
