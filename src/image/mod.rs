//! Image building and publishing
//!
//! Builds a service's Docker image from its build context and pushes it
//! to Docker Hub, streaming classified output as it goes.

pub mod publisher;

pub use publisher::publish_service;
