//! Compose file rendering and stack control
//!
//! The stack is described by a typed document model, rendered from the
//! operator's configuration and the resolved ports, then driven through
//! `docker compose`.

pub mod document;
pub mod render;
pub mod runtime;

pub use document::ComposeDocument;
pub use render::render_stack;
pub use runtime::ComposeRuntime;
