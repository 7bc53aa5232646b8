//! Image handling
//!
//! Image references and the build recipes (Dockerfiles) that produce images.

pub mod dockerfile;
pub mod reference;

pub use dockerfile::{BuildInspector, Dockerfile, DockerfileInspector, Instruction, Recipe};
pub use reference::ImageReference;
