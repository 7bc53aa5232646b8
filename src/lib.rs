//! oscompose - translate docker-compose projects into OpenShift objects
//!
//! A compose project is turned into build configurations, image streams,
//! deployment configurations and services:
//!
//! - Services sharing volumes are deployed together
//! - Services with a build context get a Docker build from their source repository
//! - Compose runtime settings are carried over to containers
//! - Fields that cannot be translated are reported as warnings

pub mod compose;
pub mod config;
pub mod emit;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod platform;
pub mod scm;
pub mod transform;

pub use error::{OsComposeError, Result};
pub use transform::{Transformation, Transformer};
