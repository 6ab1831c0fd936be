//! Error types shared by the configuration, compositing and pipeline layers.

pub mod entity;
pub mod process;

pub use entity::NotFoundError;
pub use process::{ProcessError, Result};
