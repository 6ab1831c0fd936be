//! Configuration: user options, watermark normalization and environment overrides.

pub mod app;
pub mod env;
pub mod options;
pub mod watermark;
