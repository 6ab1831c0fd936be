//! File pipeline: per-file processing, concurrent driving and output sinks.

pub mod dest;
pub mod file;
pub mod processor;
pub mod runner;
