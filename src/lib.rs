//! # image_process
//!
//! Batch image processing with watermark compositing.
//!
//! This crate provides:
//! - Option parsing and normalization (`config`)
//! - The raster capability, its `image`-crate backend and the watermark
//!   compositor (`image`)
//! - Per-file processing, concurrent driving and output sinks (`pipeline`)
//! - Opt-in diagnostics through `tracing` (`log`)
//!
//! ## Example usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use image_process::config::options::ProcessOptions;
//! use image_process::pipeline::{dest::LocalDestination, file::SourceFile, runner::Pipeline};
//!
//! # async fn run() -> image_process::error::Result<()> {
//! let settings = ProcessOptions::from_json(
//!     r#"{
//!         "watermark": { "filePath": "logo.png", "position": "southeast", "margin": 20, "maxSize": 10 },
//!         "width": 1600,
//!         "output": "jpeg",
//!         "multipleResize": [320, 800]
//!     }"#,
//! )?;
//! let files = vec![SourceFile::read("photos/a.png")?];
//! Pipeline::with_image_rs(settings)
//!     .run_into(files, Arc::new(LocalDestination::new("dist")))
//!     .await?;
//! # Ok(())
//! # }
//! ```
// ===============================
// Re-exports of external crates
// ===============================

pub use anyhow;
pub use dotenvy;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

// ===============================
// Public modules
// ===============================
pub mod config;
pub mod error;
pub mod image;
pub mod log;
pub mod pipeline;
