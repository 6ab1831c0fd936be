//! # Verbose Logging
//!
//! Step-by-step diagnostics (chosen ratios, computed coordinates, skipped
//! files) are opt-in through the `verboseLogging` option. Instead of a
//! process-wide logger, a [`VerboseLogger`] value is built from the options
//! and handed to every component that logs.
//!
//! Events are emitted through `tracing`; installing a subscriber is left to
//! the embedding application.
//!
//! # Example
//! ```rust
//! use image_process::{log::VerboseLogger, verbose};
//!
//! let logger = VerboseLogger::new(true);
//! verbose!(logger, ratio = 0.5, "watermark resize");
//! ```

/// Gate for opt-in diagnostic events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerboseLogger {
    enabled: bool,
}

impl VerboseLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Emits an `info` event through `tracing` when the given [`VerboseLogger`]
/// is enabled. Accepts the same field/message syntax as `tracing::info!`.
#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        if $logger.is_enabled() {
            $crate::tracing::info!($($arg)+);
        }
    };
}
