//! # Runtime Configuration Loader
//!
//! Environment-level settings that override user options, typically set by
//! CI or a wrapper script rather than by the code that builds the pipeline.
//!
//! `.env` files are loaded first: `DOTENV_FILE` when set, otherwise `.env`
//! in the working directory. Missing files are ignored.
//!
//! # Environment Variables
//! | Variable | Description | Default |
//! |-----------|-------------|----------|
//! | `DOTENV_FILE` | Optional path to a custom dotenv file | *none* |
//! | `IMG_PROCESS_VERBOSE` | Enable verbose step logging | *unset* |
//! | `IMG_PROCESS_MAX_CONCURRENCY` | Files processed at once | *unset* |
//!
//! # Example
//! ```rust,no_run
//! use image_process::config::{app::RuntimeConfig, options::ProcessOptions};
//!
//! let runtime = RuntimeConfig::from_env();
//! let settings = ProcessOptions::default().with_runtime(&runtime).normalize().unwrap();
//! ```

use std::env;

use crate::config::env::{MAX_CONCURRENCY_VAR, VERBOSE_VAR, read_flag_from, read_opt_u32_from};

/// Overrides read from the environment; `None` leaves the option untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub verbose_logging: Option<bool>,
    pub max_concurrency: Option<u32>,
}

impl RuntimeConfig {
    /// Loads `.env` (see module docs) and reads the process environment.
    pub fn from_env() -> Self {
        if let Ok(path) = env::var("DOTENV_FILE") {
            let _ = dotenvy::from_filename(path);
        } else {
            dotenvy::dotenv().ok();
        }

        Self::from_provider(|k| env::var(k).ok())
    }

    /// Reads overrides from a custom provider.
    ///
    /// # Example
    /// ```rust
    /// use image_process::config::app::RuntimeConfig;
    ///
    /// let cfg = RuntimeConfig::from_provider(|k| match k {
    ///     "IMG_PROCESS_VERBOSE" => Some("yes".into()),
    ///     _ => None,
    /// });
    /// assert_eq!(cfg.verbose_logging, Some(true));
    /// assert_eq!(cfg.max_concurrency, None);
    /// ```
    pub fn from_provider<F>(provider: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let verbose_logging =
            provider(VERBOSE_VAR).map(|_| read_flag_from(&provider, VERBOSE_VAR, false));
        let max_concurrency = read_opt_u32_from(&provider, MAX_CONCURRENCY_VAR);

        Self {
            verbose_logging,
            max_concurrency,
        }
    }
}
