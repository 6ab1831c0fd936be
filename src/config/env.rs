//! # Environment Variable Utilities
//!
//! Helpers for reading environment variables with common type conversions.
//! Used by [`RuntimeConfig`](crate::config::app::RuntimeConfig) and
//! [`ProcessOptions::with_env_overrides`](crate::config::options::ProcessOptions::with_env_overrides).
//!
//! The `*_from` variants take a provider closure so that callers and tests
//! can substitute the environment.
//!
//! # Examples
//! ```rust,no_run
//! use image_process::config::env::{read_flag, read_u32};
//!
//! let verbose = read_flag("IMG_PROCESS_VERBOSE", false);
//! let concurrency = read_u32("IMG_PROCESS_MAX_CONCURRENCY", 8);
//! ```

/// Enables verbose step logging when truthy.
pub const VERBOSE_VAR: &str = "IMG_PROCESS_VERBOSE";
/// Overrides the pipeline concurrency cap.
pub const MAX_CONCURRENCY_VAR: &str = "IMG_PROCESS_MAX_CONCURRENCY";

/// Truthy spellings accepted for flags, compared case-insensitively after
/// surrounding quotes are removed.
const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];

/// Reads a boolean flag from an environment variable.
///
/// Returns `true` for `1`, `true`, `yes` or `on` (any case, quotes ignored);
/// any other value is `false`.
pub fn read_flag(name: &str, default: bool) -> bool {
    read_flag_from(|k| std::env::var(k).ok(), name, default)
}

/// Reads a boolean flag using a custom provider function.
///
/// # Example
/// ```rust
/// use image_process::config::env::read_flag_from;
///
/// let val = read_flag_from(|_| Some("true".into()), "IMG_PROCESS_VERBOSE", false);
/// assert!(val);
/// ```
pub fn read_flag_from<F>(provider: F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    provider(name).map_or(default, |raw| is_truthy(&raw))
}

fn is_truthy(raw: &str) -> bool {
    let value = raw.trim().trim_matches(['"', '\'']);
    TRUTHY.iter().any(|t| value.eq_ignore_ascii_case(t))
}

/// Reads a `u32` from an environment variable, returning `default` when the
/// variable is missing or unparsable.
pub fn read_u32(name: &str, default: u32) -> u32 {
    read_u32_from(|k| std::env::var(k).ok(), name, default)
}

/// Reads a `u32` using a custom provider function.
///
/// # Example
/// ```rust
/// use image_process::config::env::read_u32_from;
///
/// assert_eq!(read_u32_from(|_| Some(" 4 ".into()), "N", 8), 4);
/// assert_eq!(read_u32_from(|_| None, "N", 8), 8);
/// ```
pub fn read_u32_from<F>(provider: F, name: &str, default: u32) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    provider(name)
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

/// Like [`read_u32_from`] but distinguishes "unset or invalid" as `None`.
pub fn read_opt_u32_from<F>(provider: F, name: &str) -> Option<u32>
where
    F: Fn(&str) -> Option<String>,
{
    provider(name).and_then(|s| s.trim().parse::<u32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(name: &'static str, value: &'static str) -> impl Fn(&str) -> Option<String> {
        move |k: &str| (k == name).then(|| value.to_string())
    }

    #[test]
    fn verbose_flag_accepts_truthy_spellings() {
        for value in ["1", "true", "TRUE", "yes", "On", " on ", "\"true\"", "'yes'"] {
            assert!(
                read_flag_from(only(VERBOSE_VAR, value), VERBOSE_VAR, false),
                "{VERBOSE_VAR}={value:?}"
            );
        }
    }

    #[test]
    fn verbose_flag_rejects_everything_else() {
        for value in ["0", "false", "off", "enabled", ""] {
            assert!(
                !read_flag_from(only(VERBOSE_VAR, value), VERBOSE_VAR, true),
                "{VERBOSE_VAR}={value:?}"
            );
        }
    }

    #[test]
    fn unset_verbose_flag_keeps_default() {
        let other = only(MAX_CONCURRENCY_VAR, "1");
        assert!(read_flag_from(&other, VERBOSE_VAR, true));
        assert!(!read_flag_from(&other, VERBOSE_VAR, false));
    }

    #[test]
    fn concurrency_override_parses_trimmed_numbers() {
        assert_eq!(read_u32_from(only(MAX_CONCURRENCY_VAR, " 16 "), MAX_CONCURRENCY_VAR, 8), 16);
        assert_eq!(
            read_opt_u32_from(only(MAX_CONCURRENCY_VAR, "2"), MAX_CONCURRENCY_VAR),
            Some(2)
        );
    }

    #[test]
    fn invalid_concurrency_override_is_ignored() {
        for value in ["many", "-4", "2.5", ""] {
            let provider = only(MAX_CONCURRENCY_VAR, value);
            assert_eq!(read_u32_from(&provider, MAX_CONCURRENCY_VAR, 8), 8, "{value:?}");
            assert_eq!(read_opt_u32_from(&provider, MAX_CONCURRENCY_VAR), None, "{value:?}");
        }
        assert_eq!(read_opt_u32_from(|_| None, MAX_CONCURRENCY_VAR), None);
    }

    #[test]
    fn process_environment_is_read() {
        temp_env::with_vars(
            [(VERBOSE_VAR, Some("on")), (MAX_CONCURRENCY_VAR, Some("3"))],
            || {
                assert!(read_flag(VERBOSE_VAR, false));
                assert_eq!(read_u32(MAX_CONCURRENCY_VAR, 8), 3);
            },
        );
    }
}
