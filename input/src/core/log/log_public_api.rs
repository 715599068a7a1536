// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{DisplayPreference, TracingConfig, WriterConfig};
use crate::ok;
use std::ops::Add;
use tracing::dispatcher;

/// Instead of taking lots of arguments, [`try_initialize_logging_global()`] and
/// [`try_initialize_logging_thread_local()`] receive anything that implements
/// [`Into<TracingConfig>`]:
///
/// ```no_run
/// use sbc_input::{
///     DisplayPreference, TracingConfig, WriterConfig, try_initialize_logging_global,
/// };
///
/// let level: TracingConfig = tracing::Level::INFO.into();
/// let display: TracingConfig = DisplayPreference::Stderr.into();
/// let file: TracingConfig = WriterConfig::File("evtap.log".to_string()).into();
///
/// try_initialize_logging_global(level + display + file).unwrap();
/// ```
pub mod tracing_config_options {
    use super::*;

    pub const DEFAULT_LOG_FILE_NAME: &str = "log.txt";

    impl From<tracing::Level> for TracingConfig {
        fn from(level: tracing::Level) -> Self {
            Self {
                level_filter: level.into(),
                writer_config: WriterConfig::None,
            }
        }
    }

    impl From<tracing_core::LevelFilter> for TracingConfig {
        fn from(level_filter: tracing_core::LevelFilter) -> Self {
            Self {
                level_filter,
                writer_config: WriterConfig::None,
            }
        }
    }

    impl From<DisplayPreference> for TracingConfig {
        fn from(preferred_display: DisplayPreference) -> Self {
            Self {
                level_filter: tracing_core::LevelFilter::OFF,
                writer_config: WriterConfig::Display(preferred_display),
            }
        }
    }

    impl From<WriterConfig> for TracingConfig {
        fn from(writer_config: WriterConfig) -> Self {
            Self {
                level_filter: tracing_core::LevelFilter::OFF,
                writer_config,
            }
        }
    }

    /// Merge two [`TracingConfig`] instances. The more verbose level wins, and the
    /// writer configs are merged with [`WriterConfig`]'s `Add` impl.
    impl Add<TracingConfig> for TracingConfig {
        type Output = Self;

        fn add(self, rhs: Self) -> Self::Output {
            Self {
                level_filter: self.level_filter.max(rhs.level_filter),
                writer_config: self.writer_config + rhs.writer_config,
            }
        }
    }

    /// Merge two [`WriterConfig`] instances. The `rhs` has higher specificity, so it
    /// clobbers whatever `self` holds for the same slot (display or file).
    impl Add<WriterConfig> for WriterConfig {
        type Output = Self;

        fn add(self, rhs: WriterConfig) -> Self::Output {
            use WriterConfig::{Display, DisplayAndFile, File, None};

            match (self, rhs) {
                (None, wc_rhs) => wc_rhs,
                (wc_lhs, None) => wc_lhs,
                (Display(dp_lhs), File(f_rhs)) => DisplayAndFile(dp_lhs, f_rhs),
                (File(f_lhs), Display(dp_rhs)) => DisplayAndFile(dp_rhs, f_lhs),
                (Display(_), Display(dp_rhs)) => Display(dp_rhs),
                (File(_), File(f_rhs)) => File(f_rhs),
                (Display(_) | File(_), DisplayAndFile(dp_rhs, f_rhs)) => {
                    DisplayAndFile(dp_rhs, f_rhs)
                }
                (DisplayAndFile(_, f_lhs), Display(dp_rhs)) => DisplayAndFile(dp_rhs, f_lhs),
                (DisplayAndFile(dp_lhs, _), File(f_rhs)) => DisplayAndFile(dp_lhs, f_rhs),
                (DisplayAndFile(..), DisplayAndFile(dp_rhs, f_rhs)) => {
                    DisplayAndFile(dp_rhs, f_rhs)
                }
            }
        }
    }
}

/// Install logging for the whole process. Does nothing when the level is `OFF`.
///
/// # Errors
///
/// See [`TracingConfig::install_global()`].
pub fn try_initialize_logging_global(
    options: impl Into<TracingConfig>,
) -> miette::Result<()> {
    let it: TracingConfig = options.into();

    if matches!(it.get_level_filter(), tracing_core::LevelFilter::OFF) {
        return ok!();
    }

    it.install_global()
}

/// Install logging for the current thread. Returns `None` when the level is `OFF`.
///
/// # Errors
///
/// See [`TracingConfig::install_thread_local()`].
pub fn try_initialize_logging_thread_local(
    options: impl Into<TracingConfig>,
) -> miette::Result<Option<dispatcher::DefaultGuard>> {
    let it: TracingConfig = options.into();

    if matches!(it.get_level_filter(), tracing_core::LevelFilter::OFF) {
        return Ok(None);
    }

    it.install_thread_local().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::try_create_temp_dir;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use tracing_core::LevelFilter;

    #[test]
    fn test_add_writer_configs() {
        let fname = "log.txt".to_string();
        let stdout = WriterConfig::Display(DisplayPreference::Stdout);
        let stderr = WriterConfig::Display(DisplayPreference::Stderr);
        let file = WriterConfig::File(fname.clone());
        let stdout_and_file =
            WriterConfig::DisplayAndFile(DisplayPreference::Stdout, fname.clone());
        let stderr_and_file =
            WriterConfig::DisplayAndFile(DisplayPreference::Stderr, fname.clone());

        assert_eq!(WriterConfig::None + file.clone(), file);
        assert_eq!(file.clone() + WriterConfig::None, file);
        assert_eq!(stdout.clone() + file.clone(), stdout_and_file);
        assert_eq!(file.clone() + stderr.clone(), stderr_and_file);
        assert_eq!(stdout.clone() + stderr.clone(), stderr);
        assert_eq!(stderr_and_file.clone() + stdout.clone(), stdout_and_file);
        assert_eq!(
            stdout_and_file.clone() + WriterConfig::File("other.txt".into()),
            WriterConfig::DisplayAndFile(DisplayPreference::Stdout, "other.txt".into())
        );
    }

    #[test]
    fn test_compose_level_and_display() {
        let config: TracingConfig =
            TracingConfig::from(LevelFilter::INFO) + DisplayPreference::Stderr.into();
        assert_eq!(config.level_filter, LevelFilter::INFO);
        assert_eq!(
            config.writer_config,
            WriterConfig::Display(DisplayPreference::Stderr)
        );
    }

    #[test]
    fn test_level_off_installs_nothing() {
        let config: TracingConfig = LevelFilter::OFF.into();
        assert!(try_initialize_logging_thread_local(config).unwrap().is_none());
    }

    #[test]
    #[serial]
    fn test_global_install_succeeds_only_once() {
        let dir = try_create_temp_dir().unwrap();
        let file_path = dir.join("global.log").to_str().unwrap().to_string();
        let config = TracingConfig {
            writer_config: WriterConfig::File(file_path),
            level_filter: LevelFilter::WARN,
        };

        assert!(try_initialize_logging_global(config.clone()).is_ok());
        assert!(try_initialize_logging_global(config).is_err());
    }
}
