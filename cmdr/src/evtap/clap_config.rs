// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use clap::{Args, Parser};
use sbc_input::{DeviceClass, DeviceClassMask, EventKindMask, InputCoreConfig,
                OverflowPolicy, RecordLayout, SubscribeOptions, SubscriptionFilter};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(bin_name = "evtap")]
#[command(about = "Print decoded events from every detected input device")]
#[command(version)]
#[command(next_line_help = true)]
/// More info: <https://docs.rs/clap/latest/clap/struct.Command.html#method.help_template>
#[command(
    help_template = "{about}\nVersion: {bin} {version}\n\nUSAGE:\n  evtap [\x1b[34mOptions\x1b[0m]\n\n{all-args}\n"
)]
/// More info:
/// - <https://docs.rs/clap/latest/clap/_derive/#overview>
pub struct CLIArg {
    #[command(flatten)]
    pub device_options: DeviceOption,

    #[command(flatten)]
    pub output_options: OutputOption,

    #[command(flatten)]
    pub global_options: GlobalOption,
}

#[derive(Debug, Args)]
pub struct DeviceOption {
    #[arg(
        long,
        short = 'c',
        value_name = "FILE",
        help = "Load the input core configuration from a JSON file; the flags below override it"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        short = 'g',
        value_name = "GLOB",
        help = "Device node pattern, eg: `/dev/input/event*`"
    )]
    pub glob: Option<String>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Where the sysfs input class lives, eg: `/sys/class/input`"
    )]
    pub sysfs_root: Option<PathBuf>,

    #[arg(
        long,
        help = "Also open devices that match no class and print their records raw"
    )]
    pub open_unclassified: bool,

    #[arg(
        long,
        help = "Grab each device so no other reader (eg: the console) sees its events"
    )]
    pub grab: bool,

    #[arg(
        long,
        value_name = "LAYOUT",
        help = "Kernel record layout: `timeval32` (16 byte records) or `timeval64` (24 byte records)"
    )]
    pub record_layout: Option<RecordLayout>,
}

#[derive(Debug, Args)]
pub struct OutputOption {
    #[arg(
        long = "class",
        value_name = "CLASS",
        help = "Only print events from this device class; repeat for more (touch, mouse, keyboard, remote, other)"
    )]
    pub classes: Vec<DeviceClass>,

    #[arg(long, help = "Also print a tick when nothing happened for a tick interval")]
    pub ticks: bool,

    #[arg(long, short = 'j', help = "Print one JSON object per line")]
    pub json: bool,

    #[arg(long, value_name = "N", help = "Events buffered before the overflow policy applies")]
    pub queue_capacity: Option<usize>,

    #[arg(
        long,
        value_name = "POLICY",
        help = "What to do when the queue is full: `drop-oldest`, `drop-newest` or `disconnect`"
    )]
    pub overflow: Option<OverflowPolicy>,
}

#[derive(Debug, Args)]
pub struct GlobalOption {
    #[arg(
        global = true,
        long,
        short = 'l',
        help = "Log app output to a file named `log.txt` for debugging"
    )]
    pub enable_logging: bool,

    #[arg(
        global = true,
        long,
        value_name = "LEVEL",
        default_value = "debug",
        help = "Log level when logging is enabled: `error`, `warn`, `info`, `debug` or `trace`"
    )]
    pub log_level: tracing_core::LevelFilter,
}

impl CLIArg {
    /// The configuration file (if any) with the command line overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file can't be read or parsed.
    pub fn try_build_config(&self) -> miette::Result<InputCoreConfig> {
        let config = match &self.device_options.config {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|err| {
                    miette::miette!("Could not read config file `{}`: {err}", path.display())
                })?;
                InputCoreConfig::from_json(&json)?
            }
            None => InputCoreConfig::default(),
        };
        Ok(self.apply_overrides(config))
    }

    fn apply_overrides(&self, mut config: InputCoreConfig) -> InputCoreConfig {
        let device = &self.device_options;
        if let Some(glob) = &device.glob {
            config.registry.device_glob.clone_from(glob);
        }
        if let Some(sysfs_root) = &device.sysfs_root {
            config.registry.sysfs_root.clone_from(sysfs_root);
        }
        if let Some(layout) = device.record_layout {
            config.registry.record_format.layout = layout;
        }
        config.registry.open_unclassified |= device.open_unclassified;
        config.registry.grab_exclusive |= device.grab;

        let output = &self.output_options;
        if let Some(capacity) = output.queue_capacity {
            config.dispatcher.default_queue_capacity = capacity;
        }
        if let Some(policy) = output.overflow {
            config.dispatcher.default_overflow_policy = policy;
        }
        config
    }

    #[must_use]
    pub fn subscription_filter(&self) -> SubscriptionFilter {
        let output = &self.output_options;
        let classes = if output.classes.is_empty() {
            DeviceClassMask::all()
        } else {
            output.classes.iter().copied().collect()
        };
        let filter = SubscriptionFilter::new(classes, EventKindMask::default());
        if output.ticks { filter.with_ticks() } else { filter }
    }

    /// Capacity and policy come from the dispatcher defaults, which already carry the
    /// command line overrides.
    #[must_use]
    pub fn subscribe_options(&self) -> SubscribeOptions { SubscribeOptions::default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> CLIArg {
        CLIArg::try_parse_from(std::iter::once("evtap").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn no_flags_is_a_valid_invocation() {
        let cli_arg = parse(&[]);
        assert_eq!(cli_arg.try_build_config().unwrap(), InputCoreConfig::default());
        assert_eq!(cli_arg.subscription_filter(), SubscriptionFilter::default());
    }

    #[test]
    fn flags_override_the_defaults() {
        let cli_arg = parse(&[
            "--glob",
            "/tmp/input/event*",
            "--record-layout",
            "timeval64",
            "--open-unclassified",
            "--queue-capacity",
            "8",
            "--overflow",
            "disconnect",
        ]);
        let config = cli_arg.try_build_config().unwrap();
        assert_eq!(config.registry.device_glob, "/tmp/input/event*");
        assert_eq!(config.registry.record_format.layout, RecordLayout::Timeval64);
        assert!(config.registry.open_unclassified);
        assert_eq!(config.dispatcher.default_queue_capacity, 8);
        assert_eq!(
            config.dispatcher.default_overflow_policy,
            OverflowPolicy::Disconnect
        );
    }

    #[test]
    fn classes_and_ticks_shape_the_filter() {
        let cli_arg = parse(&["--class", "touch", "--class", "Remote", "--ticks"]);
        let filter = cli_arg.subscription_filter();
        assert_eq!(filter.classes, DeviceClassMask::TOUCH | DeviceClassMask::REMOTE);
        assert!(filter.kinds.contains(EventKindMask::TICK));
    }

    #[test]
    fn unknown_class_is_rejected() {
        let result = CLIArg::try_parse_from(["evtap", "--class", "joystick"]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli_arg = parse(&["--config", "/nonexistent/evtap.json"]);
        assert!(cli_arg.try_build_config().is_err());
    }
}
