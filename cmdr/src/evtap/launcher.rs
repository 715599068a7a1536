// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{CLIArg, EventPrinter, OutputFormat, SignalWatcher, ui_str};
use sbc_input::{CancellationToken, CloseReason, Dispatcher, InputCoreConfig, RecvError,
                SubscriptionHandle, TracingConfig, WriterConfig,
                tracing_config_options::DEFAULT_LOG_FILE_NAME,
                try_initialize_logging_global};
use std::io::Write;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: u8 = 0;
    pub const INVALID_INVOCATION: u8 = 1;
    pub const RUNTIME_FAILURE: u8 = 2;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub printed: u64,
    pub close_reason: CloseReason,
}

/// Install file logging when `--enable-logging` is passed. Stdout carries the events,
/// so logs never go to the display.
pub fn init_logging(cli_arg: &CLIArg) {
    let options = &cli_arg.global_options;
    if !options.enable_logging {
        return;
    }
    let config = TracingConfig {
        writer_config: WriterConfig::File(DEFAULT_LOG_FILE_NAME.to_string()),
        level_filter: options.log_level,
    };
    try_initialize_logging_global(config).ok();
    // % is Display, ? is Debug.
    tracing::debug!(message = "Start logging...", cli_arg = ?cli_arg);
}

/// Build the configuration, run, and map the outcome onto an [`exit_code`]. An
/// unreadable or invalid `--config` file is an invalid invocation.
pub async fn launch(cli_arg: &CLIArg) -> u8 {
    let config = match cli_arg.try_build_config() {
        Ok(config) => config,
        Err(report) => {
            tracing::error!(message = "Invalid configuration", error = ?report);
            eprintln!("{}", ui_str::invalid_config_msg(&report));
            return exit_code::INVALID_INVOCATION;
        }
    };

    match run_evtap(cli_arg, config).await {
        Ok(summary) => {
            tracing::debug!(message = "evtap finished", summary = ?summary);
            exit_code::SUCCESS
        }
        Err(report) => {
            // % is Display, ? is Debug.
            tracing::error!(
                message = "Could not run evtap due to the following problem",
                error = ?report
            );
            eprintln!("{}", ui_str::unrecoverable_error_msg(&report));
            exit_code::RUNTIME_FAILURE
        }
    }
}

/// Open every device, print events until a signal (or a shutdown) ends the run, then
/// stop the dispatcher thread.
///
/// # Errors
///
/// Returns an error if the core can't start, the dispatcher stops on an internal
/// error, or stdout can't keep up (the subscription overflowed under the `disconnect`
/// policy, or a write failed).
pub async fn run_evtap(
    cli_arg: &CLIArg,
    config: InputCoreConfig,
) -> miette::Result<RunSummary> {
    let mut dispatcher = Dispatcher::new(config)?;
    let subscription =
        dispatcher.subscribe(cli_arg.subscription_filter(), cli_arg.subscribe_options());

    let report = dispatcher.open_all();
    for error in &report.failed {
        eprintln!("{}", ui_str::open_failure_msg(error));
    }
    eprintln!("{}", ui_str::open_all_summary_msg(&report));

    let cancellation = CancellationToken::new();
    let signal_watcher = SignalWatcher::try_start(cancellation.clone())?;
    let dispatcher_thread = dispatcher.spawn(cancellation.clone())?;

    let format = OutputFormat::from_json_flag(cli_arg.output_options.json);
    let mut printer = EventPrinter::new(std::io::stdout(), format);
    let printing = print_until_closed(&subscription, &mut printer).await;

    // Stops the dispatcher if printing ended first.
    cancellation.cancel();
    let joined = dispatcher_thread.join();
    signal_watcher.stop();

    let close_reason = printing?;
    joined?;
    tracing::debug!(
        message = "Stop logging...",
        printed = printer.printed(),
        reason = ?close_reason
    );

    if close_reason == CloseReason::Overflow {
        miette::bail!(
            "evtap fell behind and its subscription overflowed (stats: {:?})",
            subscription.stats()
        );
    }

    Ok(RunSummary {
        printed: printer.printed(),
        close_reason,
    })
}

async fn print_until_closed<W: Write>(
    subscription: &SubscriptionHandle,
    printer: &mut EventPrinter<W>,
) -> miette::Result<CloseReason> {
    loop {
        match subscription.recv().await {
            Ok(event) => printer.print(&event)?,
            Err(RecvError::Closed(reason)) => return Ok(reason),
            // `recv()` waits, so neither of these can happen.
            Err(err @ (RecvError::Empty | RecvError::Timeout)) => {
                miette::bail!("evtap: unexpected receive error: {err}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use sbc_input::try_create_temp_dir;

    fn parse(args: &[&str]) -> CLIArg {
        CLIArg::try_parse_from(std::iter::once("evtap").chain(args.iter().copied()))
            .unwrap()
    }

    #[tokio::test]
    async fn unreadable_config_file_is_an_invalid_invocation() {
        let cli_arg = parse(&["--config", "/nonexistent/evtap.json"]);
        assert_eq!(launch(&cli_arg).await, exit_code::INVALID_INVOCATION);
    }

    #[tokio::test]
    async fn malformed_config_file_is_an_invalid_invocation() {
        let temp_dir = try_create_temp_dir().unwrap();
        let path = temp_dir.join("evtap.json");
        std::fs::write(&path, "{ \"registry\": ").unwrap();
        let path = path.display().to_string();
        let cli_arg = parse(&["--config", &path]);
        assert_eq!(launch(&cli_arg).await, exit_code::INVALID_INVOCATION);
    }
}
