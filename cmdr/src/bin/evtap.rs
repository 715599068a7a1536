// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! For more information on how to use CLAP, here are some resources:
//! 1. [Tutorial](https://developerlife.com/2023/09/17/tuify-clap/)
//! 2. [Video](https://youtu.be/lzMYDA6St0s)

use clap::Parser;
use sbc_input_cmdr::{CLIArg, REPORT_FOOTER, exit_code, init_logging, launch,
                     setup_default_miette_global_report_handler};
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// Note: The `tokio::main` macro internally calls `.expect("Failed building the Runtime")`
// when initializing the Tokio runtime. This is unavoidable and safe, as runtime creation
// failure is a fatal error that should panic. The lint must be suppressed here.
#[tokio::main]
#[allow(clippy::unwrap_in_result)]
async fn main() -> ExitCode {
    let cli_arg = match CLIArg::try_parse() {
        Ok(it) => it,
        Err(error) => {
            // `--help` and `--version` also arrive here, on stdout.
            error.print().ok();
            return if error.use_stderr() {
                ExitCode::from(exit_code::INVALID_INVOCATION)
            } else {
                ExitCode::from(exit_code::SUCCESS)
            };
        }
    };

    setup_default_miette_global_report_handler(REPORT_FOOTER);
    init_logging(&cli_arg);

    ExitCode::from(launch(&cli_arg).await)
}
