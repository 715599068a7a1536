// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Global [`miette`] report handler for `evtap`. The hook is evaluated lazily, when a
//! [`miette::Report`] is created, so terminal width detection only happens if an error
//! is actually reported.

use miette::MietteHandlerOpts;

/// Shown under every report.
pub const REPORT_FOOTER: &str = "Run evtap with --enable-logging and check log.txt.";

/// Install the graphical report handler. Does nothing if a hook (or the default
/// handler) is already in place.
pub fn setup_default_miette_global_report_handler(footer: &'static str) {
    miette::set_hook(Box::new(|_report| {
        Box::new(
            MietteHandlerOpts::new()
                .wrap_lines(true)
                .force_graphical(true)
                .rgb_colors(miette::RgbColors::Always)
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .with_cause_chain()
                .footer(footer.to_string())
                .build(),
        )
    }))
    .ok();
}
