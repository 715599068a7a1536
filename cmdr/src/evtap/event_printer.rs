// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use chrono::{DateTime, Local};
use miette::IntoDiagnostic;
use sbc_input::{InputEvent, LifecycleEvent};
use std::{io::Write, time::SystemTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line.
    JsonLines,
}

impl OutputFormat {
    #[must_use]
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::JsonLines } else { Self::Text }
    }
}

/// Wall clock time of a tick, in the local time zone.
#[must_use]
pub fn format_tick_time(at: SystemTime) -> String {
    DateTime::<Local>::from(at)
        .format("%H:%M:%S%.3f")
        .to_string()
}

/// Render one event as a single line (no trailing newline).
///
/// # Errors
///
/// Returns an error if the event can't be serialized to JSON.
pub fn format_event(event: &InputEvent, format: OutputFormat) -> miette::Result<String> {
    match format {
        OutputFormat::JsonLines => serde_json::to_string(event).into_diagnostic(),
        OutputFormat::Text => Ok(match event.as_lifecycle() {
            Some(LifecycleEvent::Tick { sequence, at }) => {
                format!("tick #{sequence} at {}", format_tick_time(*at))
            }
            _ => event.to_string(),
        }),
    }
}

/// Writes events, one per line, to `W` (stdout in the binary).
#[derive(Debug)]
pub struct EventPrinter<W: Write> {
    writer: W,
    format: OutputFormat,
    printed: u64,
}

impl<W: Write> EventPrinter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            printed: 0,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the event can't be rendered or the write fails (eg: the
    /// reading end of a pipe went away).
    pub fn print(&mut self, event: &InputEvent) -> miette::Result<()> {
        let line = format_event(event, self.format)?;
        writeln!(self.writer, "{line}").into_diagnostic()?;
        self.writer.flush().into_diagnostic()?;
        self.printed += 1;
        Ok(())
    }

    #[must_use]
    pub fn printed(&self) -> u64 { self.printed }

    pub fn into_inner(self) -> W { self.writer }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sbc_input::{DetachReason, DeviceClass, DeviceRef, KeyAction, KeyEvent, Timestamp};
    use test_case::test_case;

    fn keyboard() -> DeviceRef { DeviceRef::new("/dev/input/event3", DeviceClass::Keyboard) }

    fn key_event() -> InputEvent {
        InputEvent::Key {
            device: keyboard(),
            key: KeyEvent {
                code: 30,
                action: KeyAction::Press,
                scancode: None,
                timestamp: Timestamp(1_500_000),
            },
        }
    }

    #[test]
    fn text_lines_use_the_event_display() {
        let mut printer = EventPrinter::new(Vec::new(), OutputFormat::Text);
        printer.print(&key_event()).unwrap();
        printer
            .print(
                &LifecycleEvent::Detached {
                    device: keyboard(),
                    reason: DetachReason::Hangup,
                }
                .into(),
            )
            .unwrap();
        assert_eq!(printer.printed(), 2);

        let output = String::from_utf8(printer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("/dev/input/event3 key press code=30"));
        assert_eq!(lines[1], "detached /dev/input/event3 [keyboard] (hangup)");
    }

    #[test]
    fn json_lines_are_tagged_objects() {
        let line = format_event(&key_event(), OutputFormat::JsonLines).unwrap();
        let json: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(json["type"], "key");
        assert_eq!(json["key"]["code"], 30);
        assert_eq!(json["key"]["action"], "press");
    }

    #[test]
    fn ticks_carry_a_wall_clock_time() {
        let tick: InputEvent = LifecycleEvent::Tick {
            sequence: 3,
            at: SystemTime::now(),
        }
        .into();
        let line = format_event(&tick, OutputFormat::Text).unwrap();
        assert!(line.starts_with("tick #3 at "));
    }

    #[test_case(false, OutputFormat::Text)]
    #[test_case(true, OutputFormat::JsonLines)]
    fn json_flag_picks_the_format(json: bool, expected: OutputFormat) {
        assert_eq!(OutputFormat::from_json_flag(json), expected);
    }
}
