// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use sbc_input::{InputCoreError, OpenAllReport};

pub fn open_all_summary_msg(report: &OpenAllReport) -> String {
    match (report.opened.len(), report.failed.len()) {
        (0, 0) => "evtap: no input devices opened, waiting for a rescan".to_string(),
        (opened, 0) => format!("evtap: watching {opened} device(s)"),
        (opened, failed) => {
            format!("evtap: watching {opened} device(s), {failed} could not be opened")
        }
    }
}

pub fn open_failure_msg(error: &InputCoreError) -> String {
    format!("evtap: {error} [{}]", error.kind())
}

pub fn invalid_config_msg(report: &miette::Report) -> String {
    format!("evtap: invalid configuration.\n{report:?}")
}

pub fn unrecoverable_error_msg(report: &miette::Report) -> String {
    format!("evtap could not run due to the following problem.\n{report:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sbc_input::DeviceId;

    #[test]
    fn summary_mentions_failures_only_when_there_are_some() {
        let mut report = OpenAllReport::default();
        assert_eq!(
            open_all_summary_msg(&report),
            "evtap: no input devices opened, waiting for a rescan"
        );
        report.opened.push(DeviceId::from("/dev/input/event0"));
        assert_eq!(open_all_summary_msg(&report), "evtap: watching 1 device(s)");
        report.failed.push(InputCoreError::Unsupported {
            device: DeviceId::from("/dev/input/event4"),
        });
        assert_eq!(
            open_all_summary_msg(&report),
            "evtap: watching 1 device(s), 1 could not be opened"
        );
    }
}
