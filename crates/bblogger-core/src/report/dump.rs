use chrono::{DateTime, Local};

use super::{OutputSink, ReportError, ReportRecord, Reporter};
use crate::fmt::format_timestamp;

/// Labeled text dump:
///
/// ```text
/// Timestamp: 2026-10-18 09:15:00
/// Uptime: 26:43
/// Reset Times: 0
/// ...
/// ```
pub struct DumpReporter {
    sink: OutputSink,
}

impl DumpReporter {
    pub fn new(sink: OutputSink) -> Self {
        Self { sink }
    }
}

impl Reporter for DumpReporter {
    fn start_period(&mut self, at: DateTime<Local>) -> Result<(), ReportError> {
        self.sink.open_period(at)
    }

    fn log(&mut self, record: &ReportRecord) -> Result<(), ReportError> {
        self.sink.ensure_open(record.timestamp())?;
        // The dump has no header.
        self.sink.take_header();

        let mut text = format!("Timestamp: {}\n", format_timestamp(&record.timestamp()));
        for (name, value) in record.values() {
            text.push_str(&format!("{}: {}\n", name, value));
        }
        self.sink.write(record.timestamp(), text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Destination;
    use crate::report::testing::{SharedBuf, at, record};
    use tempfile::tempdir;

    #[test]
    fn dump_lists_values_in_record_order() {
        let buf = SharedBuf::default();
        let mut reporter =
            DumpReporter::new(OutputSink::new(Destination::Writer(Box::new(buf.clone()))));
        let t = at(18, 9, 15);

        reporter.start_period(t).unwrap();
        reporter
            .log(&record(t, &[("Uptime", "26:43"), ("NE CRC Count", "Unknown")]))
            .unwrap();

        assert_eq!(
            buf.contents(),
            "Timestamp: 2026-10-18 09:15:00\nUptime: 26:43\nNE CRC Count: Unknown\n"
        );
    }

    #[test]
    fn daily_dump_rotates_at_midnight() {
        let dir = tempdir().unwrap();
        let mut reporter = DumpReporter::new(OutputSink::new(Destination::Daily {
            dir: dir.path().to_path_buf(),
            extension: "log",
        }));

        reporter.start_period(at(18, 23, 45)).unwrap();
        reporter.log(&record(at(18, 23, 45), &[("Uptime", "1:00")])).unwrap();
        reporter.start_period(at(19, 0, 0)).unwrap();
        reporter.log(&record(at(19, 0, 0), &[("Uptime", "1:15")])).unwrap();

        let first = std::fs::read_to_string(dir.path().join("2026-10-18.log")).unwrap();
        let second = std::fs::read_to_string(dir.path().join("2026-10-19.log")).unwrap();
        assert_eq!(first, "Timestamp: 2026-10-18 23:45:00\nUptime: 1:00\n");
        assert_eq!(second, "Timestamp: 2026-10-19 00:00:00\nUptime: 1:15\n");
    }
}
