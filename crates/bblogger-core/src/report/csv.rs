use std::borrow::Cow;

use chrono::{DateTime, Local};

use super::{OutputSink, ReportError, ReportRecord, Reporter};
use crate::fmt::format_timestamp;

const ROW_END: &str = "\r\n";

/// Comma-separated rows, one per record, preceded by a
/// `Timestamp,<id>,...` header once per destination.
pub struct CsvReporter {
    sink: OutputSink,
}

impl CsvReporter {
    pub fn new(sink: OutputSink) -> Self {
        Self { sink }
    }
}

impl Reporter for CsvReporter {
    fn start_period(&mut self, at: DateTime<Local>) -> Result<(), ReportError> {
        self.sink.open_period(at)
    }

    fn log(&mut self, record: &ReportRecord) -> Result<(), ReportError> {
        self.sink.ensure_open(record.timestamp())?;

        let mut text = String::new();
        if self.sink.take_header() {
            let header = std::iter::once("Timestamp").chain(record.names());
            push_row(&mut text, header);
        }
        let timestamp = format_timestamp(&record.timestamp());
        let row = std::iter::once(timestamp.as_str())
            .chain(record.values().iter().map(|(_, v)| v.as_str()));
        push_row(&mut text, row);

        self.sink.write(record.timestamp(), text.as_bytes())
    }
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&quote(field));
    }
    out.push_str(ROW_END);
}

/// Quotes a field that contains a delimiter, a quote or a line break.
fn quote(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
