//! Reporters: render Report Records as a labeled dump or as CSV.
//!
//! A reporter is told when a new period begins ([`Reporter::start_period`])
//! and then receives one [`ReportRecord`] per successful cycle. Where the
//! bytes end up is decided by an [`OutputSink`]:
//!
//! | Destination            | Period start                  | Header            |
//! |------------------------|-------------------------------|-------------------|
//! | stdout / writer        | no-op after the first         | once              |
//! | single file            | created, must not exist       | once              |
//! | daily `<dir>/<date>.*` | opens the file for that date  | if file is empty  |
//!
//! Every record is flushed as soon as it is written.

mod csv;
mod dump;
mod sink;

pub use csv::CsvReporter;
pub use dump::DumpReporter;
pub use sink::{Destination, OutputSink};

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate};

/// Output failures. Always fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("output file {} already exists", .0.display())]
    Exists(PathBuf),
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write report: {0}")]
    Write(#[from] io::Error),
}

/// One cycle's timestamp and values, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    timestamp: DateTime<Local>,
    values: Vec<(&'static str, String)>,
}

impl ReportRecord {
    pub fn new(timestamp: DateTime<Local>, values: Vec<(&'static str, String)>) -> Self {
        Self { timestamp, values }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn values(&self) -> &[(&'static str, String)] {
        &self.values
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(name, _)| *name)
    }
}

/// Consumer of Report Records.
pub trait Reporter {
    /// A new logging period begins at `at` (run start or a new calendar day).
    fn start_period(&mut self, at: DateTime<Local>) -> Result<(), ReportError>;

    /// Writes one record and flushes it.
    fn log(&mut self, record: &ReportRecord) -> Result<(), ReportError>;
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn start_period(&mut self, at: DateTime<Local>) -> Result<(), ReportError> {
        (**self).start_period(at)
    }

    fn log(&mut self, record: &ReportRecord) -> Result<(), ReportError> {
        (**self).log(record)
    }
}

/// Report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Dump,
    Csv,
}

impl ReportFormat {
    /// File extension of per-day files.
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Dump => "log",
            ReportFormat::Csv => "csv",
        }
    }

    /// Builds the reporter for this format writing into `sink`.
    pub fn reporter(self, sink: OutputSink) -> Box<dyn Reporter> {
        match self {
            ReportFormat::Dump => Box::new(DumpReporter::new(sink)),
            ReportFormat::Csv => Box::new(CsvReporter::new(sink)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportFormat::Dump => "dump",
            ReportFormat::Csv => "csv",
        })
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dump" => Ok(ReportFormat::Dump),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!("unknown format '{}' (expected dump or csv)", other)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_and_names_extension() {
        assert_eq!("csv".parse::<ReportFormat>().unwrap(), ReportFormat::Csv);
        assert_eq!("DUMP".parse::<ReportFormat>().unwrap(), ReportFormat::Dump);
        assert!("xml".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::Dump.extension(), "log");
        assert_eq!(ReportFormat::Csv.extension(), "csv");
    }

    #[test]
    fn boxed_reporter_writes_through() {
        let buf = testing::SharedBuf::default();
        let sink = OutputSink::new(Destination::Writer(Box::new(buf.clone())));
        let mut reporter = ReportFormat::Csv.reporter(sink);
        let at = testing::at(18, 9, 0);

        reporter.start_period(at).unwrap();
        reporter.log(&testing::record(at, &[("Uptime", "1:00")])).unwrap();
        assert_eq!(buf.contents(), "Timestamp,Uptime\r\n2026-10-18 09:00:00,1:00\r\n");
    }
}
