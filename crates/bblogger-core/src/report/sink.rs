use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use tracing::{debug, info};

use super::ReportError;
use crate::fmt::DATE_FORMAT;

/// Where report bytes go.
pub enum Destination {
    Stdout,
    /// Arbitrary writer, used as a single destination.
    Writer(Box<dyn Write>),
    /// A single file that must not exist yet.
    File(PathBuf),
    /// One `<dir>/<YYYY-MM-DD>.<extension>` file per calendar day, appended
    /// to if present.
    Daily {
        dir: PathBuf,
        extension: &'static str,
    },
}

/// A [`Destination`] with any caller-supplied writer moved into the sink.
enum Route {
    Stdout,
    Writer,
    File(PathBuf),
    Daily {
        dir: PathBuf,
        extension: &'static str,
    },
}

/// Opens destinations as periods start and tracks whether the current one
/// still needs a header.
pub struct OutputSink {
    route: Route,
    writer: Option<Box<dyn Write>>,
    /// Date of the daily file currently open.
    date: Option<NaiveDate>,
    needs_header: bool,
}

impl OutputSink {
    pub fn new(destination: Destination) -> Self {
        let (route, writer) = match destination {
            Destination::Stdout => (Route::Stdout, None),
            Destination::Writer(w) => (Route::Writer, Some(w)),
            Destination::File(path) => (Route::File(path), None),
            Destination::Daily { dir, extension } => (Route::Daily { dir, extension }, None),
        };
        Self {
            needs_header: writer.is_some(),
            route,
            writer,
            date: None,
        }
    }

    /// Path of the file written for `date` in daily mode.
    pub fn daily_path(dir: &Path, date: NaiveDate, extension: &str) -> PathBuf {
        dir.join(format!("{}.{}", date.format(DATE_FORMAT), extension))
    }

    /// Makes sure the destination for a period starting at `at` is open.
    pub fn open_period(&mut self, at: DateTime<Local>) -> Result<(), ReportError> {
        match &self.route {
            Route::Stdout => {
                if self.writer.is_none() {
                    self.writer = Some(Box::new(io::stdout()));
                    self.needs_header = true;
                }
            }
            // Supplied at construction; nothing to open.
            Route::Writer => {}
            Route::File(path) => {
                if self.writer.is_none() {
                    let file = create_new(path)?;
                    info!("Writing report to {}", path.display());
                    self.writer = Some(Box::new(BufWriter::new(file)));
                    self.needs_header = true;
                }
            }
            Route::Daily { dir, extension } => {
                let date = at.date_naive();
                if self.date != Some(date) {
                    let path = Self::daily_path(dir, date, extension);
                    let (file, empty) = open_append(dir, &path)?;
                    if let Some(mut previous) = self.writer.take() {
                        previous.flush()?;
                    }
                    info!("Writing report to {}", path.display());
                    self.writer = Some(Box::new(BufWriter::new(file)));
                    self.date = Some(date);
                    self.needs_header = empty;
                }
            }
        }
        Ok(())
    }

    /// True exactly once per destination that started out empty.
    pub fn take_header(&mut self) -> bool {
        std::mem::take(&mut self.needs_header)
    }

    /// Writes `bytes` and flushes. Opens the destination for `at` first if no
    /// period was started.
    pub fn write(&mut self, at: DateTime<Local>, bytes: &[u8]) -> Result<(), ReportError> {
        if self.writer.is_none() {
            self.open_period(at)?;
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(ReportError::Write(io::Error::new(
                ErrorKind::NotConnected,
                "no report destination open",
            )));
        };
        writer.write_all(bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Opens the destination for `at` if none is open yet.
    pub fn ensure_open(&mut self, at: DateTime<Local>) -> Result<(), ReportError> {
        if self.writer.is_none() {
            self.open_period(at)?;
        }
        Ok(())
    }
}

fn create_new(path: &Path) -> Result<File, ReportError> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| match source.kind() {
            ErrorKind::AlreadyExists => ReportError::Exists(path.to_path_buf()),
            _ => ReportError::Open {
                path: path.to_path_buf(),
                source,
            },
        })
}

/// Opens `path` for appending, creating `dir` as needed. Also reports whether
/// the file was empty.
fn open_append(dir: &Path, path: &Path) -> Result<(File, bool), ReportError> {
    let open_err = |source| ReportError::Open {
        path: path.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(open_err)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_err)?;
    let empty = file.metadata().map_err(open_err)?.len() == 0;
    debug!("Opened {} (empty: {})", path.display(), empty);
    Ok((file, empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::{SharedBuf, at};
    use tempfile::tempdir;

    #[test]
    fn writer_needs_header_once() {
        let buf = SharedBuf::default();
        let mut sink = OutputSink::new(Destination::Writer(Box::new(buf.clone())));

        sink.open_period(at(18, 9, 0)).unwrap();
        assert!(sink.take_header());
        assert!(!sink.take_header());

        sink.open_period(at(19, 9, 0)).unwrap();
        assert!(!sink.take_header());

        sink.write(at(19, 9, 0), b"row\n").unwrap();
        assert_eq!(buf.contents(), "row\n");
    }

    #[test]
    fn writer_is_used_without_a_period_start() {
        let buf = SharedBuf::default();
        let mut sink = OutputSink::new(Destination::Writer(Box::new(buf.clone())));
        assert!(sink.take_header());

        sink.write(at(18, 9, 0), b"a\n").unwrap();
        for day in [18, 19, 20] {
            sink.open_period(at(day, 0, 0)).unwrap();
            assert!(!sink.take_header());
        }
        sink.write(at(20, 0, 0), b"b\n").unwrap();
        assert_eq!(buf.contents(), "a\nb\n");
    }

    #[test]
    fn single_file_must_not_exist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.log");
        std::fs::write(&path, "old").unwrap();

        let mut sink = OutputSink::new(Destination::File(path.clone()));
        let err = sink.open_period(at(18, 9, 0)).unwrap_err();
        assert!(matches!(err, ReportError::Exists(p) if p == path));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn single_file_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.log");
        let mut sink = OutputSink::new(Destination::File(path.clone()));

        sink.write(at(18, 9, 0), b"hello\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn daily_opens_one_file_per_date() {
        let dir = tempdir().unwrap();
        let mut sink = OutputSink::new(Destination::Daily {
            dir: dir.path().join("logs"),
            extension: "log",
        });

        sink.open_period(at(18, 23, 30)).unwrap();
        assert!(sink.take_header());
        sink.write(at(18, 23, 30), b"a\n").unwrap();

        // Same date: stays on the same file.
        sink.open_period(at(18, 23, 45)).unwrap();
        assert!(!sink.take_header());
        sink.write(at(18, 23, 45), b"b\n").unwrap();

        sink.open_period(at(19, 0, 0)).unwrap();
        assert!(sink.take_header());
        sink.write(at(19, 0, 0), b"c\n").unwrap();

        let logs = dir.path().join("logs");
        assert_eq!(
            std::fs::read_to_string(logs.join("2026-10-18.log")).unwrap(),
            "a\nb\n"
        );
        assert_eq!(
            std::fs::read_to_string(logs.join("2026-10-19.log")).unwrap(),
            "c\n"
        );
    }

    #[test]
    fn daily_appends_to_existing_file_without_header() {
        let dir = tempdir().unwrap();
        let path = OutputSink::daily_path(dir.path(), at(18, 0, 0).date_naive(), "csv");
        std::fs::write(&path, "existing\r\n").unwrap();

        let mut sink = OutputSink::new(Destination::Daily {
            dir: dir.path().to_path_buf(),
            extension: "csv",
        });
        sink.open_period(at(18, 9, 0)).unwrap();
        assert!(!sink.take_header());
        sink.write(at(18, 9, 0), b"new\r\n").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "existing\r\nnew\r\n"
        );
    }
}
