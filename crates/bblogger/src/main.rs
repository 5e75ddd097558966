//! bblogger - broadband modem stats logger.
//!
//! Logs into a modem's telnet management port at a fixed interval, extracts
//! line statistics and records them as a text dump or CSV, optionally one
//! file per calendar day.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use dialoguer::{Input, Password};
use secrecy::SecretString;
use tracing::{Level, debug, error, info};
use tracing_subscriber::EnvFilter;

use bblogger_core::config::{Credentials, HostsFile, PollConfig, SessionConfig};
use bblogger_core::driver::{ModemDriver, ModemModel, Vigor130};
use bblogger_core::reader::StatReader;
use bblogger_core::report::{Destination, OutputSink, ReportError, ReportFormat, Reporter};
use bblogger_core::scheduler::{PollScheduler, RunSummary, SystemClock};
use bblogger_core::session::{TELNET_PORT, TcpConnector};

/// Broadband modem stats logger.
#[derive(Parser, Debug)]
#[command(name = "bblogger", about = "Broadband modem stats logger", version)]
struct Args {
    /// Total logging time in hours.
    #[arg(short, long, default_value = "24", value_parser = clap::value_parser!(u64).range(1..))]
    duration: u64,

    /// Time between polls in minutes.
    #[arg(short = 't', long, default_value = "15", value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Output format: dump or csv.
    #[arg(short, long, default_value = "dump")]
    format: ReportFormat,

    /// Write to this file instead of stdout. The file must not exist.
    #[arg(short, long, conflicts_with_all = ["output_dir", "daily"])]
    output: Option<PathBuf>,

    /// Directory for per-day files (with --daily).
    #[arg(long, requires = "daily")]
    output_dir: Option<PathBuf>,

    /// Write one file per calendar day, named <YYYY-MM-DD>.log or .csv.
    #[arg(long)]
    daily: bool,

    /// Modem address, host or host:port.
    #[arg(long, env = "BBLOGGER_HOST")]
    host: Option<String>,

    /// Login account.
    #[arg(long, env = "BBLOGGER_ACCOUNT")]
    account: Option<String>,

    /// Login password (prompted for if not given).
    #[arg(long, env = "BBLOGGER_PASSWORD", hide_env_values = true)]
    password: Option<SecretString>,

    /// Modem model.
    #[arg(long)]
    model: Option<ModemModel>,

    /// Telnet port used when the address has none [default: 23].
    #[arg(long)]
    port: Option<u16>,

    /// Seconds to wait for each modem prompt.
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Hosts file with per-modem account, password, model and port.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Connection settings after merging the command line, the hosts file and
/// interactive prompts.
#[derive(Debug)]
struct Target {
    host: Option<String>,
    account: Option<String>,
    password: Option<SecretString>,
    model: ModemModel,
    port: u16,
}

impl Target {
    /// Command line first, then the hosts file. Anything still missing is
    /// left for [`Target::prompt_missing`].
    fn resolve(args: &Args, hosts: Option<&HostsFile>) -> Self {
        let host = args.host.clone().or_else(|| {
            // A hosts file describing a single modem names the target.
            let mut names = hosts?.hosts();
            match (names.next(), names.next()) {
                (Some(only), None) => Some(only.to_string()),
                _ => None,
            }
        });
        let entry = host
            .as_deref()
            .and_then(|h| hosts.and_then(|f| f.lookup(h)))
            .cloned()
            .unwrap_or_default();

        Self {
            account: args.account.clone().or(entry.account),
            password: args.password.clone().or(entry.password),
            model: args.model.or(entry.model).unwrap_or_default(),
            port: args.port.or(entry.port).unwrap_or(TELNET_PORT),
            host,
        }
    }

    fn prompt_missing(self) -> Result<(Credentials, ModemModel, u16), dialoguer::Error> {
        let host = match self.host {
            Some(host) => host,
            None => Input::<String>::new()
                .with_prompt("Modem address")
                .interact_text()?,
        };
        let account = match self.account {
            Some(account) => account,
            None => Input::<String>::new().with_prompt("Account").interact_text()?,
        };
        let password = match self.password {
            Some(password) => password,
            None => SecretString::from(
                Password::new()
                    .with_prompt(format!("Password for {}@{}", account, host))
                    .interact()?,
            ),
        };
        let credentials = Credentials {
            host,
            account,
            password,
        };
        Ok((credentials, self.model, self.port))
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["bblogger", "bblogger_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    // Reports may go to stdout; diagnostics never do.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn destination(args: &Args) -> Destination {
    if args.daily {
        Destination::Daily {
            dir: args.output_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
            extension: args.format.extension(),
        }
    } else if let Some(path) = &args.output {
        Destination::File(path.clone())
    } else {
        Destination::Stdout
    }
}

fn poll<D: ModemDriver>(
    driver: D,
    connector: TcpConnector,
    session: SessionConfig,
    window: PollConfig,
    credentials: &Credentials,
    reporter: &mut dyn Reporter,
) -> Result<RunSummary, ReportError> {
    let mut reader = StatReader::new(driver, connector, session);
    let mut scheduler = PollScheduler::new(window, SystemClock);
    scheduler.run(&mut reader, credentials, reporter)
}

fn run(args: Args) -> Result<RunSummary, Box<dyn Error>> {
    let hosts = args.config.as_deref().map(HostsFile::load).transpose()?;
    if let Some(path) = &args.config {
        debug!("Loaded hosts file {}", path.display());
    }
    let (credentials, model, port) = Target::resolve(&args, hosts.as_ref()).prompt_missing()?;

    let window = PollConfig::from_hours_minutes(args.duration, args.interval, args.daily)?;
    let session = SessionConfig {
        read_timeout: Duration::from_secs(args.timeout),
        ..SessionConfig::default()
    };
    let connector = TcpConnector::new(port);

    info!(
        "Config: host={}, account={}, model={}, format={}",
        credentials.host, credentials.account, model, args.format
    );

    let mut reporter = args.format.reporter(OutputSink::new(destination(&args)));
    let summary = match model {
        ModemModel::Vigor130 => poll(
            Vigor130::new()?,
            connector,
            session,
            window,
            &credentials,
            reporter.as_mut(),
        )?,
    };
    Ok(summary)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    info!("bblogger {} starting", env!("CARGO_PKG_VERSION"));

    match run(args) {
        Ok(summary) => {
            info!(
                "Finished: {} records written, {} of {} cycles failed",
                summary.records, summary.failed, summary.cycles
            );
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("bblogger").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_a_day_at_quarter_hours() {
        let a = args(&[]);
        assert_eq!(a.duration, 24);
        assert_eq!(a.interval, 15);
        assert_eq!(a.format, ReportFormat::Dump);
        assert_eq!(a.timeout, 30);
        assert!(matches!(destination(&a), Destination::Stdout));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Args::try_parse_from(["bblogger", "-t", "0"]).is_err());
        assert!(Args::try_parse_from(["bblogger", "-d", "0"]).is_err());
    }

    #[test]
    fn output_file_conflicts_with_daily() {
        assert!(Args::try_parse_from(["bblogger", "-o", "x.log", "--daily"]).is_err());
        assert!(Args::try_parse_from(["bblogger", "--output-dir", "logs"]).is_err());
    }

    #[test]
    fn daily_destination_uses_format_extension() {
        let a = args(&["--daily", "--output-dir", "logs", "-f", "csv"]);
        match destination(&a) {
            Destination::Daily { dir, extension } => {
                assert_eq!(dir, PathBuf::from("logs"));
                assert_eq!(extension, "csv");
            }
            _ => panic!("expected daily destination"),
        }
    }

    #[test]
    fn command_line_overrides_hosts_file() {
        let hosts = HostsFile::parse(
            r#"
            [hosts."192.168.1.1"]
            account = "admin"
            password = "from-file"
            port = 2323
            "#,
        )
        .unwrap();
        let a = args(&["--host", "192.168.1.1", "--password", "from-cli"]);

        let target = Target::resolve(&a, Some(&hosts));
        assert_eq!(target.account.as_deref(), Some("admin"));
        assert_eq!(
            target.password.as_ref().map(|p| p.expose_secret().as_str()),
            Some("from-cli")
        );
        assert_eq!(target.port, 2323);
        assert_eq!(target.model, ModemModel::Vigor130);
    }

    #[test]
    fn single_host_file_names_the_target() {
        let hosts = HostsFile::parse("[hosts.\"modem.lan\"]\naccount = \"ops\"\n").unwrap();
        let target = Target::resolve(&args(&[]), Some(&hosts));
        assert_eq!(target.host.as_deref(), Some("modem.lan"));
        assert_eq!(target.account.as_deref(), Some("ops"));
        assert!(target.password.is_none());
        assert_eq!(target.port, TELNET_PORT);
    }
}
