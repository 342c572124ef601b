use clap::Parser;
use log::{error, info, Level, Metadata, Record};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use termir::extractor::{ExtractionOptionsBuilder, Extractor};
use termir::loader::RawProgram;
use termir::platform::{self, PlatformProfile};
use termir::{exchange, translator, Error};

/// Build the term IR of a binary from the micro-operations of a lifting
/// engine.
///
/// Reads one micro-operation document, and writes exactly one exchange
/// document. Nothing is written when extraction fails.
#[derive(Parser, Debug)]
#[command(name = "termir", version, long_about = None)]
struct Cli {
    /// The micro-operation document.
    input: PathBuf,

    /// A JSON platform profile, used instead of the built-in profiles.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// The binary the document was lifted from, to read its image base.
    #[arg(long)]
    binary: Option<PathBuf>,

    /// Where to write the exchange document. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Translate functions one after the other.
    #[arg(long, conflicts_with = "threads")]
    sequential: bool,

    /// Number of worker threads. 0 picks one per core.
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Fail on unsupported operations instead of emitting placeholders.
    #[arg(long)]
    strict: bool,

    /// Write compact JSON.
    #[arg(long)]
    compact: bool,

    /// Log debug messages. Twice for trace messages.
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

struct StderrLogger {
    level: Level,
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(io::stderr(), "{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        Level::Error
    } else {
        match cli.verbose {
            0 => Level::Info,
            1 => Level::Debug,
            _ => Level::Trace,
        }
    };
    let logger = Box::new(StderrLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level.to_level_filter());
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let mut raw = RawProgram::from_file(&cli.input)?;
    if let Some(binary) = &cli.binary {
        raw.discover_image_base(binary);
    }

    let profile = match &cli.profile {
        Some(path) => {
            let custom = PlatformProfile::from_file(path)?;
            platform::lookup_in(raw.cpu_architecture(), &[custom])?
        }
        None => platform::lookup(raw.cpu_architecture())?,
    };
    info!("Using platform profile {}", profile.cpu_architecture());

    let options = ExtractionOptionsBuilder::new()
        .parallel(!cli.sequential)
        .threads(cli.threads)
        .translator(
            translator::OptionsBuilder::new()
                .unsupported_are_placeholders(!cli.strict)
                .build(),
        )
        .build();
    let project = Extractor::with_options(&profile, options).extract(&raw)?;

    match &cli.output {
        Some(path) => exchange::write_file(&project, path, !cli.compact),
        None => exchange::write(&project, io::stdout().lock(), !cli.compact),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(&cli) {
        error!("{}", e);
        process::exit(1);
    }
}
