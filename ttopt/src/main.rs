//! Getopt-style option parsing for shell scripts.
//!
//! Options are declared with `-o SPEC`, the arguments to parse follow `--`
//! (or come from `--file` / `--string`), and the parsed values are printed
//! as JSON or as shell assignments:
//!
//! ```text
//! eval "$(ttopt --format shell -o v -o n=i -o '<DSN>' -- "$@")"
//! ```

mod render;
mod report;
mod slots;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use ttgetopt::connstr::redact_args;
use ttgetopt::{command_name, Mode, ParseError};

use report::Report;
use slots::Slots;

/// Exit status for a command line that could not be parsed.
const EXIT_USAGE: i32 = 2;

const DEFAULT_USAGE: &str = "Usage: <CMD> [options] [args]\n";

#[derive(Parser)]
#[command(
    name = "ttopt",
    version,
    about = "Parse a command line against getopt-style option specifications"
)]
struct Cli {
    /// Option specification: name, name!, name=TYPE[,LEN] or <META>[,LEN].
    /// Can be specified multiple times.
    #[arg(short = 'o', long = "opt", value_name = "SPEC")]
    opts: Vec<String>,

    /// Parsing mode switch. Can be specified multiple times.
    #[arg(short = 'm', long = "mode", value_enum)]
    modes: Vec<ModeArg>,

    /// Text printed by <HELP>; every <CMD> is replaced by the command name
    #[arg(long, default_value = DEFAULT_USAGE, allow_hyphen_values = true)]
    usage: String,

    /// Text printed by <VERSION> (default: the product release)
    #[arg(long)]
    release: Option<String>,

    /// Read options from FILE, one option and value per line ("-" for stdin)
    #[arg(short = 'f', long, conflicts_with = "string")]
    file: Option<String>,

    /// Read options from a single string
    #[arg(short = 's', long, allow_hyphen_values = true)]
    string: Option<String>,

    /// Program name used as argv[0]
    #[arg(short = 'n', long, default_value = "ttopt")]
    name: String,

    /// Output format: json (default), shell
    #[arg(long, default_value = "json")]
    format: String,

    /// Fail when TIMESTEN_HOME is not set (argv mode only)
    #[arg(long)]
    require_home: bool,

    /// Arguments to parse (after --)
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Abbrev,
    CaseSensitive,
    IgnoreUnknowns,
    NoExit,
    PrintErrs,
    NoConnstrOk,
    EmptyListOk,
    IgnoreConnstrEnv,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Abbrev => Mode::ABBREV,
            ModeArg::CaseSensitive => Mode::CASE_SENSITIVE,
            ModeArg::IgnoreUnknowns => Mode::IGNORE_UNKNOWNS,
            ModeArg::NoExit => Mode::NO_EXIT,
            ModeArg::PrintErrs => Mode::PRINT_ERRS,
            ModeArg::NoConnstrOk => Mode::NO_CONNSTR_OK,
            ModeArg::EmptyListOk => Mode::EMPTY_LIST_OK,
            ModeArg::IgnoreConnstrEnv => Mode::IGNORE_CONNSTR_ENV,
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mode = cli
        .modes
        .iter()
        .fold(Mode::empty(), |acc, &m| acc | Mode::from(m));
    let renderer = render::create_renderer(&cli.format)?;
    let mut slots = Slots::new(&cli.opts, cli.usage.clone(), cli.release.clone())?;
    let parser = ttgetopt::Parser::new(mode).require_home(cli.require_home);

    let outcome = if let Some(file) = &cli.file {
        let path = (file != "-").then(|| Path::new(file.as_str()));
        parser
            .parse_file(path, slots.table())
            .map(|p| (p.index, p.args.into_vec()))
    } else if let Some(text) = &cli.string {
        parser
            .parse_str(text, &cli.name, slots.table())
            .map(|p| (p.index, p.args.into_vec()))
    } else {
        let argv: Vec<String> = std::iter::once(cli.name.clone())
            .chain(cli.args.iter().cloned())
            .collect();
        tracing::debug!(args = ?redact_args(&argv, &["pwd"]), "parsing argv");
        parser.parse(&argv, slots.table()).map(|index| (index, argv))
    };

    let (index, args) = match outcome {
        Ok(parsed) => parsed,
        Err(err) => usage_error(&cli.name, mode, &err),
    };

    let report = Report::new(slots, index, &args);
    let out = renderer
        .render(&report)
        .context("failed to render parse result")?;
    print!("{}", out);
    Ok(())
}

/// Report a parse failure and exit with [`EXIT_USAGE`].
fn usage_error(name: &str, mode: Mode, err: &ParseError) -> ! {
    if !mode.contains(Mode::PRINT_ERRS) {
        for msg in err.messages() {
            eprintln!("{}", msg);
        }
    }
    eprintln!(
        "Type '{} -help' for more information.",
        command_name(name)
    );
    std::process::exit(EXIT_USAGE);
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("TTOPT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
