//! Getopt-style option parsing for command-line database tools.
//!
//! Options are described by short specification strings (`"n=i"`,
//! `"verbose!"`, `"<DSN>"`, ...) paired with caller-owned destinations in
//! an [`OptionTable`]. A [`Parser`] matches argument tokens against the
//! table (exact names, bundled single-character options, `no` negation,
//! unique abbreviations, `--name=value`), stores converted values, and
//! returns the index of the first operand.
//!
//! ```no_run
//! use ttgetopt::{Mode, OptionTable, Parser};
//!
//! let (mut verbose, mut n) = (false, 0);
//! let table = OptionTable::new()
//!     .help("Usage: <CMD> [-v] [-n count]\n")
//!     .flag("v", &mut verbose)
//!     .int("n", &mut n);
//! let args: Vec<String> = std::env::args().collect();
//! let index = Parser::new(Mode::ABBREV).parse(&args, table)?;
//! # Ok::<(), ttgetopt::ParseError>(())
//! ```

pub mod classify;
pub mod connstr;
pub mod env;
pub mod error;
mod extract;
pub mod meta;
pub mod mode;
pub mod parser;
pub mod source;
pub mod spec;
pub mod table;

pub use classify::{looks_like_connstr, looks_like_dsn};
pub use env::Environment;
pub use error::{ParseError, Result};
pub use meta::{command_name, dump_help, version_name};
pub use mode::Mode;
pub use parser::{getoptions, Parsed, Parser};
pub use source::{args_from_file, args_from_str, ArgList};
pub use spec::{ArgType, MetaKind, OptionHandler, Target};
pub use table::OptionTable;
