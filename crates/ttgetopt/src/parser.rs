//! Parse entry points and the token-matching loop.
//!
//! Every entry point funnels into the same scan: each option token is
//! matched against the compiled [`Registry`] in a fixed order, the
//! matching extractor consumes its arguments, and diagnostics accumulate
//! until the scan ends. A trailing DSN or connection string is resolved
//! last.

use std::path::Path;

use crate::classify::{looks_like_connstr, looks_like_dsn};
use crate::env::Environment;
use crate::error::{ParseError, Result};
use crate::extract::{self, parse_int, Ctx, Extracted, Number};
use crate::meta::{self, command_name};
use crate::mode::Mode;
use crate::source::{self, ArgList};
use crate::spec::{ArgType, Target};
use crate::table::{OptionTable, Registry};

/// Argument list built by the file or string entry point, and the index of
/// its first unconsumed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub args: ArgList,
    pub index: usize,
}

impl Parsed {
    /// Entries left for the caller (operands after the options).
    pub fn remaining(&self) -> &[String] {
        self.args.get(self.index..).unwrap_or(&[])
    }
}

/// Configured parser. Cheap to build; holds no per-call state.
#[derive(Debug, Clone)]
pub struct Parser {
    mode: Mode,
    env: Environment,
    require_home: bool,
}

impl Parser {
    /// Parser reading the process environment, requiring `TIMESTEN_HOME`
    /// for [`Parser::parse`].
    pub fn new(mode: Mode) -> Self {
        Parser {
            mode,
            env: Environment::from_process(),
            require_home: true,
        }
    }

    pub fn env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Whether [`Parser::parse`] refuses to run without `TIMESTEN_HOME`.
    pub fn require_home(mut self, required: bool) -> Self {
        self.require_home = required;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Parse `args` (with `args[0]` the program name) against `table`.
    ///
    /// Returns the index of the first unconsumed argument.
    pub fn parse<S: AsRef<str>>(&self, args: &[S], table: OptionTable<'_>) -> Result<usize> {
        if self.require_home && self.env.timesten_home.is_none() {
            return Err(self.echo(ParseError::HomeNotSet));
        }
        let argv: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let cmd = argv.first().map(|a| command_name(a)).unwrap_or_default();
        self.run(&cmd, &argv, table)
    }

    /// Read options from a file (`None` for stdin) and parse them.
    pub fn parse_file(&self, path: Option<&Path>, table: OptionTable<'_>) -> Result<Parsed> {
        let args = source::args_from_file(path).map_err(|e| self.echo(e))?;
        self.parse_list(args, table)
    }

    /// Split `text` into words and parse them; `name` plays `argv[0]`.
    pub fn parse_str(&self, text: &str, name: &str, table: OptionTable<'_>) -> Result<Parsed> {
        let args = source::args_from_str(text, name).map_err(|e| self.echo(e))?;
        self.parse_list(args, table)
    }

    /// Messages are prefixed with `args[0]` as given (file or caller name).
    fn parse_list(&self, args: ArgList, table: OptionTable<'_>) -> Result<Parsed> {
        let argv = args.as_strs();
        let cmd = argv.first().copied().unwrap_or_default();
        let index = self.run(cmd, &argv, table)?;
        Ok(Parsed { args, index })
    }

    fn run(&self, cmd: &str, argv: &[&str], table: OptionTable<'_>) -> Result<usize> {
        let registry = Registry::compile(table, self.mode.contains(Mode::CASE_SENSITIVE), cmd)
            .map_err(|msgs| self.echo(ParseError::Registration(msgs)))?;

        let mut ctx = Ctx::new(cmd, self.mode);
        ctx.wants_connection = registry.dsn.is_some() || registry.connstr.is_some();
        let mut scan = Scan {
            registry,
            ctx,
            env: &self.env,
        };
        let index = scan.run(argv);

        let messages = scan.ctx.messages;
        if messages.is_empty() {
            tracing::debug!(cmd = %cmd, index, "options parsed");
            Ok(index)
        } else {
            Err(ParseError::Options(messages))
        }
    }

    fn echo(&self, err: ParseError) -> ParseError {
        if self.mode.contains(Mode::PRINT_ERRS) {
            for msg in err.messages() {
                eprintln!("{}", msg);
            }
        }
        err
    }
}

/// `Parser::new(mode).parse(args, table)`.
pub fn getoptions<S: AsRef<str>>(args: &[S], mode: Mode, table: OptionTable<'_>) -> Result<usize> {
    Parser::new(mode).parse(args, table)
}

// -- Scan --------------------------------------------------------------------

enum Outcome {
    Matched,
    Failed,
    Unknown,
}

impl From<Extracted> for Outcome {
    fn from(r: Extracted) -> Self {
        match r {
            Ok(()) => Outcome::Matched,
            Err(_) => Outcome::Failed,
        }
    }
}

struct Scan<'a, 'c, 'e> {
    registry: Registry<'a>,
    ctx: Ctx<'c>,
    env: &'e Environment,
}

/// Name part of an option token and whether it used `--`.
/// `None` for operands, including a lone `-`.
fn option_name(token: &str) -> Option<(&str, bool)> {
    let (name, long_only) = if let Some(name) = token.strip_prefix("--") {
        (name, true)
    } else if let Some(name) = token.strip_prefix('-') {
        (name, false)
    } else if cfg!(windows) {
        (token.strip_prefix('/')?, false)
    } else {
        return None;
    };
    if name.is_empty() {
        None
    } else {
        Some((name, long_only))
    }
}

/// `name` without a leading `no`, under the mode's case rules.
fn strip_no(name: &str, case_sensitive: bool) -> Option<&str> {
    let prefix = name.get(..2)?;
    let is_no = if case_sensitive {
        prefix == "no"
    } else {
        prefix.eq_ignore_ascii_case("no")
    };
    is_no.then(|| &name[2..])
}

impl Scan<'_, '_, '_> {
    fn run(&mut self, argv: &[&str]) -> usize {
        let mut idx = 1;
        while idx < argv.len() {
            let token = argv[idx];
            if token == "--" {
                idx += 1;
                break;
            }
            let Some((name, long_only)) = option_name(token) else {
                break;
            };
            idx += 1;
            tracing::trace!(token, "option token");

            if let Outcome::Unknown = self.find_option(name, long_only, token, argv, &mut idx) {
                if self.ctx.mode.contains(Mode::IGNORE_UNKNOWNS) {
                    tracing::debug!(token, "ignoring unknown option");
                } else {
                    self.ctx.fail(format_args!("unknown option '{}'", token));
                }
            }
        }

        if self.ctx.messages.is_empty() {
            self.resolve_connection(argv, &mut idx);
        }
        idx
    }

    fn find_option(
        &mut self,
        name: &str,
        long_only: bool,
        token: &str,
        argv: &[&str],
        idx: &mut usize,
    ) -> Outcome {
        let single = name.chars().nth(1).is_none();
        if long_only && single {
            return Outcome::Unknown;
        }

        if let Some(i) = self.registry.exact(name) {
            return self.dispatch(i, name, argv, idx, false, None);
        }

        let metas = self.registry.metas().to_vec();
        for i in metas {
            let spec = &mut self.registry.specs[i];
            if let Some(r) = meta::check_special(spec, name, token, argv, idx, &mut self.ctx) {
                return r.into();
            }
        }

        if !long_only && !single {
            if let Some(r) = self.bundle(name) {
                return r.into();
            }
        }

        if let Some(rest) = strip_no(name, self.ctx.mode.contains(Mode::CASE_SENSITIVE)) {
            if let Some(i) = self.registry.exact(rest) {
                if self.registry.specs[i].kind == ArgType::Negatable {
                    return self.dispatch(i, rest, argv, idx, true, None);
                }
            }
        }

        if self.ctx.mode.contains(Mode::ABBREV) {
            if let Some(i) = self.registry.abbrev(name) {
                return self.dispatch(i, name, argv, idx, false, None);
            }
        }

        if let Some((key, value)) = name.split_once('=') {
            if !value.is_empty() {
                if let Some(i) = self.registry.exact(key) {
                    return self.dispatch(i, key, argv, idx, false, Some(value));
                }
            }
        }

        Outcome::Unknown
    }

    fn dispatch(
        &mut self,
        i: usize,
        opt: &str,
        argv: &[&str],
        idx: &mut usize,
        negate: bool,
        inline: Option<&str>,
    ) -> Outcome {
        let spec = &mut self.registry.specs[i];
        extract::extract(spec, opt, argv, idx, negate, inline, &mut self.ctx).into()
    }

    /// `-abc` as single-character options: flags may be bundled, and an
    /// `i` or `s` option takes the rest of the token as its value.
    /// Everything is checked before anything is written.
    fn bundle(&mut self, name: &str) -> Option<Extracted> {
        let mut flags = Vec::new();
        let mut tail = None;
        for (pos, c) in name.char_indices() {
            let i = self.registry.single(c)?;
            match self.registry.specs[i].kind {
                ArgType::Flag | ArgType::Negatable => flags.push(i),
                ArgType::Int | ArgType::Str => {
                    tail = Some((i, pos, &name[pos + c.len_utf8()..]));
                    break;
                }
                _ => return None,
            }
        }

        let mut number = None;
        if let Some((i, pos, rest)) = tail {
            if rest.is_empty() {
                return None;
            }
            match &self.registry.specs[i].target {
                _ if self.registry.specs[i].kind == ArgType::Int => {
                    number = Some(parse_int(rest).ok()?);
                }
                Target::Str(_, max_len) if rest.len() > *max_len => {
                    let max_len = *max_len;
                    return Some(Err(extract::too_long(&mut self.ctx, &name[pos..], max_len)));
                }
                _ => {}
            }
        }

        for i in flags {
            if let Target::Flag(dest) = &mut self.registry.specs[i].target {
                **dest = true;
            }
        }
        if let Some((i, _, rest)) = tail {
            let target = &mut self.registry.specs[i].target;
            match number {
                Some(n) => Number::Int(n).store(target),
                None => {
                    let _ = extract::store_string(target, rest);
                }
            }
        }
        tracing::debug!(bundle = name, "matched bundled options");
        Some(Ok(()))
    }

    /// Claim the first leftover argument as the DSN or connection string,
    /// else fall back to `TT_CONNSTR`.
    fn resolve_connection(&mut self, argv: &[&str], idx: &mut usize) {
        let (dsn, connstr) = (self.registry.dsn, self.registry.connstr);
        if (dsn.is_none() && connstr.is_none()) || self.ctx.got_dsn || self.ctx.got_connstr {
            return;
        }

        let mut resolved = false;
        if let Some(&token) = argv.get(*idx) {
            let slot = match (dsn, connstr) {
                (Some(i), _) if looks_like_dsn(token) => Some(i),
                (_, Some(i)) if looks_like_connstr(token) => Some(i),
                _ => None,
            };
            if let Some(i) = slot {
                tracing::debug!(token, "positional DSN or connection string");
                let spec = &mut self.registry.specs[i];
                let _ = extract::copy_string(spec, token, argv, idx, None, &mut self.ctx);
                resolved = true;
            }
        }

        if !resolved && !self.ctx.mode.contains(Mode::IGNORE_CONNSTR_ENV) {
            if let (Some(i), Some(value)) = (connstr, self.env.connstr_fallback()) {
                tracing::debug!("connection string taken from TT_CONNSTR");
                if let Err(max_len) = extract::store_string(&mut self.registry.specs[i].target, value)
                {
                    self.ctx.fail(format_args!(
                        "TT_CONNSTR connection string value is too long (max {})",
                        max_len
                    ));
                }
                resolved = true;
            }
        }

        if !resolved && !self.ctx.mode.contains(Mode::NO_CONNSTR_OK) {
            let msg = match (dsn, connstr) {
                (Some(_), Some(_)) => "No DSN or connection string given.",
                (Some(_), None) => "No DSN given.",
                _ => "No connection string given.",
            };
            self.ctx.fail(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(mode: Mode) -> Parser {
        Parser::new(mode).env(Environment::default()).require_home(false)
    }

    #[test]
    fn option_token_shapes() {
        assert_eq!(option_name("-v"), Some(("v", false)));
        assert_eq!(option_name("--verbose"), Some(("verbose", true)));
        assert_eq!(option_name("-"), None);
        assert_eq!(option_name("--"), None);
        assert_eq!(option_name("file"), None);
    }

    #[test]
    fn no_prefix() {
        assert_eq!(strip_no("nocolor", true), Some("color"));
        assert_eq!(strip_no("NoColor", false), Some("Color"));
        assert_eq!(strip_no("NoColor", true), None);
        assert_eq!(strip_no("n", false), None);
    }

    #[test]
    fn home_is_required_by_default() {
        let p = Parser::new(Mode::empty()).env(Environment::default());
        let err = p.parse(&["prog"], OptionTable::new()).unwrap_err();
        assert_eq!(err, ParseError::HomeNotSet);

        let p = p.env(Environment::default().with_home("/opt/tt"));
        assert_eq!(p.parse(&["prog"], OptionTable::new()), Ok(1));
    }

    #[test]
    fn bundled_flags_and_value() {
        let (mut a, mut b, mut n) = (false, false, 0);
        let table = OptionTable::new()
            .flag("a", &mut a)
            .flag("b", &mut b)
            .int("n", &mut n);
        let idx = parser(Mode::empty()).parse(&["prog", "-abn17"], table).unwrap();
        assert_eq!(idx, 2);
        assert!(a && b);
        assert_eq!(n, 17);
    }

    #[test]
    fn failed_bundle_writes_nothing() {
        let (mut a, mut n) = (false, 0);
        let table = OptionTable::new().flag("a", &mut a).int("n", &mut n);
        let err = parser(Mode::empty()).parse(&["prog", "-anx"], table).unwrap_err();
        assert_eq!(err.messages(), vec!["prog: unknown option '-anx'"]);
        assert!(!a);
        assert_eq!(n, 0);
    }

    #[test]
    fn bundled_string_too_long() {
        let mut s = String::new();
        let table = OptionTable::new().string("o", &mut s, 3);
        let err = parser(Mode::empty()).parse(&["prog", "-oabcd"], table).unwrap_err();
        assert_eq!(err.messages(), vec!["prog: option oabcd is too long (max 3)"]);
        assert!(s.is_empty());
    }

    #[test]
    fn double_dash_single_char_is_unknown() {
        let mut v = false;
        let table = OptionTable::new().flag("v", &mut v);
        let err = parser(Mode::empty()).parse(&["prog", "--v"], table).unwrap_err();
        assert_eq!(err.messages(), vec!["prog: unknown option '--v'"]);
    }

    #[test]
    fn terminator_is_consumed() {
        let mut v = false;
        let table = OptionTable::new().flag("v", &mut v);
        let idx = parser(Mode::empty())
            .parse(&["prog", "-v", "--", "-x"], table)
            .unwrap();
        assert_eq!(idx, 3);
    }

    #[test]
    fn lone_dash_is_an_operand() {
        let table = OptionTable::new();
        assert_eq!(parser(Mode::empty()).parse(&["prog", "-", "x"], table), Ok(1));
    }

    #[test]
    fn negation_needs_negatable() {
        let (mut color, mut plain) = (true, true);
        let table = OptionTable::new()
            .negatable("color", &mut color)
            .flag("plain", &mut plain);
        let err = parser(Mode::empty())
            .parse(&["prog", "-nocolor", "-noplain"], table)
            .unwrap_err();
        assert_eq!(err.messages(), vec!["prog: unknown option '-noplain'"]);
        assert!(!color);
    }

    #[test]
    fn inline_values() {
        let (mut n, mut name, mut ids) = (0, String::new(), Vec::new());
        let table = OptionTable::new()
            .int("count", &mut n)
            .string("name", &mut name, 16)
            .int_array("ids", &mut ids, 4);
        let idx = parser(Mode::empty())
            .parse(&["prog", "--count=3", "-name=x=y", "--ids=1", "2"], table)
            .unwrap();
        assert_eq!(idx, 5);
        assert_eq!(n, 3);
        assert_eq!(name, "x=y");
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn flag_rejects_inline_value() {
        let mut v = false;
        let table = OptionTable::new().flag("verbose", &mut v);
        let err = parser(Mode::empty())
            .parse(&["prog", "--verbose=yes"], table)
            .unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["prog: option verbose does not take an argument"]
        );
    }

    #[test]
    fn errors_accumulate() {
        let (mut n, mut d) = (0, 0.0);
        let table = OptionTable::new().int("n", &mut n).double("d", &mut d);
        let err = parser(Mode::empty())
            .parse(&["prog", "-x", "-n", "5q", "-d"], table)
            .unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "prog: unknown option '-x'",
                "prog: option n: trailing garbage in numeric argument '5q'",
            ]
        );
        assert_eq!(n, 0);
    }

    #[test]
    fn ignore_unknowns_still_reports_bad_values() {
        let mut n = 0;
        let table = OptionTable::new().int("n", &mut n);
        let err = parser(Mode::IGNORE_UNKNOWNS)
            .parse(&["prog", "-zzz", "-n", "x"], table)
            .unwrap_err();
        assert_eq!(err.messages(), vec!["prog: option n: bad numeric argument 'x'"]);
    }

    #[test]
    fn registration_errors_abort() {
        let mut n = 0;
        let table = OptionTable::new().add("n=q", Target::Int(&mut n));
        let err = parser(Mode::empty()).parse(&["prog", "-n", "1"], table).unwrap_err();
        assert!(matches!(err, ParseError::Registration(_)));
        assert_eq!(n, 0);
    }

    #[test]
    fn remaining_after_index() {
        let parsed = Parsed {
            args: ArgList::new(vec!["p".into(), "-v".into(), "a".into()]),
            index: 2,
        };
        assert_eq!(parsed.remaining(), ["a"]);
    }
}
