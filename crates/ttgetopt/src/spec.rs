//! Option specification mini-language and caller-owned destinations.
//!
//! A specification is a short string:
//!
//! - `name`: plain flag
//! - `name!`: negatable flag (`-name` / `-noname`)
//! - `name=c`: typed option, `c` one of `i u l d I D s S z Z t`
//! - `<DSN>`, `<CONNSTR>`, `<HELP>`, `<VERSION>`, `<INTEGER>`, `<REAL>`,
//!   `<HELPFUNC>`, `<VERSFUNC>`: special options
//!
//! Each specification is paired with a [`Target`], the place its value
//! lands. The parser never owns a destination; it only writes through it.

use std::fmt;

/// The special `<...>` options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKind {
    Dsn,
    Connstr,
    Help,
    Version,
    Integer,
    Real,
    HelpFunc,
    VersFunc,
}

const META_NAMES: &[(&str, MetaKind)] = &[
    ("<DSN>", MetaKind::Dsn),
    ("<CONNSTR>", MetaKind::Connstr),
    ("<HELP>", MetaKind::Help),
    ("<VERSION>", MetaKind::Version),
    ("<INTEGER>", MetaKind::Integer),
    ("<REAL>", MetaKind::Real),
    ("<HELPFUNC>", MetaKind::HelpFunc),
    ("<VERSFUNC>", MetaKind::VersFunc),
];

impl MetaKind {
    /// Look up a `<NAME>` specification, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        META_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, kind)| kind)
    }

    /// Canonical spelling, e.g. `<DSN>`.
    pub fn name(self) -> &'static str {
        META_NAMES
            .iter()
            .find(|&&(_, kind)| kind == self)
            .map(|&(n, _)| n)
            .unwrap_or("<?>")
    }
}

/// What an option expects on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// no argument; sets true
    Flag,
    /// `-name` sets true, `-noname` sets false
    Negatable,
    /// `i`
    Int,
    /// `u`
    Unsigned,
    /// `l`
    Long,
    /// `d`
    Double,
    /// `I`: greedy list of ints
    IntArray,
    /// `D`: greedy list of doubles
    DoubleArray,
    /// `s`
    Str,
    /// `S`: greedy list of words up to the next option
    StrArray,
    /// `z`: a string followed by an int
    StrInt,
    /// `Z`: hands the argument to a callback
    Callback,
    /// `t`: hands the argument to a handler that may reject it
    Checked,
    Meta(MetaKind),
}

impl ArgType {
    /// Decode the character after `=`.
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'i' => ArgType::Int,
            'u' => ArgType::Unsigned,
            'l' => ArgType::Long,
            'd' => ArgType::Double,
            'I' => ArgType::IntArray,
            'D' => ArgType::DoubleArray,
            's' => ArgType::Str,
            'S' => ArgType::StrArray,
            'z' => ArgType::StrInt,
            'Z' => ArgType::Callback,
            't' => ArgType::Checked,
            _ => return None,
        })
    }
}

/// Split a specification into its name and argument type.
pub fn parse_spec(spec: &str) -> Result<(String, ArgType), String> {
    if spec.starts_with('<') {
        return MetaKind::from_name(spec)
            .map(|kind| (kind.name().to_string(), ArgType::Meta(kind)))
            .ok_or_else(|| format!("unknown special option '{}'", spec));
    }

    if let Some((name, code)) = spec.split_once('=') {
        if name.is_empty() {
            return Err(format!("option specification '{}' has no name", spec));
        }
        let mut chars = code.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => ArgType::from_code(c)
                .map(|t| (name.to_string(), t))
                .ok_or_else(|| format!("option '{}' has unknown type '{}'", name, c)),
            (None, _) => Err(format!("option '{}' is missing its type", name)),
            _ => Err(format!("option '{}' has unknown type '{}'", name, code)),
        };
    }

    match spec.strip_suffix('!') {
        Some("") => Err(format!("option specification '{}' has no name", spec)),
        Some(name) => Ok((name.to_string(), ArgType::Negatable)),
        None if spec.is_empty() => Err("empty option specification".to_string()),
        None => Ok((spec.to_string(), ArgType::Flag)),
    }
}

/// Receives the argument of a `t` option and may reject it.
///
/// The error string becomes a parse diagnostic, prefixed with the
/// command name.
pub trait OptionHandler {
    fn handle(&mut self, option: &str, value: &str) -> Result<(), String>;
}

impl<F> OptionHandler for F
where
    F: FnMut(&str, &str) -> Result<(), String>,
{
    fn handle(&mut self, option: &str, value: &str) -> Result<(), String> {
        self(option, value)
    }
}

/// Where a matched option's value is stored.
///
/// Lengths are maximum byte counts for strings and maximum element counts
/// for arrays. Callbacks are owned by the target and may borrow caller
/// state for `'a`. Array destinations are cleared when the table is compiled;
/// their length afterwards is the number of values parsed.
pub enum Target<'a> {
    /// Accept the option but store nothing.
    Unbound,
    Flag(&'a mut bool),
    Int(&'a mut i32),
    Unsigned(&'a mut u32),
    Long(&'a mut i64),
    Double(&'a mut f64),
    IntArray(&'a mut Vec<i32>, usize),
    DoubleArray(&'a mut Vec<f64>, usize),
    Str(&'a mut String, usize),
    StrArray(&'a mut Vec<String>, usize),
    /// String destination, its maximum length, and the int that follows it.
    StrInt(&'a mut String, usize, &'a mut i32),
    Callback(Box<dyn FnMut(&str, &str) + 'a>),
    Handler(Box<dyn OptionHandler + 'a>),
    /// Help or version text.
    Text(&'a str),
    /// Help or version callback.
    Action(Box<dyn FnMut() + 'a>),
}

impl Target<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            Target::Unbound => "nothing",
            Target::Flag(_) => "a flag",
            Target::Int(_) => "an int",
            Target::Unsigned(_) => "an unsigned int",
            Target::Long(_) => "a long",
            Target::Double(_) => "a double",
            Target::IntArray(..) => "an int array",
            Target::DoubleArray(..) => "a double array",
            Target::Str(..) => "a string",
            Target::StrArray(..) => "a string array",
            Target::StrInt(..) => "a string and int pair",
            Target::Callback(_) => "a callback",
            Target::Handler(_) => "a handler",
            Target::Text(_) => "a message",
            Target::Action(_) => "an action",
        }
    }

    /// Whether this destination can hold values of `kind`.
    pub fn accepts(&self, kind: ArgType) -> bool {
        use ArgType as A;
        use MetaKind as M;
        if matches!(self, Target::Unbound) {
            return true;
        }
        match kind {
            A::Flag | A::Negatable => matches!(self, Target::Flag(_)),
            A::Int | A::Meta(M::Integer) => matches!(self, Target::Int(_)),
            A::Unsigned => matches!(self, Target::Unsigned(_)),
            A::Long => matches!(self, Target::Long(_)),
            A::Double | A::Meta(M::Real) => matches!(self, Target::Double(_)),
            A::IntArray => matches!(self, Target::IntArray(..)),
            A::DoubleArray => matches!(self, Target::DoubleArray(..)),
            A::Str | A::Meta(M::Dsn) | A::Meta(M::Connstr) => matches!(self, Target::Str(..)),
            A::StrArray => matches!(self, Target::StrArray(..)),
            A::StrInt => matches!(self, Target::StrInt(..)),
            A::Callback => matches!(self, Target::Callback(_)),
            A::Checked => matches!(self, Target::Handler(_)),
            A::Meta(M::Help) | A::Meta(M::Version) => matches!(self, Target::Text(_)),
            A::Meta(M::HelpFunc) | A::Meta(M::VersFunc) => matches!(self, Target::Action(_)),
        }
    }

    /// Empty array destinations so counts start from zero.
    pub(crate) fn reset(&mut self) {
        match self {
            Target::IntArray(v, _) => v.clear(),
            Target::DoubleArray(v, _) => v.clear(),
            Target::StrArray(v, _) => v.clear(),
            _ => {}
        }
    }
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}
