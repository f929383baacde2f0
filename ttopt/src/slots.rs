//! Owned storage for options declared on the command line.
//!
//! Each `-o SPEC` becomes a [`Slot`]: the library specification, the
//! capacity, and a value cell. [`Slots::table`] lends the cells to an
//! [`OptionTable`] for one parse call; afterwards the values are read back
//! for the report.

use std::cell::{Cell, RefCell};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use ttgetopt::spec::parse_spec;
use ttgetopt::{ArgType, MetaKind, OptionTable, Target};

pub const DEFAULT_STRING_LEN: usize = 256;
pub const DEFAULT_ARRAY_LEN: usize = 64;

/// A parsed value. Serializes as the bare JSON value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Flag(bool),
    Int(i32),
    Unsigned(u32),
    Long(i64),
    Double(f64),
    Ints(Vec<i32>),
    Doubles(Vec<f64>),
    Str(String),
    Strs(Vec<String>),
    StrInt(String, i32),
    /// Callbacks, help and version: nothing to report.
    None,
}

#[derive(Debug)]
pub struct Slot {
    /// Specification handed to the library, e.g. `n=i` or `<DSN>`.
    pub spec: String,
    /// Key in the report: the option name, or the special name in lower
    /// case without brackets.
    pub key: String,
    pub kind: ArgType,
    pub cap: usize,
    pub value: Value,
}

impl Slot {
    /// Parse `name[=type[,len]]`, `name!` or `<META>[,len]`.
    pub fn parse(text: &str) -> Result<Self> {
        let (spec, cap) = match text.rsplit_once(',') {
            Some((spec, len)) => {
                let cap = len
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("bad length in option spec '{}'", text))?;
                (spec, Some(cap))
            }
            None => (text, None),
        };
        let (name, kind) = parse_spec(spec).map_err(anyhow::Error::msg)?;

        let key = match kind {
            ArgType::Meta(meta) => meta
                .name()
                .trim_matches(|c: char| c == '<' || c == '>')
                .to_ascii_lowercase(),
            _ => name,
        };
        let value = initial_value(kind);
        let default_cap = match kind {
            ArgType::IntArray | ArgType::DoubleArray | ArgType::StrArray => DEFAULT_ARRAY_LEN,
            _ => DEFAULT_STRING_LEN,
        };
        if cap.is_some() && !takes_length(kind) {
            bail!("option spec '{}' does not take a length", text);
        }

        Ok(Slot {
            spec: spec.to_string(),
            key,
            kind,
            cap: cap.unwrap_or(default_cap),
            value,
        })
    }

    /// Whether the slot has anything to report.
    pub fn reportable(&self) -> bool {
        !matches!(self.value, Value::None)
    }
}

fn takes_length(kind: ArgType) -> bool {
    matches!(
        kind,
        ArgType::Str
            | ArgType::StrArray
            | ArgType::StrInt
            | ArgType::IntArray
            | ArgType::DoubleArray
            | ArgType::Meta(MetaKind::Dsn)
            | ArgType::Meta(MetaKind::Connstr)
    )
}

fn initial_value(kind: ArgType) -> Value {
    match kind {
        ArgType::Flag | ArgType::Negatable => Value::Flag(false),
        ArgType::Int | ArgType::Meta(MetaKind::Integer) => Value::Int(0),
        ArgType::Unsigned => Value::Unsigned(0),
        ArgType::Long => Value::Long(0),
        ArgType::Double | ArgType::Meta(MetaKind::Real) => Value::Double(0.0),
        ArgType::IntArray => Value::Ints(Vec::new()),
        ArgType::DoubleArray => Value::Doubles(Vec::new()),
        ArgType::Str | ArgType::Meta(MetaKind::Dsn) | ArgType::Meta(MetaKind::Connstr) => {
            Value::Str(String::new())
        }
        ArgType::StrArray => Value::Strs(Vec::new()),
        ArgType::StrInt => Value::StrInt(String::new(), 0),
        _ => Value::None,
    }
}

/// All declared options plus what the callbacks observed.
#[derive(Debug, Default)]
pub struct Slots {
    pub slots: Vec<Slot>,
    /// Help text for `<HELP>`.
    pub usage: String,
    /// Version text for `<VERSION>`; the product version when unset.
    pub release: Option<String>,
    /// `Z` and `t` arguments in the order they were seen.
    pub calls: RefCell<Vec<(String, String)>>,
    pub help: Cell<bool>,
    pub version: Cell<bool>,
}

impl Slots {
    pub fn new(specs: &[String], usage: String, release: Option<String>) -> Result<Self> {
        let slots = specs
            .iter()
            .map(|s| Slot::parse(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(Slots {
            slots,
            usage,
            release,
            ..Default::default()
        })
    }

    /// Lend every slot to a fresh option table.
    pub fn table(&mut self) -> OptionTable<'_> {
        let Slots {
            slots,
            usage,
            release,
            calls,
            help,
            version,
        } = self;
        let (calls, help, version) = (&*calls, &*help, &*version);
        let (usage, release) = (usage.as_str(), release.as_deref());

        let mut table = OptionTable::new();
        for slot in slots.iter_mut() {
            let target = match (slot.kind, &mut slot.value) {
                (ArgType::Callback, _) => Target::Callback(Box::new(move |opt: &str, val: &str| {
                    calls.borrow_mut().push((opt.to_string(), val.to_string()));
                })),
                (ArgType::Checked, _) => Target::Handler(Box::new(
                    move |opt: &str, val: &str| -> Result<(), String> {
                        if val.is_empty() {
                            return Err(format!("option {} requires a non-empty value", opt));
                        }
                        calls.borrow_mut().push((opt.to_string(), val.to_string()));
                        Ok(())
                    },
                )),
                (ArgType::Meta(MetaKind::Help), _) => Target::Text(usage),
                (ArgType::Meta(MetaKind::Version), _) => match release {
                    Some(text) => Target::Text(text),
                    None => Target::Unbound,
                },
                (ArgType::Meta(MetaKind::HelpFunc), _) => {
                    Target::Action(Box::new(move || help.set(true)))
                }
                (ArgType::Meta(MetaKind::VersFunc), _) => {
                    Target::Action(Box::new(move || version.set(true)))
                }
                (_, value) => value_target(value, slot.cap),
            };
            table.push(slot.spec.as_str(), target);
        }
        table
    }
}

fn value_target(value: &mut Value, cap: usize) -> Target<'_> {
    match value {
        Value::Flag(b) => Target::Flag(b),
        Value::Int(n) => Target::Int(n),
        Value::Unsigned(n) => Target::Unsigned(n),
        Value::Long(n) => Target::Long(n),
        Value::Double(d) => Target::Double(d),
        Value::Ints(v) => Target::IntArray(v, cap),
        Value::Doubles(v) => Target::DoubleArray(v, cap),
        Value::Str(s) => Target::Str(s, cap),
        Value::Strs(v) => Target::StrArray(v, cap),
        Value::StrInt(s, n) => Target::StrInt(s, cap, n),
        Value::None => Target::Unbound,
    }
}
