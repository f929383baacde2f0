//! Per-type argument extraction.
//!
//! Each extractor validates the token(s) following a matched option,
//! writes the destination only once the whole value is known to be good,
//! and advances the cursor past what it consumed. Failures are recorded
//! in [`Ctx`] and reported to the caller as [`Reported`].

use crate::mode::Mode;
use crate::spec::{ArgType, Target};
use crate::table::OptionSpec;

/// Marker: the failure has already been recorded as a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reported;

pub(crate) type Extracted = Result<(), Reported>;

/// Per-call state shared by every extractor.
#[derive(Debug)]
pub(crate) struct Ctx<'c> {
    pub cmd: &'c str,
    pub mode: Mode,
    pub messages: Vec<String>,
    /// A `<DSN>` or `<CONNSTR>` is registered.
    pub wants_connection: bool,
    pub got_dsn: bool,
    pub got_connstr: bool,
}

impl<'c> Ctx<'c> {
    pub fn new(cmd: &'c str, mode: Mode) -> Self {
        Ctx {
            cmd,
            mode,
            messages: Vec::new(),
            wants_connection: false,
            got_dsn: false,
            got_connstr: false,
        }
    }

    /// Record a diagnostic (prefixed with the command name).
    pub fn fail(&mut self, msg: impl std::fmt::Display) -> Reported {
        let line = format!("{}: {}", self.cmd, msg);
        if self.mode.contains(Mode::PRINT_ERRS) {
            eprintln!("{}", line);
        }
        tracing::debug!(error = %line, "option diagnostic");
        self.messages.push(line);
        Reported
    }

    /// Compare an option name with a fixed keyword under the mode's case rules.
    pub fn names_equal(&self, name: &str, keyword: &str) -> bool {
        if self.mode.contains(Mode::CASE_SENSITIVE) {
            name == keyword
        } else {
            name.eq_ignore_ascii_case(keyword)
        }
    }

    /// The last token is held back for an unresolved DSN/connection string.
    fn reserve_last(&self) -> bool {
        self.wants_connection && !(self.got_dsn || self.got_connstr)
    }
}

/// Does `token` start another option?
pub(crate) fn looks_like_option(token: &str) -> bool {
    token.starts_with('-') || (cfg!(windows) && token.starts_with('/'))
}

// -- Dispatch ----------------------------------------------------------------

/// Handle a matched option. `opt` is the name as typed (for messages),
/// `negate` is set for the `no`-prefixed form, `inline` is the value of
/// an `--opt=value` token.
pub(crate) fn extract(
    spec: &mut OptionSpec,
    opt: &str,
    args: &[&str],
    idx: &mut usize,
    negate: bool,
    inline: Option<&str>,
    ctx: &mut Ctx,
) -> Extracted {
    tracing::debug!(option = %spec.display, typed = opt, "matched option");
    match spec.kind {
        ArgType::Flag | ArgType::Negatable => {
            if inline.is_some() {
                return Err(ctx.fail(format_args!("option {} does not take an argument", opt)));
            }
            if let Target::Flag(dest) = &mut spec.target {
                **dest = !negate;
            }
            Ok(())
        }
        ArgType::Int | ArgType::Unsigned | ArgType::Long | ArgType::Double => {
            numeric(spec, opt, args, idx, inline, ctx)
        }
        ArgType::IntArray | ArgType::DoubleArray => numeric_array(spec, opt, args, idx, inline, ctx),
        ArgType::StrArray => string_array(spec, opt, args, idx, inline, ctx),
        ArgType::Str => copy_string(spec, opt, args, idx, inline, ctx),
        ArgType::StrInt => string_int(spec, opt, args, idx, inline, ctx),
        ArgType::Callback | ArgType::Checked => callback(spec, opt, args, idx, inline, ctx),
        ArgType::Meta(kind) => Err(ctx.fail(format_args!(
            "option {} cannot be given directly ({})",
            opt,
            kind.name()
        ))),
    }
}

/// The option's value: the inline part of `--opt=value`, or the next token.
/// The cursor is not moved.
fn peek_value<'v>(
    opt: &str,
    args: &[&'v str],
    idx: usize,
    inline: Option<&'v str>,
    ctx: &mut Ctx,
) -> Result<&'v str, Reported> {
    if let Some(value) = inline {
        return Ok(value);
    }
    args.get(idx)
        .copied()
        .ok_or_else(|| ctx.fail(format_args!("option {} missing argument", opt)))
}

fn advance(idx: &mut usize, inline: Option<&str>) {
    if inline.is_none() {
        *idx += 1;
    }
}

// -- Scalars -----------------------------------------------------------------

fn numeric(
    spec: &mut OptionSpec,
    opt: &str,
    args: &[&str],
    idx: &mut usize,
    inline: Option<&str>,
    ctx: &mut Ctx,
) -> Extracted {
    let text = peek_value(opt, args, *idx, inline, ctx)?;
    let number = match spec.kind {
        ArgType::Int => parse_int(text).map(Number::Int),
        ArgType::Unsigned => parse_unsigned(text).map(Number::Unsigned),
        ArgType::Long => parse_long(text).map(Number::Long),
        _ => parse_double(text).map(Number::Double),
    };
    match number {
        Ok(n) => {
            n.store(&mut spec.target);
            advance(idx, inline);
            Ok(())
        }
        Err(err) => Err(numeric_failure(ctx, opt, text, err)),
    }
}

pub(crate) fn copy_string(
    spec: &mut OptionSpec,
    opt: &str,
    args: &[&str],
    idx: &mut usize,
    inline: Option<&str>,
    ctx: &mut Ctx,
) -> Extracted {
    let value = peek_value(opt, args, *idx, inline, ctx)?;
    if let Target::Str(dest, max_len) = &mut spec.target {
        if value.len() > *max_len {
            return Err(too_long(ctx, opt, *max_len));
        }
        dest.clear();
        dest.push_str(value);
    }
    advance(idx, inline);
    Ok(())
}

/// Store `value` into a string destination without consuming tokens.
/// Returns the limit when the value does not fit.
pub(crate) fn store_string(target: &mut Target, value: &str) -> Result<(), usize> {
    if let Target::Str(dest, max_len) = target {
        if value.len() > *max_len {
            return Err(*max_len);
        }
        dest.clear();
        dest.push_str(value);
    }
    Ok(())
}

pub(crate) fn too_long(ctx: &mut Ctx, opt: &str, max_len: usize) -> Reported {
    ctx.fail(format_args!("option {} is too long (max {})", opt, max_len))
}

/// `z`: a string followed by an int. Both are validated before either is
/// stored.
fn string_int(
    spec: &mut OptionSpec,
    opt: &str,
    args: &[&str],
    idx: &mut usize,
    inline: Option<&str>,
    ctx: &mut Ctx,
) -> Extracted {
    let (text, number_pos) = match inline {
        Some(text) => (text, *idx),
        None => match args.get(*idx) {
            Some(text) => (*text, *idx + 1),
            None => return Err(ctx.fail(format_args!("option {} missing argument", opt))),
        },
    };
    let Some(&number_text) = args.get(number_pos) else {
        return Err(ctx.fail(format_args!("option {} missing argument", opt)));
    };
    if let Target::StrInt(_, max_len, _) = &spec.target {
        if text.len() > *max_len {
            return Err(too_long(ctx, opt, *max_len));
        }
    }
    let number = parse_int(number_text).map_err(|err| numeric_failure(ctx, opt, number_text, err))?;
    if let Target::StrInt(dest, _, dest_number) = &mut spec.target {
        dest.clear();
        dest.push_str(text);
        **dest_number = number;
    }
    *idx = number_pos + 1;
    Ok(())
}

fn callback(
    spec: &mut OptionSpec,
    opt: &str,
    args: &[&str],
    idx: &mut usize,
    inline: Option<&str>,
    ctx: &mut Ctx,
) -> Extracted {
    let value = peek_value(opt, args, *idx, inline, ctx)?;
    advance(idx, inline);
    match &mut spec.target {
        Target::Callback(f) => {
            (**f)(&spec.display, value);
            Ok(())
        }
        Target::Handler(h) => h.handle(&spec.display, value).map_err(|msg| ctx.fail(msg)),
        _ => Ok(()),
    }
}

// -- Arrays ------------------------------------------------------------------

/// `I` / `D`: consume tokens while they parse as the element type.
fn numeric_array(
    spec: &mut OptionSpec,
    opt: &str,
    args: &[&str],
    idx: &mut usize,
    inline: Option<&str>,
    ctx: &mut Ctx,
) -> Extracted {
    let empty_ok = ctx.mode.contains(Mode::EMPTY_LIST_OK);
    if inline.is_none() && *idx >= args.len() {
        if empty_ok {
            return Ok(());
        }
        return Err(ctx.fail(format_args!("option {} missing argument", opt)));
    }

    let mut pending = inline;
    let mut added = 0usize;
    loop {
        let (token, from_inline) = match pending.take() {
            Some(value) => (value, true),
            None => match args.get(*idx) {
                Some(token) => (*token, false),
                None => break,
            },
        };
        let number = match spec.kind {
            ArgType::IntArray => parse_int(token).map(Number::Int),
            _ => parse_double(token).map(Number::Double),
        };
        let Ok(number) = number else {
            if added == 0 && !empty_ok {
                return Err(ctx.fail(format_args!("No arguments to {}", spec.display)));
            }
            break;
        };
        push_element(spec, number.into_element(), ctx)?;
        if !from_inline {
            *idx += 1;
        }
        added += 1;
    }
    Ok(())
}

/// `S`: consume tokens up to the next option-looking token.
fn string_array(
    spec: &mut OptionSpec,
    opt: &str,
    args: &[&str],
    idx: &mut usize,
    inline: Option<&str>,
    ctx: &mut Ctx,
) -> Extracted {
    let empty_ok = ctx.mode.contains(Mode::EMPTY_LIST_OK);
    if inline.is_none() && *idx >= args.len() {
        if empty_ok {
            return Ok(());
        }
        return Err(ctx.fail(format_args!("option {} missing argument", opt)));
    }

    let limit = if ctx.reserve_last() {
        args.len().saturating_sub(1)
    } else {
        args.len()
    };
    let mut added = 0usize;
    if let Some(value) = inline {
        push_element(spec, Element::Str(value), ctx)?;
        added += 1;
    }
    while *idx < limit {
        let token = args[*idx];
        if looks_like_option(token) {
            if added == 0 && !empty_ok {
                return Err(ctx.fail(format_args!("No arguments to {}", spec.display)));
            }
            break;
        }
        push_element(spec, Element::Str(token), ctx)?;
        *idx += 1;
        added += 1;
    }
    Ok(())
}

enum Element<'v> {
    Int(i32),
    Double(f64),
    Str(&'v str),
}

fn push_element(spec: &mut OptionSpec, element: Element, ctx: &mut Ctx) -> Extracted {
    let (len, cap) = match &spec.target {
        Target::IntArray(v, cap) => (v.len(), *cap),
        Target::DoubleArray(v, cap) => (v.len(), *cap),
        Target::StrArray(v, cap) => (v.len(), *cap),
        _ => return Ok(()),
    };
    if len >= cap {
        return Err(ctx.fail(format_args!(
            "too many {} options specified",
            spec.display
        )));
    }
    match (&mut spec.target, element) {
        (Target::IntArray(v, _), Element::Int(n)) => v.push(n),
        (Target::DoubleArray(v, _), Element::Double(d)) => v.push(d),
        (Target::StrArray(v, _), Element::Str(s)) => v.push(s.to_string()),
        _ => {}
    }
    Ok(())
}

// -- Numeric conversion ------------------------------------------------------

/// Why a token is not a valid number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumError {
    /// No digits at all.
    Bad,
    /// Digits followed by something else.
    Trailing,
    /// Does not fit the destination.
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i32),
    Unsigned(u32),
    Long(i64),
    Double(f64),
}

impl Number {
    pub fn store(self, target: &mut Target) {
        match (target, self) {
            (Target::Int(d), Number::Int(n)) => **d = n,
            (Target::Unsigned(d), Number::Unsigned(n)) => **d = n,
            (Target::Long(d), Number::Long(n)) => **d = n,
            (Target::Double(d), Number::Double(n)) => **d = n,
            _ => {}
        }
    }

    fn into_element(self) -> Element<'static> {
        match self {
            Number::Double(d) => Element::Double(d),
            Number::Int(n) => Element::Int(n),
            Number::Unsigned(n) => Element::Int(n as i32),
            Number::Long(n) => Element::Int(n as i32),
        }
    }
}

pub(crate) fn numeric_failure(ctx: &mut Ctx, opt: &str, text: &str, err: NumError) -> Reported {
    match err {
        NumError::Bad => ctx.fail(format_args!(
            "option {}: bad numeric argument '{}'",
            opt, text
        )),
        NumError::Trailing => ctx.fail(format_args!(
            "option {}: trailing garbage in numeric argument '{}'",
            opt, text
        )),
        NumError::Range => ctx.fail(format_args!(
            "option {}: numeric argument '{}' out of range",
            opt, text
        )),
    }
}

/// Integer in C `strtol(.., 0)` notation: optional whitespace and sign,
/// then decimal, `0x` hex, or leading-zero octal. The whole token must be
/// consumed.
fn parse_integer(text: &str) -> Result<i128, NumError> {
    let s = text.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) if hex.starts_with(|c: char| c.is_ascii_hexdigit()) => (16, hex),
        _ if s.starts_with('0') => (8, s),
        _ => (10, s),
    };
    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if end == 0 {
        return Err(NumError::Bad);
    }
    let mut value: u128 = 0;
    for c in digits[..end].chars() {
        let d = c.to_digit(radix).unwrap_or(0) as u128;
        value = value
            .checked_mul(radix as u128)
            .and_then(|v| v.checked_add(d))
            .filter(|&v| v <= i64::MAX as u128 + 1)
            .ok_or(NumError::Range)?;
    }
    if end < digits.len() {
        return Err(NumError::Trailing);
    }
    let value = value as i128;
    Ok(if negative { -value } else { value })
}

pub(crate) fn parse_int(text: &str) -> Result<i32, NumError> {
    parse_integer(text).and_then(|v| i32::try_from(v).map_err(|_| NumError::Range))
}

pub(crate) fn parse_unsigned(text: &str) -> Result<u32, NumError> {
    parse_integer(text).and_then(|v| u32::try_from(v).map_err(|_| NumError::Range))
}

pub(crate) fn parse_long(text: &str) -> Result<i64, NumError> {
    parse_integer(text).and_then(|v| i64::try_from(v).map_err(|_| NumError::Range))
}

/// Floating point in C `strtod` notation (no hex floats).
pub(crate) fn parse_double(text: &str) -> Result<f64, NumError> {
    let s = text.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let end = float_prefix_len(s);
    if end == 0 {
        return Err(NumError::Bad);
    }
    let value: f64 = s[..end].parse().map_err(|_| NumError::Bad)?;
    if end < s.len() {
        return Err(NumError::Trailing);
    }
    if value.is_infinite() && !s.bytes().any(|b| b.eq_ignore_ascii_case(&b'i')) {
        return Err(NumError::Range);
    }
    // Underflow: a non-zero mantissa that came out zero or subnormal.
    if value.is_finite() && !value.is_normal() {
        let mantissa = s.split(|c| c == 'e' || c == 'E').next().unwrap_or("");
        if mantissa.bytes().any(|b| (b'1'..=b'9').contains(&b)) {
            return Err(NumError::Range);
        }
    }
    Ok(value)
}

/// Length of the longest prefix of `s` that reads as a float.
fn float_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i = 1;
    }
    for word in ["infinity", "inf", "nan"] {
        let w = word.as_bytes();
        if b.len() >= i + w.len() && b[i..i + w.len()].eq_ignore_ascii_case(w) {
            return i + w.len();
        }
    }
    let digits_from = |mut j: usize| {
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        j
    };
    let int_end = digits_from(i);
    let mut has_digits = int_end > i;
    let mut end = int_end;
    if end < b.len() && b[end] == b'.' {
        let frac_end = digits_from(end + 1);
        if has_digits || frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return 0;
    }
    if end < b.len() && (b[end] == b'e' || b[end] == b'E') {
        let mut j = end + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            end = exp_end;
        }
    }
    end
}
