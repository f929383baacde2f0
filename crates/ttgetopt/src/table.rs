//! Option registration and lookup.
//!
//! [`OptionTable`] is what callers build. When a parse call starts it is
//! compiled into a [`Registry`]: names folded per the mode, duplicates
//! rejected, destinations paired with their types, and the multi-character
//! names indexed in sorted order for exact and abbreviated lookup.

use crate::spec::{parse_spec, ArgType, MetaKind, OptionHandler, Target};
use std::borrow::Cow;

/// Ordered list of option specifications and their destinations.
///
/// Registration order is preserved; it decides which special option
/// wins when several could match the same token.
#[derive(Debug, Default)]
pub struct OptionTable<'a> {
    entries: Vec<(String, Target<'a>)>,
}

impl<'a> OptionTable<'a> {
    pub fn new() -> Self {
        OptionTable { entries: Vec::new() }
    }

    /// Register `spec` (see [`crate::spec`]) with its destination.
    /// Problems are reported when the table is used, not here.
    pub fn add(mut self, spec: impl Into<String>, target: Target<'a>) -> Self {
        self.push(spec, target);
        self
    }

    /// Non-consuming form of [`OptionTable::add`].
    pub fn push(&mut self, spec: impl Into<String>, target: Target<'a>) {
        self.entries.push((spec.into(), target));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn flag(self, name: &str, dest: &'a mut bool) -> Self {
        self.add(name, Target::Flag(dest))
    }

    pub fn negatable(self, name: &str, dest: &'a mut bool) -> Self {
        self.add(format!("{}!", name), Target::Flag(dest))
    }

    pub fn int(self, name: &str, dest: &'a mut i32) -> Self {
        self.add(format!("{}=i", name), Target::Int(dest))
    }

    pub fn unsigned(self, name: &str, dest: &'a mut u32) -> Self {
        self.add(format!("{}=u", name), Target::Unsigned(dest))
    }

    pub fn long(self, name: &str, dest: &'a mut i64) -> Self {
        self.add(format!("{}=l", name), Target::Long(dest))
    }

    pub fn double(self, name: &str, dest: &'a mut f64) -> Self {
        self.add(format!("{}=d", name), Target::Double(dest))
    }

    pub fn int_array(self, name: &str, dest: &'a mut Vec<i32>, cap: usize) -> Self {
        self.add(format!("{}=I", name), Target::IntArray(dest, cap))
    }

    pub fn double_array(self, name: &str, dest: &'a mut Vec<f64>, cap: usize) -> Self {
        self.add(format!("{}=D", name), Target::DoubleArray(dest, cap))
    }

    pub fn string(self, name: &str, dest: &'a mut String, max_len: usize) -> Self {
        self.add(format!("{}=s", name), Target::Str(dest, max_len))
    }

    pub fn string_array(self, name: &str, dest: &'a mut Vec<String>, cap: usize) -> Self {
        self.add(format!("{}=S", name), Target::StrArray(dest, cap))
    }

    pub fn string_int(
        self,
        name: &str,
        text: &'a mut String,
        max_len: usize,
        number: &'a mut i32,
    ) -> Self {
        self.add(format!("{}=z", name), Target::StrInt(text, max_len, number))
    }

    /// `f` receives the option name and its argument.
    pub fn callback(self, name: &str, f: impl FnMut(&str, &str) + 'a) -> Self {
        self.add(format!("{}=Z", name), Target::Callback(Box::new(f)))
    }

    /// Like [`OptionTable::callback`], but the handler may reject the value.
    pub fn handler(self, name: &str, h: impl OptionHandler + 'a) -> Self {
        self.add(format!("{}=t", name), Target::Handler(Box::new(h)))
    }

    pub fn dsn(self, dest: &'a mut String, max_len: usize) -> Self {
        self.add("<DSN>", Target::Str(dest, max_len))
    }

    pub fn connstr(self, dest: &'a mut String, max_len: usize) -> Self {
        self.add("<CONNSTR>", Target::Str(dest, max_len))
    }

    /// `-h`, `-help`, `-?` print `text` with `<CMD>` replaced.
    pub fn help(self, text: &'a str) -> Self {
        self.add("<HELP>", Target::Text(text))
    }

    /// `-V`, `-version` print `text`, or the product version name.
    pub fn version(self, text: Option<&'a str>) -> Self {
        let target = text.map(Target::Text).unwrap_or(Target::Unbound);
        self.add("<VERSION>", target)
    }

    pub fn help_fn(self, f: impl FnMut() + 'a) -> Self {
        self.add("<HELPFUNC>", Target::Action(Box::new(f)))
    }

    pub fn version_fn(self, f: impl FnMut() + 'a) -> Self {
        self.add("<VERSFUNC>", Target::Action(Box::new(f)))
    }

    /// A bare numeric option such as `-20`.
    pub fn integer(self, dest: &'a mut i32) -> Self {
        self.add("<INTEGER>", Target::Int(dest))
    }

    pub fn real(self, dest: &'a mut f64) -> Self {
        self.add("<REAL>", Target::Double(dest))
    }
}

// -- Compiled form -----------------------------------------------------------

/// One registered option.
#[derive(Debug)]
pub(crate) struct OptionSpec<'a> {
    /// Name used for matching (folded unless case-sensitive or one char).
    pub name: String,
    /// Name as registered, for messages.
    pub display: String,
    pub kind: ArgType,
    pub target: Target<'a>,
}

/// Per-call view of an [`OptionTable`].
#[derive(Debug)]
pub(crate) struct Registry<'a> {
    pub specs: Vec<OptionSpec<'a>>,
    /// Multi-character, non-special specs, sorted by name.
    sorted: Vec<usize>,
    singles: Vec<usize>,
    metas: Vec<usize>,
    pub dsn: Option<usize>,
    pub connstr: Option<usize>,
    case_sensitive: bool,
}

impl<'a> Registry<'a> {
    /// Validate and index `table`. Every problem found is returned.
    pub fn compile(
        table: OptionTable<'a>,
        case_sensitive: bool,
        cmd: &str,
    ) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        let mut specs: Vec<OptionSpec<'a>> = Vec::with_capacity(table.entries.len());

        for (raw, mut target) in table.entries {
            let (display, kind) = match parse_spec(&raw) {
                Ok(parsed) => parsed,
                Err(msg) => {
                    errors.push(format!("{}: {}", cmd, msg));
                    continue;
                }
            };
            if !target.accepts(kind) {
                errors.push(format!(
                    "{}: option '{}' cannot store into {}",
                    cmd,
                    display,
                    target.describe()
                ));
                continue;
            }
            let name = fold_name(&display, case_sensitive, kind).into_owned();
            if specs.iter().any(|s| s.name == name) {
                errors.push(format!("{}: option '{}' is a duplicate", cmd, display));
                continue;
            }
            target.reset();
            specs.push(OptionSpec {
                name,
                display,
                kind,
                target,
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut sorted = Vec::new();
        let mut singles = Vec::new();
        let mut metas = Vec::new();
        let mut dsn = None;
        let mut connstr = None;
        for (i, spec) in specs.iter().enumerate() {
            match spec.kind {
                ArgType::Meta(kind) => {
                    match kind {
                        MetaKind::Dsn => dsn = Some(i),
                        MetaKind::Connstr => connstr = Some(i),
                        _ => {}
                    }
                    metas.push(i);
                }
                _ if spec.name.chars().count() == 1 => singles.push(i),
                _ => sorted.push(i),
            }
        }
        sorted.sort_by(|&a, &b| specs[a].name.cmp(&specs[b].name));

        Ok(Registry {
            specs,
            sorted,
            singles,
            metas,
            dsn,
            connstr,
            case_sensitive,
        })
    }

    /// Number of specs in the sorted (abbreviation) index.
    #[cfg(test)]
    pub fn indexed_len(&self) -> usize {
        self.sorted.len()
    }

    /// Special options in registration order.
    pub fn metas(&self) -> &[usize] {
        &self.metas
    }

    /// Single-character option named `c`.
    pub fn single(&self, c: char) -> Option<usize> {
        self.singles
            .iter()
            .copied()
            .find(|&i| self.specs[i].name.chars().next() == Some(c))
    }

    /// Option whose name is exactly `name` (after folding).
    pub fn exact(&self, name: &str) -> Option<usize> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return self.single(c);
        }
        let folded = self.fold(name);
        let key: &str = &folded;
        self.sorted
            .binary_search_by(|&i| self.specs[i].name.as_str().cmp(key))
            .ok()
            .map(|pos| self.sorted[pos])
    }

    /// Option uniquely identified by `prefix`. Ambiguous or unknown
    /// prefixes give `None`.
    pub fn abbrev(&self, prefix: &str) -> Option<usize> {
        if prefix.is_empty() {
            return None;
        }
        let folded = self.fold(prefix);
        let key: &str = &folded;
        let start = self
            .sorted
            .partition_point(|&i| self.specs[i].name.as_str() < key);
        let mut hits = self.sorted[start..]
            .iter()
            .take_while(|&&i| self.specs[i].name.starts_with(key));
        match (hits.next(), hits.next()) {
            (Some(&i), None) => Some(i),
            _ => None,
        }
    }

    fn fold<'s>(&self, s: &'s str) -> Cow<'s, str> {
        if self.case_sensitive {
            Cow::Borrowed(s)
        } else {
            Cow::Owned(s.to_ascii_lowercase())
        }
    }
}

fn fold_name(name: &str, case_sensitive: bool, kind: ArgType) -> Cow<'_, str> {
    if case_sensitive || matches!(kind, ArgType::Meta(_)) || name.chars().count() == 1 {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.to_ascii_lowercase())
    }
}
