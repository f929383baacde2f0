//! Shell assignments, for `eval "$(ttopt ...)"`.
//!
//! Option names become variable names with dashes turned into
//! underscores. Arrays use bash array syntax.

use anyhow::Result;

use crate::render::Renderer;
use crate::report::Report;
use crate::slots::Value;

pub struct ShellRenderer;

impl Renderer for ShellRenderer {
    fn render(&self, report: &Report) -> Result<String> {
        let mut out = String::new();
        for (name, value) in &report.values {
            let var = field_name(name);
            let rhs = match value {
                Value::Flag(b) => (if *b { "1" } else { "0" }).to_string(),
                Value::Int(n) => n.to_string(),
                Value::Unsigned(n) => n.to_string(),
                Value::Long(n) => n.to_string(),
                Value::Double(d) => d.to_string(),
                Value::Str(s) => quote(s),
                Value::Ints(v) => array(v.iter().map(|n| n.to_string())),
                Value::Doubles(v) => array(v.iter().map(|d| d.to_string())),
                Value::Strs(v) => array(v.iter().map(|s| quote(s))),
                Value::StrInt(s, n) => array([quote(s), n.to_string()].into_iter()),
                Value::None => continue,
            };
            out.push_str(&format!("{}={}\n", var, rhs));
        }
        if !report.calls.is_empty() {
            let calls = report
                .calls
                .iter()
                .flat_map(|(opt, val)| [quote(opt), quote(val)]);
            out.push_str(&format!("CALLS={}\n", array(calls)));
        }
        out.push_str(&format!("OPTIND={}\n", report.index));
        Ok(out)
    }
}

/// Variable name for an option: dashes become underscores.
fn field_name(name: &str) -> String {
    name.replace('-', "_")
}

/// Single-quote `s` for the shell.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn array(items: impl Iterator<Item = String>) -> String {
    format!("({})", items.collect::<Vec<_>>().join(" "))
}
