//! Parse outcome as handed to the renderers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::slots::{Slots, Value};

#[derive(Debug, Serialize)]
pub struct Report {
    /// Index of the first unconsumed argument (argv numbering).
    pub index: usize,
    /// Arguments from `index` on.
    pub remaining: Vec<String>,
    pub values: BTreeMap<String, Value>,
    /// `[option, value]` for each callback option, in order.
    pub calls: Vec<(String, String)>,
    /// `<HELPFUNC>` fired.
    pub help: bool,
    /// `<VERSFUNC>` fired.
    pub version: bool,
}

impl Report {
    pub fn new(slots: Slots, index: usize, args: &[String]) -> Self {
        let values = slots
            .slots
            .into_iter()
            .filter(|slot| slot.reportable())
            .map(|slot| (slot.key, slot.value))
            .collect();
        Report {
            index,
            remaining: args.get(index..).unwrap_or(&[]).to_vec(),
            values,
            calls: slots.calls.into_inner(),
            help: slots.help.get(),
            version: slots.version.get(),
        }
    }
}
