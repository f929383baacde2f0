//! JSON output for tooling.

use anyhow::{Context, Result};

use crate::render::Renderer;
use crate::report::Report;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, report: &Report) -> Result<String> {
        let mut out = serde_json::to_string_pretty(report).context("failed to encode report")?;
        out.push('\n');
        Ok(out)
    }
}
