//! Output formats for a [`Report`].

pub mod json;
pub mod shell;

use anyhow::{anyhow, Result};

use crate::report::Report;

pub trait Renderer {
    fn render(&self, report: &Report) -> Result<String>;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "json" => Ok(Box::new(json::JsonRenderer)),
        "shell" | "sh" => Ok(Box::new(shell::ShellRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use json or shell", format)),
    }
}
