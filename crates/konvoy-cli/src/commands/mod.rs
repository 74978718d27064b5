//! CLI commands

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::Result;

pub mod generate;
pub mod profiles;
pub mod validate;

/// Output encoding for generated documents
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML document
    #[default]
    Yaml,
    /// Pretty-printed JSON
    Json,
}

/// Encode `value` in `format`
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(value)?;
            json.push('\n');
            json
        }
    })
}

/// Write `value` to stdout in `format`
pub fn print<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = render(value, format)?;
    std::io::stdout().lock().write_all(rendered.as_bytes())?;
    Ok(())
}
