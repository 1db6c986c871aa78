//! `printmon config` — effective settings.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use printmon_core::Settings;

use crate::GlobalArgs;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the settings in effect and where they came from.
    Show {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn run(command: ConfigCommand, global: &GlobalArgs) -> Result<()> {
    match command {
        ConfigCommand::Show { json } => {
            let (settings, source) = Settings::discover(global.config.as_deref())
                .context("failed to load settings")?;
            let source = source
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "built-in defaults".to_string());

            if json {
                let payload = serde_json::json!({
                    "source": source,
                    "settings": settings,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&payload)
                        .context("failed to render settings JSON")?
                );
                return Ok(());
            }

            let value = serde_json::to_value(&settings).context("failed to serialize settings")?;
            let rows = flatten(&value);
            println!("{} {}", "Settings from".bold(), source);
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
    }
    Ok(())
}

/// Dotted key/value rows, one per scalar.
fn flatten(value: &Value) -> Vec<SettingRow> {
    let mut rows = Vec::new();
    flatten_into(String::new(), value, &mut rows);
    rows
}

fn flatten_into(prefix: String, value: &Value, rows: &mut Vec<SettingRow>) {
    let child = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, value) in map {
                flatten_into(child(key), value, rows);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(child(&index.to_string()), item, rows);
            }
        }
        Value::String(text) => rows.push(SettingRow {
            key: prefix,
            value: text.clone(),
        }),
        other => rows.push(SettingRow {
            key: prefix,
            value: other.to_string(),
        }),
    }
}
