use clap::{Parser, Subcommand};
use std::collections::HashMap;

#[derive(Parser, Debug)]
#[command(name = "tasktrack", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasktrack add "Buy milk"
    Add {
        description: Option<String>,
    },
    /// Update a task's description
    ///
    /// Example: tasktrack update 1 "Buy milk and eggs"
    Update {
        id: String,
        description: String,
    },
    /// Delete a task
    ///
    /// Example: tasktrack delete 1
    Delete {
        id: String,
    },
    /// Set a task's status (todo, in-progress or done)
    ///
    /// Example: tasktrack mark 1 in-progress
    /// Example: tasktrack mark 1 done
    Mark {
        id: String,
        status: String,
    },
    /// Show details of a task
    ///
    /// Example: tasktrack show 1
    Show {
        id: String,
    },
    /// List tasks, optionally filtered by status
    ///
    /// Example: tasktrack list
    /// Example: tasktrack list done
    List {
        status: Option<String>,
    },
}

/// Flag name scanned out of raw argv before clap runs, so overrides can
/// shape alias expansion and theming ahead of the full parse.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Alias(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = match key_raw.split_once('.') {
        Some((field, rest)) => (field.trim().to_ascii_lowercase(), Some(rest.trim())),
        None => (key_raw.trim().to_ascii_lowercase(), None),
    };

    if field.is_empty() {
        return Err("override key cannot be empty".to_string());
    }

    match field.as_str() {
        "theme" => {
            if remainder.is_some() {
                Err("theme override cannot have subfields".to_string())
            } else {
                Ok(ParsedConfigOverride {
                    target: ConfigOverrideTarget::Theme,
                    value,
                })
            }
        }
        "alias" | "aliases" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "alias override requires an alias name".to_string())?;
            Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias_name.to_string()),
                value,
            })
        }
        other => Err(format!("unknown config field '{other}'")),
    }
}

/// Replace the command token with its configured expansion. Global flags
/// ahead of the command are skipped; everything after passes through.
pub fn expand_alias(args: Vec<String>, aliases: &HashMap<String, String>) -> Vec<String> {
    let mut index = 0;
    while index < args.len() {
        let arg = &args[index];
        if arg == CONFIG_OVERRIDE_FLAG {
            index += 2;
        } else if arg.starts_with('-') {
            index += 1;
        } else {
            break;
        }
    }

    let Some(command) = args.get(index) else {
        return args;
    };
    let Some(expansion) = aliases.get(command) else {
        return args;
    };

    let mut expanded: Vec<String> = args[..index].to_vec();
    expanded.extend(expansion.split_whitespace().map(str::to_string));
    expanded.extend(args.into_iter().skip(index + 1));
    expanded
}
