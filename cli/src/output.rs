//! Output formatting

use clap::ValueEnum;
use colored::Colorize;
use review_forms::{Notice, NoticeLevel, RenderMode};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Print structured data; `Table` prints the rows instead
    pub fn print<T: Serialize, R: Tabled>(&self, data: &T, rows: Vec<R>) -> anyhow::Result<()> {
        match self {
            OutputFormat::Table => print_table(rows),
            other => other.print_document(data)?,
        }
        Ok(())
    }

    /// Print a whole document; tables fall back to YAML
    pub fn print_document<T: Serialize>(&self, data: &T) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
            OutputFormat::Yaml | OutputFormat::Table => print!("{}", serde_yaml::to_string(data)?),
        }
        Ok(())
    }
}

/// Render mode as selected on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Mode {
    Edit,
    Fill,
}

impl From<Mode> for RenderMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Edit => RenderMode::Edit,
            Mode::Fill => RenderMode::Fill,
        }
    }
}

pub fn print_table<R: Tabled>(rows: Vec<R>) {
    if rows.is_empty() {
        println!("{}", "(none)".dimmed());
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

/// Builder notices go to stderr so stdout stays machine readable
pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let line = match notice.level {
            NoticeLevel::Success => format!("✓ {}", notice.message).green(),
            NoticeLevel::Info => notice.message.as_str().cyan(),
            NoticeLevel::Error => format!("✗ {}", notice.message).red(),
        };
        eprintln!("{}", line);
    }
}
