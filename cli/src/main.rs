//! Review Forms CLI
//!
//! Command-line interface for building and managing review form templates.
//!
//! # Usage
//!
//! ```bash
//! reviewforms templates list
//! reviewforms templates new --name "Dinner feedback" --field text --field rating
//! reviewforms templates import -f form.yaml
//! reviewforms templates render tpl_1 --mode fill > form.html
//! reviewforms templates delete tpl_1 --yes
//! ```

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod output;

/// Used when neither the flag, the environment nor the config file sets one
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

#[derive(Parser)]
#[command(name = "reviewforms")]
#[command(version)]
#[command(about = "Review Forms Command Line Interface", long_about = None)]
struct Cli {
    /// Template service URL
    #[arg(long, env = "REVIEWFORMS_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the template service
    #[arg(long, env = "REVIEWFORMS_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Business whose templates are managed
    #[arg(long, env = "REVIEWFORMS_BUSINESS_ID")]
    business_id: Option<String>,

    /// Request timeout in seconds (none by default)
    #[arg(long)]
    timeout: Option<u64>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage review form templates
    Templates {
        #[command(subcommand)]
        action: TemplateCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// List the business's templates
    List,
    /// Show a template and its fields
    Show { id: String },
    /// Create a template
    New {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Field types to use instead of the four default fields
        #[arg(long = "field", value_name = "TYPE")]
        fields: Vec<String>,
        /// Override the business review URL for this template
        #[arg(long)]
        review_url: Option<String>,
    },
    /// Create a template from a YAML or JSON file
    Import {
        #[arg(short, long)]
        file: String,
    },
    /// Print a template as JSON or YAML
    Export { id: String },
    /// Render a template to HTML
    Render {
        id: String,
        #[arg(long, value_enum, default_value = "edit")]
        mode: output::Mode,
    },
    /// Delete a template
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Serve this template on the public review page
    Activate { id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let profile = cli.profile.as_deref();
    let config = config::Config::load(profile)?;

    match cli.command {
        Commands::Config { action } => commands::config::handle(action, profile),
        Commands::Templates { action } => {
            let format = cli.format.or_else(|| config.format()).unwrap_or(output::OutputFormat::Table);
            let settings = commands::Connection {
                api_url: cli.api_url.or(config.api_url).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                api_token: cli.api_token.or(config.api_token),
                business_id: cli.business_id.or(config.business_id),
                timeout: cli.timeout,
            };
            let builder = settings.connect()?;
            commands::templates::handle(action, builder, format).await
        }
    }
}
