//! Pdfdesk CLI: administration of the broker PDF form filler backend.
//!
//! ```bash
//! pdfdesk login --email broker@example.com
//! pdfdesk templates list
//! pdfdesk generate --client 12 --template 3 --template 4
//! ```
//!
//! See `pdfdesk --help` for all available commands and options.

mod commands;
mod console;
mod context;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfdesk", about = "Broker PDF form filler administration", version)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "pdfdesk.toml")]
    config: PathBuf,

    /// Backend base URL, overriding configuration and environment
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(long, env = "PDFDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Standardized field registry
    #[command(subcommand)]
    Fields(commands::fields::FieldsCommand),
    /// Field display categories
    #[command(subcommand)]
    Categories(commands::fields::CategoriesCommand),
    /// PDF templates
    #[command(subcommand)]
    Templates(commands::templates::TemplatesCommand),
    /// Per-template field mappings
    #[command(subcommand)]
    Mappings(commands::mappings::MappingsCommand),
    /// Template bundles
    #[command(subcommand)]
    FormSets(commands::form_sets::FormSetsCommand),
    /// Generate filled PDFs for a client
    Generate(commands::generate::GenerateArgs),
    /// Show daily and monthly generation quota
    Quota,
    /// Show recent account activity
    Activity {
        /// Another user's id (admins only)
        #[arg(long)]
        user: Option<String>,

        #[arg(long, default_value_t = pdfdesk_core::registry::users::DEFAULT_ACTIVITY_LIMIT)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match context::Context::build(&cli.config, cli.base_url.as_deref(), cli.yes).await {
        Ok(ctx) => run(ctx, cli.command).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(ctx: context::Context, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => commands::auth::login(&ctx, &email, password).await,
        Commands::Logout => commands::auth::logout(&ctx).await,
        Commands::Fields(cmd) => commands::fields::run(&ctx, cmd).await,
        Commands::Categories(cmd) => commands::fields::run_categories(&ctx, cmd).await,
        Commands::Templates(cmd) => commands::templates::run(&ctx, cmd).await,
        Commands::Mappings(cmd) => commands::mappings::run(&ctx, cmd).await,
        Commands::FormSets(cmd) => commands::form_sets::run(&ctx, cmd).await,
        Commands::Generate(args) => commands::generate::run(&ctx, args).await,
        Commands::Quota => commands::account::quota(&ctx).await,
        Commands::Activity { user, limit } => commands::account::activity(&ctx, user.as_deref(), limit).await,
    }
}
