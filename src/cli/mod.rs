pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "cms")]
#[command(about = "CMS CLI - seeding and inspection for the records API database")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Populate every table with reference and fake data")]
    Seed(commands::seed::SeedArgs),

    #[command(about = "List all records of a resource")]
    List {
        #[arg(help = "Resource name (e.g. countries, people)")]
        resource: String,
    },

    #[command(about = "Print the bcrypt hash of a password")]
    HashPassword {
        #[arg(help = "Plaintext password")]
        password: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Seed(args) => commands::seed::handle(args, output_format).await,
        Commands::List { resource } => commands::data::handle_list(resource, output_format).await,
        Commands::HashPassword { password } => commands::data::handle_hash_password(password, output_format),
    }
}
