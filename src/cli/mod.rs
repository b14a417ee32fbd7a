pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Storefront API - products, reviews and pricing backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default when no command is given)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides API_PORT)")]
        port: Option<u16>,

        #[arg(long, help = "Use an in-memory store seeded with demo data instead of PostgreSQL")]
        memory: bool,
    },

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Mint a bearer token signed with the configured secret")]
    Token {
        #[arg(help = "Username claim")]
        username: String,

        #[arg(long, help = "First name used as the review title")]
        name: Option<String>,

        #[arg(long, help = "User id (random when omitted)")]
        user_id: Option<uuid::Uuid>,

        #[arg(long, help = "Grant staff privileges")]
        staff: bool,
    },
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        memory: false,
    }) {
        Commands::Serve { port, memory } => commands::serve::handle(config, port, memory).await,
        Commands::Migrate => commands::migrate::handle(config).await,
        Commands::Token {
            username,
            name,
            user_id,
            staff,
        } => commands::token::handle(&config, username, name, user_id, staff),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from(["storefront", "serve", "--port", "9000", "--memory"]).unwrap();
        match cli.command {
            Some(Commands::Serve { port, memory }) => {
                assert_eq!(port, Some(9000));
                assert!(memory);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn token_flags_parse() {
        let cli = Cli::try_parse_from(["storefront", "token", "admin", "--staff", "--name", "Ada"]).unwrap();
        match cli.command {
            Some(Commands::Token { username, name, staff, .. }) => {
                assert_eq!(username, "admin");
                assert_eq!(name.as_deref(), Some("Ada"));
                assert!(staff);
            }
            _ => panic!("expected token"),
        }
    }

    #[test]
    fn bare_invocation_has_no_command() {
        let cli = Cli::try_parse_from(["storefront"]).unwrap();
        assert!(cli.command.is_none());
    }
}
