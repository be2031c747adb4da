use clap::{Parser, Subcommand};
use jiff::Timestamp;

mod db;
mod token;
mod user;

#[derive(Debug, Parser)]
#[command(name = "pizzeria-app", about = "Pizzeria operator CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    User(user::UserCommand),
    Token(token::TokenCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::User(command) => user::run(command).await,
            Commands::Token(command) => token::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}

/// Parse an optional RFC 3339 expiry, which must lie in the future.
fn parse_expires_at(raw: Option<&str>) -> Result<Option<Timestamp>, String> {
    let expires_at = raw
        .map(|value| {
            value
                .parse::<Timestamp>()
                .map_err(|error| format!("invalid token-expires-at timestamp: {error}"))
        })
        .transpose()?;

    if let Some(expires_at) = expires_at
        && expires_at <= Timestamp::now()
    {
        return Err("token-expires-at must be in the future".to_string());
    }

    Ok(expires_at)
}

fn print_issued_token(issued: &pizzeria_app::auth::IssuedApiToken) {
    println!("token_uuid: {}", issued.metadata.uuid);
    println!("user_uuid: {}", issued.metadata.user_uuid);
    println!("token_version: {}", issued.metadata.version.as_i16());
    println!("token_created_at: {}", issued.metadata.created_at);
    if let Some(expires_at) = issued.metadata.expires_at {
        println!("token_expires_at: {expires_at}");
    }
    println!("api_token: {}", issued.token);
    println!("store this token now; it is only shown once");
}
