//! Operator CLI for the short link service.
//!
//! Manages API tokens (the accounts that own links) and inspects the
//! registry directly through the database, without going through HTTP.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin admin -- token create --name dashboard --account marketing
//! cargo run --bin admin -- token list
//! cargo run --bin admin -- token revoke dashboard
//! cargo run --bin admin -- links list --account marketing
//! cargo run --bin admin -- stats
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required)
//! - `TOKEN_SIGNING_SECRET` (required for `token create`, must match the server)

use shortlink_service::application::services::auth_service::hash_token;
use shortlink_service::domain::repositories::{LinkRepository, TokenRepository};
use shortlink_service::infrastructure::persistence::{PgLinkRepository, PgTokenRepository};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use rand::Rng;
use sqlx::PgPool;
use std::sync::Arc;

const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const TOKEN_LEN: usize = 48;
const LINK_LIST_LIMIT: i64 = 200;

#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about = "Short link service administration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Inspect short links
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },

    /// Show registry totals
    Stats,

    /// Database diagnostics
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token for an account
    Create {
        /// Unique label, e.g. "dashboard"
        #[arg(short, long)]
        name: Option<String>,

        /// Account that will own links created with this token
        #[arg(short, long)]
        account: Option<String>,

        /// Use this value instead of generating one
        #[arg(short, long)]
        token: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token by name or ID
    Revoke {
        name_or_id: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum LinksAction {
    /// List links, newest first
    List {
        /// Only links owned by this account
        #[arg(short, long)]
        account: Option<String>,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show server version and migration state
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let result = match cli.command {
        Commands::Token { action } => handle_token_action(action, &pool).await,
        Commands::Links { action } => handle_links_action(action, &pool).await,
        Commands::Stats => handle_stats(&pool).await,
        Commands::Db { action } => handle_db_action(action, &pool).await,
    };

    pool.close().await;
    result
}

async fn handle_token_action(action: TokenAction, pool: &PgPool) -> Result<()> {
    let repo = PgTokenRepository::new(Arc::new(pool.clone()));

    match action {
        TokenAction::Create {
            name,
            account,
            token,
            yes,
        } => create_token(&repo, name, account, token, yes).await,
        TokenAction::List => list_tokens(&repo).await,
        TokenAction::Revoke { name_or_id, yes } => revoke_token(&repo, &name_or_id, yes).await,
    }
}

/// Issues a token. The raw value is printed once; only its HMAC is stored.
async fn create_token(
    repo: &PgTokenRepository,
    name: Option<String>,
    account: Option<String>,
    token: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    let secret = std::env::var("TOKEN_SIGNING_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .context("TOKEN_SIGNING_SECRET must be set to the server's value")?;

    println!("{}", "Create API token".bright_blue().bold());
    println!();

    let name = match name {
        Some(n) => n,
        None => Input::new().with_prompt("Token name").interact_text()?,
    };

    let account = match account {
        Some(a) => a,
        None => Input::new()
            .with_prompt("Owning account")
            .with_initial_text(name.clone())
            .interact_text()?,
    };

    let token_value = match token {
        Some(t) => {
            println!("{}", "Using provided token value".yellow());
            t
        }
        None => generate_token(),
    };

    println!("  Name:    {}", name.cyan());
    println!("  Account: {}", account.cyan());
    println!("  Token:   {}", token_value.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "Save this token now, it cannot be shown again.".red().bold()
    );
    println!();

    if !skip_confirm
        && !Confirm::new()
            .with_prompt("Create this token?")
            .default(true)
            .interact()?
    {
        println!("{}", "Cancelled".red());
        return Ok(());
    }

    let token_hash = hash_token(&secret, &token_value);

    repo.create_token(&name, &account, &token_hash)
        .await
        .map_err(|e| anyhow!("Failed to create token: {e}"))?;

    println!("{}", "Token created".green().bold());
    println!();
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/links",
        token_value.bright_yellow()
    );
    println!();

    Ok(())
}

async fn list_tokens(repo: &PgTokenRepository) -> Result<()> {
    let tokens = repo
        .list_tokens()
        .await
        .map_err(|e| anyhow!("Failed to list tokens: {e}"))?;

    if tokens.is_empty() {
        println!("{}", "No tokens found".yellow());
        println!("Create one with: admin token create");
        return Ok(());
    }

    println!(
        "  {:<5} {:<24} {:<20} {:<17} {:<17} {}",
        "ID".bold(),
        "Name".bold(),
        "Account".bold(),
        "Created".bold(),
        "Last used".bold(),
        "Status".bold()
    );
    println!("  {}", "-".repeat(96).bright_black());

    for token in &tokens {
        let status = if token.revoked_at.is_some() {
            "REVOKED".red()
        } else {
            "ACTIVE".green()
        };

        println!(
            "  {:<5} {:<24} {:<20} {:<17} {:<17} {}",
            token.id,
            token.name.cyan(),
            token.account,
            format_time(token.created_at),
            token.last_used_at.map(format_time).unwrap_or_else(|| "never".into()),
            status
        );
    }

    println!();
    println!("  Total: {}", tokens.len().to_string().bold());

    Ok(())
}

/// Numeric input is treated as an ID, anything else as a name.
async fn revoke_token(repo: &PgTokenRepository, name_or_id: &str, skip_confirm: bool) -> Result<()> {
    let token = match name_or_id.parse::<i64>() {
        Ok(id) => repo.find_by_id(id).await,
        Err(_) => repo.find_by_name(name_or_id).await,
    }
    .map_err(|e| anyhow!("Database error: {e}"))?
    .with_context(|| format!("Token '{name_or_id}' not found"))?;

    if token.revoked_at.is_some() {
        println!("{}", "Token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token:   {} (#{})", token.name.cyan(), token.id);
    println!("  Account: {}", token.account);
    println!();

    if !skip_confirm
        && !Confirm::new()
            .with_prompt("Revoke this token?")
            .default(false)
            .interact()?
    {
        println!("{}", "Cancelled".red());
        return Ok(());
    }

    let revoked = repo
        .revoke_token(token.id)
        .await
        .map_err(|e| anyhow!("Failed to revoke token: {e}"))?;

    if revoked {
        println!("{}", "Token revoked".green().bold());
    } else {
        println!("{}", "Token was revoked concurrently".yellow());
    }

    Ok(())
}

#[derive(sqlx::FromRow)]
struct LinkListRow {
    id: i64,
    short_code: String,
    owner: String,
    destination_url: String,
    click_count: i64,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
}

async fn handle_links_action(action: LinksAction, pool: &PgPool) -> Result<()> {
    let LinksAction::List { account } = action;

    let rows: Vec<LinkListRow> = match account {
        Some(account) => PgLinkRepository::new(Arc::new(pool.clone()))
            .list_by_owner(&account)
            .await
            .map_err(|e| anyhow!("Failed to list links: {e}"))?
            .into_iter()
            .map(|l| LinkListRow {
                id: l.id,
                short_code: l.short_code,
                owner: l.owner,
                destination_url: l.destination_url,
                click_count: l.click_count,
                is_active: l.is_active,
                expires_at: l.expires_at,
            })
            .collect(),
        None => {
            sqlx::query_as(
                r#"
                SELECT id, short_code, owner, destination_url, click_count, is_active, expires_at
                FROM short_links
                ORDER BY created_at DESC, id DESC
                LIMIT $1
                "#,
            )
            .bind(LINK_LIST_LIMIT)
            .fetch_all(pool)
            .await?
        }
    };

    if rows.is_empty() {
        println!("{}", "No links found".yellow());
        return Ok(());
    }

    let now = Utc::now();

    println!(
        "  {:<6} {:<16} {:<16} {:>8} {:<8} {}",
        "ID".bold(),
        "Code".bold(),
        "Owner".bold(),
        "Clicks".bold(),
        "State".bold(),
        "Destination".bold()
    );
    println!("  {}", "-".repeat(96).bright_black());

    for row in &rows {
        let state = if !row.is_active {
            "inactive".red()
        } else if row.expires_at.is_some_and(|e| now >= e) {
            "expired".yellow()
        } else {
            "active".green()
        };

        println!(
            "  {:<6} {:<16} {:<16} {:>8} {:<8} {}",
            row.id,
            row.short_code.cyan(),
            row.owner,
            row.click_count,
            state,
            row.destination_url.bright_black()
        );
    }

    println!();
    println!("  Shown: {}", rows.len().to_string().bold());

    Ok(())
}

async fn handle_stats(pool: &PgPool) -> Result<()> {
    let (links, active_links, clicks): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE is_active AND (expires_at IS NULL OR expires_at > NOW())),
               COALESCE(SUM(click_count), 0)::BIGINT
        FROM short_links
        "#,
    )
    .fetch_one(pool)
    .await?;

    let (accounts, tokens): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(DISTINCT account), COUNT(*) FROM api_tokens WHERE revoked_at IS NULL",
    )
    .fetch_one(pool)
    .await?;

    println!("{}", "Statistics".bright_blue().bold());
    println!();
    println!("  Links:           {}", links.to_string().bright_green().bold());
    println!("  Resolvable:      {}", active_links.to_string().bright_green());
    println!("  Clicks:          {}", clicks.to_string().bright_green().bold());
    println!("  Active tokens:   {}", tokens.to_string().bright_green());
    println!("  Active accounts: {}", accounts.to_string().bright_green());
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            sqlx::query("SELECT 1").execute(pool).await?;
            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let latest: Option<i64> =
                sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success")
                    .fetch_one(pool)
                    .await
                    .unwrap_or(None);

            println!("  PostgreSQL: {}", version.bright_white());
            match latest {
                Some(v) => println!("  Migration:  {}", v.to_string().bright_white()),
                None => println!("  Migration:  {}", "none applied".yellow()),
            }
        }
    }

    Ok(())
}

fn format_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

/// 48 alphanumeric characters from the thread-local CSPRNG.
fn generate_token() -> String {
    let mut rng = rand::rng();

    (0..TOKEN_LEN)
        .map(|_| TOKEN_CHARSET[rng.random_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}
