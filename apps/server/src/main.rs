use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use homelink_accounts::{validation, VerificationStore, DEFAULT_VERIFICATION_TTL};
use homelink_backend_runtime::{telemetry, BackendServices};
use homelink_config::{load as load_config, AppConfig};
use homelink_database::IdentityRepository;
use homelink_gateway::{build_router, GatewayState};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "homelink-backend")]
#[command(about = "Homelink identity, device and subscription backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Record a phone number as verified so it can sign up
    VerifyPhone {
        number: String,
        /// Lifetime of the verification record
        #[arg(long, default_value_t = DEFAULT_VERIFICATION_TTL.as_secs())]
        ttl_seconds: u64,
    },
    /// Print the most recently created identities
    DumpIdentities {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(&config).await,
        Commands::VerifyPhone {
            number,
            ttl_seconds,
        } => verify_phone(&config, &number, Duration::from_secs(ttl_seconds)).await,
        Commands::DumpIdentities { limit } => dump_identities(&config, limit).await,
    }
}

async fn initialise(config: &AppConfig) -> anyhow::Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    info!("starting Homelink backend");

    let services = initialise(config).await?;
    let state = GatewayState::new(
        services.registration.clone(),
        services.devices.clone(),
        services.subscriptions.clone(),
        services.notifications.clone(),
    );
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(homelink_backend_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn verify_phone(config: &AppConfig, number: &str, ttl: Duration) -> anyhow::Result<()> {
    validation::validate_phone_number(number)
        .with_context(|| format!("refusing to verify {number}"))?;

    let services = initialise(config).await?;
    record_verification(&services, number, ttl).await?;

    println!("{number} verified for {}s", ttl.as_secs());
    Ok(())
}

/// The in-process fallback store dies with this command, so a record is only
/// written when Redis is reachable.
async fn record_verification(
    services: &BackendServices,
    number: &str,
    ttl: Duration,
) -> anyhow::Result<()> {
    if services.redis_conn.is_none() {
        bail!("redis is not configured or not reachable; {number} was not verified");
    }

    services
        .verifications
        .mark_verified(number, ttl)
        .await
        .with_context(|| format!("failed to mark {number} as verified"))
}

async fn dump_identities(config: &AppConfig, limit: u32) -> anyhow::Result<()> {
    let services = initialise(config).await?;
    let identities = IdentityRepository::new(services.db_pool.clone())
        .list_recent(limit)
        .await
        .context("failed to fetch identities")?;

    println!("=== IDENTITIES ===");
    if identities.is_empty() {
        println!("No identities found in database");
        return Ok(());
    }

    println!(
        "{:<5} {:<26} {:<8} {:<20} {:<14} {:<20} {:<6} {:<25}",
        "ID", "Public ID", "Provider", "Login ID", "Phone", "Name", "Push", "Created At"
    );
    println!("{}", "-".repeat(130));

    for identity in identities {
        println!(
            "{:<5} {:<26} {:<8} {:<20} {:<14} {:<20} {:<6} {:<25}",
            identity.id,
            identity.public_id,
            identity.provider.as_str(),
            identity.login_id.as_deref().unwrap_or("-"),
            identity.phone_number,
            identity.display_name,
            if identity.device_token.is_some() { "yes" } else { "no" },
            identity.created_at.to_rfc3339(),
        );
    }

    Ok(())
}
