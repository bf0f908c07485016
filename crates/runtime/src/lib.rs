use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use homelink_accounts::{
    DeviceBindingService, HttpPushSender, InMemoryVerificationStore, LoggingPushSender,
    NotificationDispatcher, PushSender, RedisVerificationStore, RegistrationService,
    SubscriptionLedger, VerificationStore,
};
use homelink_auth::{Argon2Hasher, HttpTokenVerifier, JwtTokenIssuer};
use homelink_config::{AppConfig, RedisConfig};
use homelink_database::{initialize_database, SqlitePool};
use redis::aio::ConnectionManager;
use tracing::{info, warn};

const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything the server and the CLI commands need, wired from config.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub redis_conn: Option<ConnectionManager>,
    pub verifications: Arc<dyn VerificationStore>,
    pub registration: RegistrationService,
    pub devices: DeviceBindingService,
    pub subscriptions: SubscriptionLedger,
    pub notifications: NotificationDispatcher,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let redis_conn = connect_redis(&config.redis).await;
        let verifications: Arc<dyn VerificationStore> = match redis_conn.clone() {
            Some(conn) => Arc::new(RedisVerificationStore::new(
                conn,
                config.redis.verification_key_prefix.clone(),
            )),
            None => {
                warn!("phone verifications are kept in process memory");
                Arc::new(InMemoryVerificationStore::new())
            }
        };

        let tokens = Arc::new(JwtTokenIssuer::from_config(&config.auth));
        let social = Arc::new(
            HttpTokenVerifier::from_config(&config.social)
                .context("failed to build social token verifier")?,
        );
        let registration = RegistrationService::new(
            db_pool.clone(),
            verifications.clone(),
            Arc::new(Argon2Hasher::new()),
            tokens,
            social,
        );

        let push: Arc<dyn PushSender> = match HttpPushSender::from_config(&config.push)
            .context("failed to build push sender")?
        {
            Some(sender) => {
                info!("push delivery enabled");
                Arc::new(sender)
            }
            None => {
                warn!("push endpoint not configured; notifications are only logged");
                Arc::new(LoggingPushSender)
            }
        };

        Ok(Self {
            devices: DeviceBindingService::new(db_pool.clone()),
            subscriptions: SubscriptionLedger::new(db_pool.clone()),
            notifications: NotificationDispatcher::new(db_pool.clone(), push),
            registration,
            verifications,
            redis_conn,
            db_pool,
        })
    }
}

async fn connect_redis(config: &RedisConfig) -> Option<ConnectionManager> {
    let url = config.url.as_deref()?;

    let client = match redis::Client::open(url) {
        Ok(client) => client,
        Err(error) => {
            warn!(%error, "failed to create redis client, proceeding without redis");
            return None;
        }
    };

    match tokio::time::timeout(REDIS_CONNECT_TIMEOUT, ConnectionManager::new(client)).await {
        Ok(Ok(conn)) => {
            info!("redis connection established");
            Some(conn)
        }
        Ok(Err(error)) => {
            warn!(%error, "failed to connect to redis, proceeding without redis");
            None
        }
        Err(_) => {
            warn!("timed out connecting to redis, proceeding without redis");
            None
        }
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
