use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "homelink.toml",
    "config/homelink.toml",
    "crates/config/homelink.toml",
    "../homelink.toml",
    "../config/homelink.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub social: SocialConfig,
    #[serde(default)]
    pub push: PushConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://homelink.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Backing store for phone verification records.
///
/// When `url` is unset the runtime keeps verification records in process
/// memory, which is only suitable for a single instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "RedisConfig::default_key_prefix")]
    pub verification_key_prefix: String,
}

impl RedisConfig {
    fn default_key_prefix() -> String {
        "phone-verified:".to_string()
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            verification_key_prefix: Self::default_key_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
    #[serde(default = "AuthConfig::default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "AuthConfig::default_jwt_issuer")]
    pub jwt_issuer: String,
    #[serde(default = "AuthConfig::default_jwt_audience")]
    pub jwt_audience: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
            jwt_secret: Self::default_jwt_secret(),
            jwt_issuer: Self::default_jwt_issuer(),
            jwt_audience: Self::default_jwt_audience(),
        }
    }
}

impl AuthConfig {
    fn default_session_ttl() -> u64 {
        86_400
    }

    fn default_jwt_secret() -> String {
        "change-me-homelink-development-secret".to_string()
    }

    fn default_jwt_issuer() -> String {
        "homelink".to_string()
    }

    fn default_jwt_audience() -> String {
        "homelink-app".to_string()
    }
}

/// Endpoints used to exchange a social provider access token for the
/// provider's stable subject id.
///
/// ```
/// use homelink_config::SocialConfig;
///
/// let social = SocialConfig::default();
/// assert_eq!(social.naver_profile_url, "https://openapi.naver.com/v1/nid/me");
/// assert_eq!(social.request_timeout_seconds, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    #[serde(default = "SocialConfig::default_naver_profile_url")]
    pub naver_profile_url: String,
    #[serde(default = "SocialConfig::default_kakao_profile_url")]
    pub kakao_profile_url: String,
    #[serde(default = "SocialConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl SocialConfig {
    fn default_naver_profile_url() -> String {
        "https://openapi.naver.com/v1/nid/me".to_string()
    }

    fn default_kakao_profile_url() -> String {
        "https://kapi.kakao.com/v2/user/me".to_string()
    }

    const fn default_request_timeout() -> u64 {
        10
    }
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            naver_profile_url: Self::default_naver_profile_url(),
            kakao_profile_url: Self::default_kakao_profile_url(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub server_key: Option<String>,
    #[serde(default = "PushConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl PushConfig {
    const fn default_request_timeout() -> u64 {
        10
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            server_key: None,
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use homelink_config::load;
///
/// std::env::remove_var("HOMELINK_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let session_ttl = i64::try_from(defaults.auth.session_ttl_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default(
            "redis.verification_key_prefix",
            defaults.redis.verification_key_prefix.clone(),
        )?
        .set_default("auth.session_ttl_seconds", session_ttl)?
        .set_default("auth.jwt_issuer", defaults.auth.jwt_issuer.clone())?
        .set_default("auth.jwt_audience", defaults.auth.jwt_audience.clone())?;

    let environment_overrides = config::Environment::with_prefix("HOMELINK").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("HOMELINK_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via HOMELINK_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }

    debug!(
        http = ?config.http,
        database = ?config.database,
        redis_configured = config.redis.url.is_some(),
        push_configured = config.push.endpoint.is_some(),
        "loaded backend configuration"
    );
    Ok(config)
}
