/*
 * Responsibility
 * - 環境変数や設定の読み込み (identity provider, bearer token 検証, session/cache, CORS など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for `USERINFO_CACHE_TTL_SECONDS`: how stale cached permissions may get.
pub const USERINFO_CACHE_TTL_MAX_SECONDS: u64 = 3600;
pub const OIDC_HTTP_RETRIES_MAX: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // Identity provider (discovery + user-info)
    pub oidc_authority: String,
    pub oidc_http_timeout: Duration,
    pub oidc_http_retries: u32,

    // Bearer access tokens
    pub auth_issuer: String,
    pub auth_audience: Option<String>,
    pub access_token_leeway_seconds: u64,
    pub access_jwt_public_key_pem: String,

    // Cookie sessions
    pub auth_cookie_name: String,

    pub valkey_url: Option<String>,
    pub userinfo_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let oidc_authority = std::env::var("OIDC_AUTHORITY")
            .map_err(|_| ConfigError::Missing("OIDC_AUTHORITY"))?;
        if url::Url::parse(&oidc_authority).is_err() {
            return Err(ConfigError::Invalid("OIDC_AUTHORITY"));
        }

        let oidc_http_timeout = Duration::from_secs(seconds_or("OIDC_HTTP_TIMEOUT_SECONDS", 10)?);

        let oidc_http_retries = bounded(
            "OIDC_HTTP_RETRIES",
            optional("OIDC_HTTP_RETRIES").as_deref(),
            3,
            OIDC_HTTP_RETRIES_MAX,
        )? as u32;

        let auth_issuer =
            std::env::var("AUTH_ISSUER").map_err(|_| ConfigError::Missing("AUTH_ISSUER"))?;

        let auth_audience = optional("AUTH_AUDIENCE");

        let access_token_leeway_seconds = seconds_or("ACCESS_TOKEN_LEEWAY_SECONDS", 60)?;

        let access_jwt_public_key_pem = std::env::var("ACCESS_JWT_PUBLIC_KEY_PEM")
            .map_err(|_| ConfigError::Missing("ACCESS_JWT_PUBLIC_KEY_PEM"))?
            .replace("\\n", "\n");

        let auth_cookie_name =
            optional("AUTH_COOKIE_NAME").unwrap_or_else(|| "todo_session".to_string());

        let valkey_url = optional("VALKEY_URL");

        let userinfo_cache_ttl = Duration::from_secs(bounded(
            "USERINFO_CACHE_TTL_SECONDS",
            optional("USERINFO_CACHE_TTL_SECONDS").as_deref(),
            0,
            USERINFO_CACHE_TTL_MAX_SECONDS,
        )?);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            oidc_authority,
            oidc_http_timeout,
            oidc_http_retries,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            access_jwt_public_key_pem,
            auth_cookie_name,
            valkey_url,
            userinfo_cache_ttl,
        })
    }
}

// Unset or blank → None
fn optional(key: &'static str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn seconds_or(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match optional(key) {
        Some(v) => v.parse::<u64>().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

// Unset → default; above `max` is rejected
fn bounded(
    key: &'static str,
    raw: Option<&str>,
    default: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let value = match raw {
        Some(v) => v.parse::<u64>().map_err(|_| ConfigError::Invalid(key))?,
        None => default,
    };

    if value > max {
        return Err(ConfigError::Invalid(key));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_values_default_parse_and_cap() {
        const KEY: &str = "USERINFO_CACHE_TTL_SECONDS";

        assert_eq!(bounded(KEY, None, 0, 3600).unwrap(), 0);
        assert_eq!(bounded(KEY, Some("3600"), 0, 3600).unwrap(), 3600);
        assert!(matches!(
            bounded(KEY, Some("3601"), 0, 3600),
            Err(ConfigError::Invalid(KEY))
        ));
        assert!(matches!(
            bounded(KEY, Some("18446744073709551615"), 0, 3600),
            Err(ConfigError::Invalid(KEY))
        ));
        assert!(bounded(KEY, Some("soon"), 0, 3600).is_err());
    }
}
