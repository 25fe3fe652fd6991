use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

// bcrypt 接受的 cost 范围
const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;
const MIN_SECS: RangeInclusive<u64> = 1..=u64::MAX;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub session_ttl_secs: u64,
    pub otp_ttl_secs: u64,
    pub otp_max_attempts: u32,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    /// 仅在部署于反向代理之后时信任 x-real-ip / x-forwarded-for
    pub trust_proxy_headers: bool,
    pub bcrypt_cost: u32,
    pub secure_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://glycoguard.db".to_string(),
            redis_url: None,
            server_host: "0.0.0.0".to_string(),
            server_port: 5000,
            session_ttl_secs: 1800,
            otp_ttl_secs: 300,
            otp_max_attempts: 5,
            rate_limit_window_secs: 60,
            rate_limit_requests: 100,
            trust_proxy_headers: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            secure_cookies: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源构建配置，缺失的键使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Config {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
            server_host: lookup("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port)?,
            session_ttl_secs: parse_secs(&lookup, "SESSION_TTL", defaults.session_ttl_secs)?,
            otp_ttl_secs: parse_secs(&lookup, "OTP_TTL", defaults.otp_ttl_secs)?,
            otp_max_attempts: parse_in(
                &lookup,
                "OTP_MAX_ATTEMPTS",
                defaults.otp_max_attempts,
                1..=u32::MAX,
            )?,
            rate_limit_window_secs: parse_secs(
                &lookup,
                "RATE_LIMIT_WINDOW",
                defaults.rate_limit_window_secs,
            )?,
            rate_limit_requests: parse_or(
                &lookup,
                "RATE_LIMIT_REQUESTS",
                defaults.rate_limit_requests,
            )?,
            trust_proxy_headers: parse_or(
                &lookup,
                "TRUST_PROXY_HEADERS",
                defaults.trust_proxy_headers,
            )?,
            bcrypt_cost: parse_in(
                &lookup,
                "BCRYPT_COST",
                defaults.bcrypt_cost,
                BCRYPT_COST_RANGE,
            )?,
            secure_cookies: parse_or(&lookup, "SECURE_COOKIES", defaults.secure_cookies)?,
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_in<F, T>(
    lookup: &F,
    key: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd,
{
    match lookup(key) {
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) if range.contains(&parsed) => Ok(parsed),
            _ => Err(ConfigError::Invalid { key, value }),
        },
        None => Ok(default),
    }
}

// "300s" 与 "300" 等价，时长必须大于零
fn parse_secs<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let trimmed = |key: &str| {
        lookup(key).map(|value| value.trim().trim_end_matches('s').to_string())
    };
    match parse_in(&trimmed, key, default, MIN_SECS) {
        Ok(secs) => Ok(secs),
        Err(_) => Err(ConfigError::Invalid {
            key,
            value: lookup(key).unwrap_or_default(),
        }),
    }
}
