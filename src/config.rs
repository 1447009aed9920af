use std::{path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}={value} is not valid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Process configuration, read once at startup from the environment
/// (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub public_dir: PathBuf,
    pub profile_pics_dir: PathBuf,
    pub room_pics_dir: PathBuf,
    /// How long a fresh connection waits before telling room-mates it is online.
    pub online_delay: Duration,
    pub session_inactivity: time::Duration,
    pub secure_cookies: bool,
    pub google: Option<GoogleConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite:roomchat.db".to_owned(),
            port: 3000,
            public_dir: PathBuf::from("public"),
            profile_pics_dir: PathBuf::from("profilePics"),
            room_pics_dir: PathBuf::from("roomProfilePics"),
            online_delay: Duration::from_millis(1500),
            session_inactivity: time::Duration::days(7),
            secure_cookies: false,
            google: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let defaults = Config::default();

        let google = match (dotenv::var("GOOGLE_CLIENT_ID"), dotenv::var("GOOGLE_CLIENT_SECRET")) {
            (Ok(client_id), Ok(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_url: dotenv::var("GOOGLE_REDIRECT_URL")
                    .unwrap_or_else(|_| "http://localhost:3000/users/auth/google/callback".to_owned()),
            }),
            _ => None,
        };

        Ok(Config {
            database_url: dotenv::var("DATABASE_URL").unwrap_or(defaults.database_url),
            port: parse_var("PORT", defaults.port)?,
            public_dir: dotenv::var("PUBLIC_DIR").map(PathBuf::from).unwrap_or(defaults.public_dir),
            profile_pics_dir: dotenv::var("PROFILE_PICS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.profile_pics_dir),
            room_pics_dir: dotenv::var("ROOM_PICS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.room_pics_dir),
            online_delay: Duration::from_millis(parse_var("ONLINE_DELAY_MS", 1500u64)?),
            session_inactivity: time::Duration::minutes(parse_var("SESSION_INACTIVITY_MINUTES", 7 * 24 * 60i64)?),
            secure_cookies: parse_var("SECURE_COOKIES", defaults.secure_cookies)?,
            google,
        })
    }
}

fn parse_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match dotenv::var(key) {
        Ok(value) => parse_value(key, value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        reason: err.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_values_and_reports_the_key() {
        assert_eq!(parse_value::<u16>("PORT", " 8080 ".to_owned()).unwrap(), 8080);
        assert!(parse_value::<bool>("SECURE_COOKIES", "true".to_owned()).unwrap());

        let err = parse_value::<u16>("PORT", "eighty".to_owned()).unwrap_err();
        assert!(err.to_string().starts_with("PORT=eighty is not valid"));
    }

    #[test]
    fn defaults_keep_the_reconnect_delay() {
        let config = Config::default();
        assert_eq!(config.online_delay, Duration::from_millis(1500));
        assert!(config.google.is_none());
    }
}
