use std::{env, fmt, path::PathBuf, time::Duration};
use url::Url;

// Runtime/client constants (not render tuning).

pub const INBOUND_CHANNEL_CAPACITY: usize = 256;
pub const KEY_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { name: &'static str, value: String },
    // Neither BATTLE_ID nor ROOM_ID is set.
    MissingBattle,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { name, value } => write!(f, "invalid value for {name}: {value:?}"),
            ConfigError::MissingBattle => write!(f, "set BATTLE_ID or ROOM_ID to choose a battle"),
        }
    }
}

impl std::error::Error for ConfigError {}

pub fn api_base_url() -> Result<String, ConfigError> {
    let value =
        env::var("API_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8000/api".to_string());
    parse_base_url("API_BASE_URL", &value, &["http", "https"])
}

pub fn ws_base_url() -> Result<String, ConfigError> {
    let value = env::var("WS_BASE_URL").unwrap_or_else(|_| "ws://127.0.0.1:8000".to_string());
    parse_base_url("WS_BASE_URL", &value, &["ws", "wss"])
}

pub fn asset_dir() -> PathBuf {
    env::var("ASSET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("assets"))
}

pub fn battle_id() -> Option<String> {
    non_empty("BATTLE_ID")
}

pub fn room_id() -> Result<Option<u64>, ConfigError> {
    parse_optional_u64("ROOM_ID", non_empty("ROOM_ID"))
}

pub fn access_token() -> Option<String> {
    non_empty("ACCESS_TOKEN")
}

pub fn refresh_token() -> Option<String> {
    non_empty("REFRESH_TOKEN")
}

pub fn auth_username() -> Option<String> {
    non_empty("AUTH_USERNAME")
}

pub fn auth_password() -> Option<String> {
    non_empty("AUTH_PASSWORD")
}

pub fn local_player_id() -> Result<Option<u64>, ConfigError> {
    parse_optional_u64("LOCAL_PLAYER_ID", non_empty("LOCAL_PLAYER_ID"))
}

pub fn http_timeout() -> Duration {
    let millis = env::var("HTTP_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(5000);
    Duration::from_millis(millis)
}

pub fn frame_dump_path() -> Option<PathBuf> {
    non_empty("FRAME_DUMP_PATH").map(PathBuf::from)
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub(crate) fn parse_optional_u64(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<u64>, ConfigError> {
    value
        .map(|value| {
            value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                name,
                value: value.clone(),
            })
        })
        .transpose()
}

// Validates the URL and strips the trailing slash so paths can be appended with format!.
pub(crate) fn parse_base_url(
    name: &'static str,
    value: &str,
    schemes: &[&str],
) -> Result<String, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name,
        value: value.to_string(),
    };
    let url = Url::parse(value).map_err(|_| invalid())?;
    if !schemes.contains(&url.scheme()) {
        return Err(invalid());
    }
    Ok(value.trim_end_matches('/').to_string())
}
