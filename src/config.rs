/// Bundled config for builds that cannot read a `.env` file (wasm, iOS, Android)
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:10000";
pub const DEFAULT_SENTINEL_TITLE: &str = "new chat";
pub const DEFAULT_TITLE_MAX_CHARS: usize = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CHAT_API_BASE is not a valid URL: {0}")]
    InvalidBase(String),

    #[error("CHAT_TITLE_MAX_CHARS must be a positive integer, got {0:?}")]
    InvalidTitleLength(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub api_base: String,
    pub sentinel_title: String,
    pub title_max_chars: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            sentinel_title: DEFAULT_SENTINEL_TITLE.to_string(),
            title_max_chars: DEFAULT_TITLE_MAX_CHARS,
        }
    }
}

impl ClientConfig {
    /// Process environment first, then the bundled `assets/config.env` values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| process_env(key).or_else(|| bundled_value(key)))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base = lookup("CHAT_API_BASE")
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or(defaults.api_base);
        if reqwest::Url::parse(&api_base).is_err() {
            return Err(ConfigError::InvalidBase(api_base));
        }

        let sentinel_title = lookup("CHAT_SENTINEL_TITLE")
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or(defaults.sentinel_title);

        let title_max_chars = match lookup("CHAT_TITLE_MAX_CHARS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidTitleLength(raw)),
            },
            None => defaults.title_max_chars,
        };

        Ok(Self {
            api_base,
            sentinel_title,
            title_max_chars,
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_dotenv() {
    // A missing .env is normal outside desktop dev; the bundled values fill the gaps.
    dotenvy::dotenv().ok();
}

// The browser has no process environment to load into.
#[cfg(target_arch = "wasm32")]
pub fn load_dotenv() {}

#[cfg(not(target_arch = "wasm32"))]
fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(target_arch = "wasm32")]
fn process_env(_key: &str) -> Option<String> {
    None
}

fn bundled_value(key: &str) -> Option<String> {
    parse_env_lines(BUNDLED_CONFIG)
        .into_iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value.to_string())
}

fn parse_env_lines(source: &str) -> Vec<(&str, &str)> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("CHAT_API_BASE", "http://host:8080/api/")]))
                .unwrap();
        assert_eq!(config.api_base, "http://host:8080/api");
    }

    #[test]
    fn rejects_relative_base() {
        let err = ClientConfig::from_lookup(lookup_from(&[("CHAT_API_BASE", "/chat")]));
        assert!(matches!(err, Err(ConfigError::InvalidBase(_))));
    }

    #[test]
    fn rejects_zero_title_length() {
        let err = ClientConfig::from_lookup(lookup_from(&[("CHAT_TITLE_MAX_CHARS", "0")]));
        assert!(matches!(err, Err(ConfigError::InvalidTitleLength(_))));
    }

    #[test]
    fn bundled_file_alone_yields_the_defaults() {
        let config = ClientConfig::from_lookup(bundled_value).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn bundled_lines_feed_the_lookup() {
        let parsed = parse_env_lines(
            "CHAT_API_BASE=https://chat.example.org/\nCHAT_SENTINEL_TITLE=untitled\nCHAT_TITLE_MAX_CHARS=12\n",
        );
        let config = ClientConfig::from_lookup(|key: &str| {
            parsed
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        })
        .unwrap();
        assert_eq!(config.api_base, "https://chat.example.org");
        assert_eq!(config.sentinel_title, "untitled");
        assert_eq!(config.title_max_chars, 12);
    }

    #[test]
    fn bundled_lines_skip_comments() {
        let parsed = parse_env_lines("# comment\n\nCHAT_API_BASE = http://x\nbroken\n");
        assert_eq!(parsed, vec![("CHAT_API_BASE", "http://x")]);
    }
}
