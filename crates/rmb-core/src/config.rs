use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

const DEFAULT_DATABASE_PATH: &str = "reminders.db";
const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_COOLDOWN_MS: u64 = 2_000;
const DEFAULT_CONCURRENCY: usize = 1;
const DEFAULT_POLL_TIMEOUT_SECS: u32 = 10;

/// Typed configuration for the bot process.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    // Storage
    pub database_path: PathBuf,
    pub database_pool_size: u32,

    // Delivery loop
    pub dispatch_cooldown: Duration,
    pub dispatch_concurrency: usize,
    pub poll_timeout_secs: u32,
}

impl Config {
    /// Load from the process environment, after merging a `.env` file from the
    /// working directory (variables already set in the environment win).
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let database_path = lookup("DATABASE_PATH")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
        let database_pool_size = parse::<u32>(lookup("DATABASE_POOL_SIZE"))
            .unwrap_or(DEFAULT_POOL_SIZE)
            .max(1);

        let dispatch_cooldown = Duration::from_millis(
            parse::<u64>(lookup("DISPATCH_COOLDOWN_MS")).unwrap_or(DEFAULT_COOLDOWN_MS),
        );
        let dispatch_concurrency = parse::<usize>(lookup("DISPATCH_CONCURRENCY"))
            .unwrap_or(DEFAULT_CONCURRENCY)
            .max(1);
        let poll_timeout_secs =
            parse::<u32>(lookup("POLL_TIMEOUT_SECS")).unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);

        Ok(Self {
            telegram_bot_token,
            database_path,
            database_pool_size,
            dispatch_cooldown,
            dispatch_concurrency,
            poll_timeout_secs,
        })
    }
}

fn parse<T: std::str::FromStr>(v: Option<String>) -> Option<T> {
    v.and_then(|s| s.trim().parse::<T>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}
