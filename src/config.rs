use anyhow::{Context, Result};
use std::{str::FromStr, time::Duration};

use crate::audio::controls::FeatureSet;

#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub command_prefix: String,
    pub embed_footer: String,

    // Spotify (opcional)
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,

    // Audio
    pub default_volume: f32,
    pub max_queue_size: usize,
    pub disconnect_grace: Duration,

    // yt-dlp
    pub ytdlp_path: String,
    pub resolve_timeout: Duration,

    // Features
    pub enable_autoplay: bool,
    pub enable_replay: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda de
    /// variables. Las variables vacías cuentan como ausentes.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            // Discord
            discord_token: var("DISCORD_TOKEN").context("DISCORD_TOKEN no está definido")?,
            command_prefix: var("COMMAND_PREFIX").unwrap_or_else(|| "!!".to_string()),
            embed_footer: var("EMBED_FOOTER").unwrap_or_else(|| "🎵 Guild Jukebox".to_string()),

            spotify_client_id: var("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: var("SPOTIFY_CLIENT_SECRET"),

            // Audio
            default_volume: parse_or(&var, "DEFAULT_VOLUME", 0.5)?,
            max_queue_size: parse_or(&var, "MAX_QUEUE_SIZE", 1000)?,
            disconnect_grace: duration_or(&var, "DISCONNECT_GRACE", Duration::from_millis(500))?,

            ytdlp_path: var("YTDLP_PATH").unwrap_or_else(|| "yt-dlp".to_string()),
            resolve_timeout: duration_or(&var, "RESOLVE_TIMEOUT", Duration::from_secs(60))?,

            // Features
            enable_autoplay: parse_or(&var, "ENABLE_AUTOPLAY", true)?,
            enable_replay: parse_or(&var, "ENABLE_REPLAY", true)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// - Volume must be between 0.0 and 2.0
    /// - Queue size and resolve timeout must be greater than 0
    /// - The command prefix cannot contain whitespace
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.default_volume) {
            anyhow::bail!(
                "Default volume must be between 0.0 and 2.0, got: {}",
                self.default_volume
            );
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.resolve_timeout.is_zero() {
            anyhow::bail!("Resolve timeout must be greater than 0");
        }

        if self.command_prefix.chars().any(char::is_whitespace) {
            anyhow::bail!("Command prefix cannot contain whitespace: {:?}", self.command_prefix);
        }

        Ok(())
    }

    /// Credenciales de Spotify, solo si están las dos
    pub fn spotify_credentials(&self) -> Option<(String, String)> {
        match (&self.spotify_client_id, &self.spotify_client_secret) {
            (Some(id), Some(secret)) => Some((id.clone(), secret.clone())),
            _ => None,
        }
    }

    pub fn features(&self) -> FeatureSet {
        FeatureSet {
            replay: self.enable_replay,
            autoplay: self.enable_autoplay,
        }
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Never includes tokens or client secrets.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Prefix: {}\n  \
            Audio: {}% vol, {} max queue, {} disconnect grace\n  \
            yt-dlp: {} (timeout {})\n  \
            Spotify: {}\n  \
            Features: Autoplay={}, Replay={}",
            self.command_prefix,
            (self.default_volume * 100.0) as u32,
            self.max_queue_size,
            humantime::format_duration(self.disconnect_grace),
            self.ytdlp_path,
            humantime::format_duration(self.resolve_timeout),
            if self.spotify_credentials().is_some() {
                "enabled"
            } else {
                "disabled"
            },
            self.enable_autoplay,
            self.enable_replay,
        )
    }
}

fn parse_or<T>(var: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Valor inválido para {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn duration_or(
    var: impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    match var(key) {
        Some(raw) => humantime::parse_duration(raw.trim())
            .with_context(|| format!("Duración inválida para {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
