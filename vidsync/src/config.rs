/*!
    Playback configuration, persisted as JSON next to other per-user
    application config.
*/

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_types::PixelFormat;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/**
    Pixel formats the rescaler can be asked to produce.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputPixelFormat {
    Yuv420p,
    Rgba,
    Bgra,
    Rgb24,
}

impl From<OutputPixelFormat> for PixelFormat {
    fn from(format: OutputPixelFormat) -> Self {
        match format {
            OutputPixelFormat::Yuv420p => PixelFormat::Yuv420p,
            OutputPixelFormat::Rgba => PixelFormat::Rgba,
            OutputPixelFormat::Bgra => PixelFormat::Bgra,
            OutputPixelFormat::Rgb24 => PixelFormat::Rgb24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Attempts per tick to fetch a video frame when no packet is ready.
    pub video_retry_attempts: u32,
    /// Attempts per device pull to fetch an audio frame.
    pub audio_retry_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Pending packet count above which the oldest half is dropped.
    pub packet_high_water_mark: usize,
    /// Wall-clock multiplier, 1.0 plays in real time.
    pub speed: f64,
    /// Tick deltas at or above this are treated as a stall and ignored.
    pub max_tick_delta_ms: u64,
    pub output_pixel_format: OutputPixelFormat,
    pub audio_sample_rate: u32,
    /// Capacity in bytes of the converted-audio overflow buffer.
    pub overflow_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            video_retry_attempts: 2,
            audio_retry_attempts: 8,
            retry_backoff_ms: 0,
            packet_high_water_mark: 500,
            speed: 1.0,
            max_tick_delta_ms: 300,
            output_pixel_format: OutputPixelFormat::Yuv420p,
            audio_sample_rate: 44100,
            overflow_capacity: 192_000,
        }
    }
}

impl PlaybackConfig {
    pub fn video_retry(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.video_retry_attempts,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }

    pub fn audio_retry(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.audio_retry_attempts,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }

    pub fn max_tick_delta(&self) -> Duration {
        Duration::from_millis(self.max_tick_delta_ms)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vidsync").join("config.json"))
    }

    /**
        Load the user's config file, falling back to defaults when it is
        missing or invalid.
    */
    pub fn load() -> Self {
        let Some(path) = Self::config_file_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded playback config");
                config
            }
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring playback config");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = Self::config_file_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PlaybackConfig::default();
        assert_eq!(config.video_retry().attempts(), 2);
        assert_eq!(config.audio_retry().attempts(), 8);
        assert_eq!(config.packet_high_water_mark, 500);
        assert_eq!(config.max_tick_delta(), Duration::from_millis(300));
        assert_eq!(
            PixelFormat::from(config.output_pixel_format),
            PixelFormat::Yuv420p
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            PlaybackConfig::from_json_str(r#"{ "speed": 2.0, "output_pixel_format": "rgba" }"#)
                .unwrap();
        assert_eq!(config.speed, 2.0);
        assert_eq!(config.output_pixel_format, OutputPixelFormat::Rgba);
        assert_eq!(config.audio_sample_rate, 44100);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            PlaybackConfig::from_json_str("{ speed: fast }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir()
            .join(format!("vidsync-config-{}", std::process::id()))
            .join("config.json");
        let config = PlaybackConfig {
            max_tick_delta_ms: 500,
            ..PlaybackConfig::default()
        };

        config.save_to(&path).unwrap();
        let loaded = PlaybackConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
