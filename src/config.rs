use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::enums::{AudioCodec, Deinterlacing, Mux, Ratio, VideoCodec};
use crate::error::{Result, VlcError};

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_volume() -> i32 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub recording: RecordingConfig,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    /// In-process engine, no native library required
    Memory,
    /// System libvlc (requires the `libvlc` feature)
    Libvlc,
}

impl Default for EngineBackend {
    fn default() -> Self {
        if cfg!(feature = "libvlc") {
            EngineBackend::Libvlc
        } else {
            EngineBackend::Memory
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine backend to load
    #[serde(default)]
    pub backend: EngineBackend,
    /// Arguments passed to the engine when the instance is created
    pub args: Vec<String>,
    /// Application name and HTTP user agent reported by the engine
    pub user_agent: Option<UserAgent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAgent {
    pub name: String,
    pub http: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Directory receiving recorded and duplicated outputs
    pub output_dir: PathBuf,
    /// Output container
    pub mux: Mux,
    /// Transcode audio while recording (experimental, may be ignored by the engine)
    pub audio_codec: Option<AudioCodec>,
    /// Transcode video while recording (experimental, may be ignored by the engine)
    pub video_codec: Option<VideoCodec>,
    /// Keep displaying the stream while it is written to disk
    pub duplicate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Interval of the position/duration poll
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Initial volume (0-200)
    #[serde(default = "default_volume")]
    pub volume: i32,
    pub aspect_ratio: Option<Ratio>,
    pub deinterlace: Option<Deinterlacing>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: EngineBackend::default(),
            args: default_engine_args(),
            user_agent: None,
        }
    }
}

/// Arguments the engine is started with unless configured otherwise
pub fn default_engine_args() -> Vec<String> {
    [
        "--intf=dummy",
        "--no-media-library",
        "--no-stats",
        "--no-osd",
        "--no-loop",
        "--no-video-title-show",
        "--drop-late-frames",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            recording: RecordingConfig {
                output_dir: std::env::temp_dir(),
                mux: Mux::Mp4,
                audio_codec: None,
                video_codec: None,
                duplicate: false,
            },
            playback: PlaybackConfig {
                poll_interval_ms: default_poll_interval_ms(),
                volume: default_volume(),
                aspect_ratio: None,
                deinterlace: None,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VlcError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VlcError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VlcError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VlcError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject values the engine would refuse later
    pub fn validate(&self) -> Result<()> {
        if !(0..=200).contains(&self.playback.volume) {
            return Err(VlcError::Config(format!(
                "Volume must be between 0 and 200, got {}",
                self.playback.volume
            )));
        }
        if self.playback.poll_interval_ms == 0 {
            return Err(VlcError::Config("Poll interval must be positive".to_string()));
        }
        if let Some(bad) = self.engine.args.iter().find(|a| !a.starts_with("--")) {
            return Err(VlcError::Config(format!("Engine argument '{}' is not an option", bad)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.engine.backend = EngineBackend::Memory;
        config.recording.mux = Mux::Ogg;
        config.recording.video_codec = Some(VideoCodec::Theora);
        config.playback.aspect_ratio = Some(Ratio::R16x9);
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.engine.backend, EngineBackend::Memory);
        assert_eq!(loaded.recording.mux, Mux::Ogg);
        assert_eq!(loaded.recording.video_codec, Some(VideoCodec::Theora));
        assert_eq!(loaded.playback.aspect_ratio, Some(Ratio::R16x9));
        assert_eq!(loaded.engine.args, default_engine_args());
    }

    #[test]
    fn test_engine_vocabulary_in_toml() {
        let content = r#"
            [engine]
            backend = "memory"
            args = ["--no-osd"]

            [recording]
            output_dir = "/tmp"
            mux = "ts"
            audio_codec = "mp4a"
            duplicate = true

            [playback]
            aspect_ratio = "4:3"
            deinterlace = "yadif"
        "#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(config.recording.mux, Mux::Ts);
        assert_eq!(config.recording.audio_codec, Some(AudioCodec::Mpeg4Audio));
        assert_eq!(config.playback.aspect_ratio, Some(Ratio::R4x3));
        assert_eq!(config.playback.deinterlace, Some(Deinterlacing::Yadif));
        assert_eq!(config.playback.poll_interval_ms, 500);
        assert_eq!(config.playback.volume, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_volume() {
        let mut config = Config::default();
        config.playback.volume = 250;
        assert!(matches!(config.validate(), Err(VlcError::Config(_))));
    }

    #[test]
    fn test_validate_requires_long_options() {
        let mut config = Config::default();
        config.engine.args.push("-v".to_string());
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("'-v'"));

        config.engine.args.pop();
        config.engine.args.push("--verbose=2".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = Config::from_file("/nonexistent/vlc-connector.toml");
        assert!(matches!(result, Err(VlcError::Config(_))));
    }
}
