//! Configuration management for the hark daemon
//!
//! Layering: environment variables override the TOML config file, which
//! overrides built-in defaults.

pub mod file;

use std::path::{Path, PathBuf};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Model asset locations
    pub model: ModelConfig,

    /// Audio capture configuration
    pub audio: AudioConfig,

    /// Trigger keyword sets
    pub keywords: KeywordConfig,

    /// Speech synthesis configuration
    pub speech: SpeechConfig,

    /// Launched action command lines
    pub actions: ActionConfig,
}

/// Model asset locations
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Bundled (read-only) model directory
    pub bundled_dir: PathBuf,

    /// Writable mirror directory the recognizer loads from
    pub mirror_dir: PathBuf,

    /// Leaf-copy buffer size in bytes
    pub copy_buffer: usize,
}

/// Audio capture configuration
#[derive(Debug, Clone, Copy)]
pub struct AudioConfig {
    /// Capture and recognition sample rate in Hz
    pub sample_rate: u32,

    /// Recognition poll interval in milliseconds
    pub poll_interval_ms: u64,
}

/// Trigger keyword sets, matched in fixed order: time, camera, share
#[derive(Debug, Clone)]
pub struct KeywordConfig {
    /// Keywords that trigger the spoken-time action
    pub time: Vec<String>,

    /// Keywords that trigger the camera launch
    pub camera: Vec<String>,

    /// Keywords that trigger the text-share launch
    pub share: Vec<String>,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Clock readout format (chrono syntax)
    pub time_format: String,

    /// Speaking rate on the engine's own scale; `None` keeps the engine default
    pub rate: Option<f32>,
}

/// Launched action command lines
#[derive(Debug, Clone)]
pub struct ActionConfig {
    /// Still-image capture command
    pub camera_command: Vec<String>,

    /// Text-share command; `{text}` and `{mime}` are substituted per argument
    pub share_command: Vec<String>,

    /// MIME hint for shared text
    pub share_mime: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            poll_interval_ms: 50,
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            time: vec!["time".to_string()],
            camera: vec!["camera".to_string(), "pic".to_string()],
            share: vec!["write".to_string(), "note".to_string()],
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            time_format: "%H:%M".to_string(),
            rate: None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            bundled_dir: default_bundled_dir(),
            mirror_dir: default_data_dir().join("model"),
            copy_buffer: 1024,
        }
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            camera_command: default_camera_command(),
            share_command: default_share_command(),
            share_mime: "text/plain".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            audio: AudioConfig::default(),
            keywords: KeywordConfig::default(),
            speech: SpeechConfig::default(),
            actions: ActionConfig::default(),
        }
    }
}

/// Default bundled model directory
fn default_bundled_dir() -> PathBuf {
    PathBuf::from("/usr/share/hark/model")
}

/// Default writable data directory: `~/.local/share/hark` on Linux
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".local/share/hark"),
        |d| d.data_dir().join("hark"),
    )
}

/// Default still-image capture command
fn default_camera_command() -> Vec<String> {
    #[cfg(target_os = "macos")]
    {
        vec![
            "open".to_string(),
            "-a".to_string(),
            "Photo Booth".to_string(),
        ]
    }
    #[cfg(target_os = "linux")]
    {
        vec!["cheese".to_string()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        Vec::new()
    }
}

/// Default text-share command
fn default_share_command() -> Vec<String> {
    #[cfg(target_os = "macos")]
    {
        vec![
            "osascript".to_string(),
            "-e".to_string(),
            "set the clipboard to \"{text}\"".to_string(),
        ]
    }
    #[cfg(target_os = "linux")]
    {
        vec![
            "xdg-email".to_string(),
            "--body".to_string(),
            "{text}".to_string(),
        ]
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        Vec::new()
    }
}

impl Config {
    /// Load configuration: env > TOML file > defaults
    #[must_use]
    pub fn load() -> Self {
        let fc = file::load_config_file();
        let defaults = Self::default();

        let bundled_dir = std::env::var("HARK_MODEL_DIR")
            .ok()
            .or(fc.model.bundled_dir)
            .map_or(defaults.model.bundled_dir, PathBuf::from);

        let data_dir = std::env::var("HARK_DATA_DIR")
            .ok()
            .or(fc.model.data_dir)
            .map(PathBuf::from);
        let mirror_dir = data_dir.map_or(defaults.model.mirror_dir, |d| d.join("model"));

        // Ensure the mirror's parent exists so provisioning can write into it
        if let Some(parent) = mirror_dir.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let model = ModelConfig {
            bundled_dir,
            mirror_dir,
            copy_buffer: fc.model.copy_buffer.unwrap_or(defaults.model.copy_buffer),
        };

        let audio = AudioConfig {
            sample_rate: fc
                .audio
                .sample_rate
                .unwrap_or(defaults.audio.sample_rate),
            poll_interval_ms: fc
                .audio
                .poll_interval_ms
                .unwrap_or(defaults.audio.poll_interval_ms),
        };

        let keywords = KeywordConfig {
            time: fc.keywords.time.unwrap_or(defaults.keywords.time),
            camera: fc.keywords.camera.unwrap_or(defaults.keywords.camera),
            share: fc.keywords.share.unwrap_or(defaults.keywords.share),
        };

        let speech = SpeechConfig {
            time_format: fc
                .speech
                .time_format
                .unwrap_or(defaults.speech.time_format),
            rate: fc.speech.rate.or(defaults.speech.rate),
        };

        let actions = ActionConfig {
            camera_command: fc
                .actions
                .camera_command
                .unwrap_or(defaults.actions.camera_command),
            share_command: fc
                .actions
                .share_command
                .unwrap_or(defaults.actions.share_command),
            share_mime: fc
                .actions
                .share_mime
                .unwrap_or(defaults.actions.share_mime),
        };

        Self {
            model,
            audio,
            keywords,
            speech,
            actions,
        }
    }

    /// Load configuration with a bundled-model override from the command line
    #[must_use]
    pub fn load_with_options(model_dir: Option<&Path>) -> Self {
        let mut config = Self::load();
        if let Some(dir) = model_dir {
            config.model.bundled_dir = dir.to_path_buf();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keywords_cover_scenarios() {
        let kw = KeywordConfig::default();
        assert!(kw.time.iter().any(|k| "what time is it".contains(k)));
        assert!(kw.camera.iter().any(|k| "open camera please".contains(k)));
        assert!(kw.camera.iter().any(|k| "take a pic".contains(k)));
        assert!(kw.camera.iter().any(|k| "take a picture".contains(k)));
    }

    #[test]
    fn test_default_audio() {
        let audio = AudioConfig::default();
        assert_eq!(audio.sample_rate, 16_000);
        assert!(audio.poll_interval_ms > 0);
    }

    #[test]
    fn test_mirror_under_data_dir() {
        let model = ModelConfig::default();
        assert!(model.mirror_dir.ends_with("model"));
        assert_eq!(model.copy_buffer, 1024);
    }

    #[test]
    fn test_model_dir_override_wins() {
        let dir = Path::new("/opt/hark/model");
        let config = Config::load_with_options(Some(dir));
        assert_eq!(config.model.bundled_dir, dir);
    }
}
