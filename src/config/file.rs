//! TOML configuration file loading
//!
//! Supports `~/.config/hark/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct HarkConfigFile {
    /// Model asset locations
    #[serde(default)]
    pub model: ModelFileConfig,

    /// Audio capture configuration
    #[serde(default)]
    pub audio: AudioFileConfig,

    /// Trigger keyword sets
    #[serde(default)]
    pub keywords: KeywordsFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Launched action command lines
    #[serde(default)]
    pub actions: ActionsFileConfig,
}

/// Model asset locations
#[derive(Debug, Default, Deserialize)]
pub struct ModelFileConfig {
    /// Bundled (read-only) model directory
    pub bundled_dir: Option<String>,

    /// Writable data directory; the model mirror lives under it
    pub data_dir: Option<String>,

    /// Leaf-copy buffer size in bytes
    pub copy_buffer: Option<usize>,
}

/// Audio capture configuration
#[derive(Debug, Default, Deserialize)]
pub struct AudioFileConfig {
    /// Capture and recognition sample rate in Hz
    pub sample_rate: Option<u32>,

    /// Recognition poll interval in milliseconds
    pub poll_interval_ms: Option<u64>,
}

/// Trigger keyword sets, matched in fixed order: time, camera, share
#[derive(Debug, Default, Deserialize)]
pub struct KeywordsFileConfig {
    pub time: Option<Vec<String>>,
    pub camera: Option<Vec<String>>,
    pub share: Option<Vec<String>>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Clock readout format (chrono syntax)
    pub time_format: Option<String>,

    /// Speaking rate, engine-specific scale
    pub rate: Option<f32>,
}

/// Launched action command lines
#[derive(Debug, Default, Deserialize)]
pub struct ActionsFileConfig {
    /// Still-image capture command
    pub camera_command: Option<Vec<String>>,

    /// Text-share command; `{text}` and `{mime}` are substituted
    pub share_command: Option<Vec<String>>,

    /// MIME hint for shared text
    pub share_mime: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `HarkConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> HarkConfigFile {
    let Some(path) = config_file_path() else {
        return HarkConfigFile::default();
    };

    if !path.exists() {
        return HarkConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                HarkConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            HarkConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/hark/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("hark").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_leaves_missing_fields_unset() {
        let parsed: HarkConfigFile = toml::from_str(
            r#"
            [keywords]
            camera = ["photo"]

            [speech]
            rate = 0.9
            "#,
        )
        .unwrap();

        assert_eq!(parsed.keywords.camera, Some(vec!["photo".to_string()]));
        assert!(parsed.keywords.time.is_none());
        assert_eq!(parsed.speech.rate, Some(0.9));
        assert!(parsed.model.bundled_dir.is_none());
        assert!(parsed.actions.share_mime.is_none());
    }

    #[test]
    fn test_empty_file_parses_to_defaults() {
        let parsed: HarkConfigFile = toml::from_str("").unwrap();
        assert!(parsed.audio.sample_rate.is_none());
        assert!(parsed.speech.time_format.is_none());
    }
}
