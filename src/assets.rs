//! Recognition model provisioning
//!
//! Mirrors the bundled read-only model tree into writable storage so the
//! recognition engine can load it. The mirror is copied once and never
//! mutated afterwards.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::config::ModelConfig;
use crate::{Error, Result};

/// Files a usable model mirror must contain, relative to the mirror root.
///
/// A Vosk acoustic model cannot load without these, so their presence is the
/// completeness check for a previously interrupted copy.
pub const REQUIRED_MODEL_FILES: &[&str] = &["am/final.mdl", "conf/mfcc.conf", "conf/model.conf"];

/// Copies the bundled model tree into its writable mirror
pub struct AssetProvisioner {
    bundled_dir: std::path::PathBuf,
    mirror_dir: std::path::PathBuf,
    copy_buffer: usize,
}

impl AssetProvisioner {
    /// Create a provisioner from model configuration
    #[must_use]
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            bundled_dir: config.bundled_dir.clone(),
            mirror_dir: config.mirror_dir.clone(),
            copy_buffer: config.copy_buffer,
        }
    }

    /// Bundled source directory
    #[must_use]
    pub fn bundled_dir(&self) -> &Path {
        &self.bundled_dir
    }

    /// Writable mirror directory
    #[must_use]
    pub fn mirror_dir(&self) -> &Path {
        &self.mirror_dir
    }

    /// Mirror the bundled model tree into writable storage
    ///
    /// An already-complete mirror is left untouched. An empty source listing
    /// is a benign no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Asset`] if a read or write fails on an individual
    /// file.
    pub fn ensure_model(&self) -> Result<()> {
        if self.is_provisioned() {
            tracing::debug!(path = %self.mirror_dir.display(), "model mirror already provisioned");
            return Ok(());
        }

        tracing::info!(
            from = %self.bundled_dir.display(),
            to = %self.mirror_dir.display(),
            "provisioning model assets"
        );
        self.copy_tree(&self.bundled_dir, &self.mirror_dir)
    }

    /// Whether the mirror exists, is non-empty, and contains every required
    /// model file
    #[must_use]
    pub fn is_provisioned(&self) -> bool {
        let Ok(mut entries) = fs::read_dir(&self.mirror_dir) else {
            return false;
        };
        entries.next().is_some() && self.missing_files().is_empty()
    }

    /// Required model files absent from the mirror
    #[must_use]
    pub fn missing_files(&self) -> Vec<&'static str> {
        REQUIRED_MODEL_FILES
            .iter()
            .filter(|rel| !self.mirror_dir.join(rel).is_file())
            .copied()
            .collect()
    }

    /// Recursively copy `source` into `target`, preserving relative names
    fn copy_tree(&self, source: &Path, target: &Path) -> Result<()> {
        if source.is_file() {
            return self.copy_file(source, target);
        }

        let entries = fs::read_dir(source)
            .map_err(|e| Error::Asset(format!("{}: {e}", source.display())))?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| Error::Asset(format!("{}: {e}", source.display())))?;

        if entries.is_empty() {
            return Ok(());
        }

        fs::create_dir_all(target)
            .map_err(|e| Error::Asset(format!("{}: {e}", target.display())))?;

        for entry in entries {
            let child_source = entry.path();
            let child_target = target.join(entry.file_name());
            if child_source.is_dir() {
                self.copy_tree(&child_source, &child_target)?;
            } else {
                self.copy_file(&child_source, &child_target)?;
            }
        }

        Ok(())
    }

    /// Byte-copy one file with a fixed-size buffer
    fn copy_file(&self, source: &Path, target: &Path) -> Result<()> {
        let mut reader = fs::File::open(source)
            .map_err(|e| Error::Asset(format!("{}: {e}", source.display())))?;
        let mut writer = fs::File::create(target)
            .map_err(|e| Error::Asset(format!("{}: {e}", target.display())))?;

        let mut buffer = vec![0u8; self.copy_buffer];
        loop {
            let read = reader
                .read(&mut buffer)
                .map_err(|e| Error::Asset(format!("{}: {e}", source.display())))?;
            if read == 0 {
                break;
            }
            writer
                .write_all(&buffer[..read])
                .map_err(|e| Error::Asset(format!("{}: {e}", target.display())))?;
        }

        Ok(())
    }
}
