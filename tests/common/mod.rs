//! Shared test utilities

use std::fs;
use std::path::Path;

use hark_daemon::assets::REQUIRED_MODEL_FILES;
use hark_daemon::config::ModelConfig;

/// Lay down a minimal bundled model tree containing every required file
pub fn write_model_tree(bundled: &Path) {
    for rel in REQUIRED_MODEL_FILES {
        let path = bundled.join(rel);
        let parent = path.parent().expect("required file has a parent");
        fs::create_dir_all(parent).expect("failed to create model subdir");
        fs::write(&path, format!("contents of {rel}")).expect("failed to write model file");
    }
}

/// Model configuration rooted in test directories
#[must_use]
pub fn model_config(bundled: &Path, mirror: &Path) -> ModelConfig {
    ModelConfig {
        bundled_dir: bundled.to_path_buf(),
        mirror_dir: mirror.to_path_buf(),
        copy_buffer: 64,
    }
}

/// JSON payload in the shape the recognizer emits
#[must_use]
pub fn transcript_payload(text: &str) -> String {
    serde_json::json!({ "text": text }).to_string()
}
