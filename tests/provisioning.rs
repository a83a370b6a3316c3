//! Model provisioning integration tests
//!
//! Exercises the bundled-to-mirror copy against real directories.

use std::fs;
use std::path::{Path, PathBuf};

use hark_daemon::AssetProvisioner;
use hark_daemon::assets::REQUIRED_MODEL_FILES;

mod common;

/// Collect every file under `root`, as paths relative to it
fn relative_files(root: &Path) -> Vec<PathBuf> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<PathBuf>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                out.push(path.strip_prefix(root).unwrap().to_path_buf());
            }
        }
    }

    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

#[test]
fn test_provisions_full_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let bundled = tmp.path().join("bundled");
    let mirror = tmp.path().join("mirror");
    common::write_model_tree(&bundled);

    let provisioner = AssetProvisioner::new(&common::model_config(&bundled, &mirror));
    provisioner.ensure_model().unwrap();

    assert!(provisioner.is_provisioned());
    assert!(provisioner.missing_files().is_empty());
    for rel in REQUIRED_MODEL_FILES {
        let source = fs::read(bundled.join(rel)).unwrap();
        let copied = fs::read(mirror.join(rel)).unwrap();
        assert_eq!(source, copied, "{rel} differs from the bundled copy");
    }
}

#[test]
fn test_mirror_is_structurally_identical() {
    let tmp = tempfile::tempdir().unwrap();
    let bundled = tmp.path().join("bundled");
    let mirror = tmp.path().join("mirror");
    common::write_model_tree(&bundled);

    // Models carry more than the required files; those must come along too
    fs::create_dir_all(bundled.join("graph")).unwrap();
    fs::write(bundled.join("graph/words.txt"), b"one two three").unwrap();
    fs::write(bundled.join("README"), b"model notes").unwrap();

    let provisioner = AssetProvisioner::new(&common::model_config(&bundled, &mirror));
    provisioner.ensure_model().unwrap();

    assert_eq!(relative_files(&bundled), relative_files(&mirror));
}

#[test]
fn test_provisioning_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let bundled = tmp.path().join("bundled");
    let mirror = tmp.path().join("mirror");
    common::write_model_tree(&bundled);

    let provisioner = AssetProvisioner::new(&common::model_config(&bundled, &mirror));
    provisioner.ensure_model().unwrap();

    let marker = mirror.join(REQUIRED_MODEL_FILES[0]);
    let before = fs::metadata(&marker).unwrap().modified().unwrap();

    // A complete mirror is left untouched on the next run
    provisioner.ensure_model().unwrap();
    let after = fs::metadata(&marker).unwrap().modified().unwrap();

    assert_eq!(before, after);
    assert_eq!(relative_files(&bundled), relative_files(&mirror));
}

#[test]
fn test_interrupted_copy_is_repaired() {
    let tmp = tempfile::tempdir().unwrap();
    let bundled = tmp.path().join("bundled");
    let mirror = tmp.path().join("mirror");
    common::write_model_tree(&bundled);

    let provisioner = AssetProvisioner::new(&common::model_config(&bundled, &mirror));
    provisioner.ensure_model().unwrap();

    // Simulate a copy that died partway: a required file is gone
    fs::remove_file(mirror.join("conf/model.conf")).unwrap();
    assert!(!provisioner.is_provisioned());
    assert_eq!(provisioner.missing_files(), vec!["conf/model.conf"]);

    provisioner.ensure_model().unwrap();
    assert!(provisioner.is_provisioned());
}

#[test]
fn test_missing_bundled_dir_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let bundled = tmp.path().join("absent");

    let provisioner =
        AssetProvisioner::new(&common::model_config(&bundled, &tmp.path().join("mirror")));
    let err = provisioner.ensure_model().unwrap_err();

    assert!(err.to_string().contains("absent"));
}
