//! Config discovery, filtering, conflict detection and file-id extraction

mod common;

use common::write_config;
use exfig::core::discovery::{ConfigDiscovery, FileIdExtractor, PatternConfigReader};
use exfig::domain::{DiscoveryError, ExfigError};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_missing_directory() {
    let err = ConfigDiscovery::new("pkl")
        .discover_in_directory("/no/such/configs")
        .unwrap_err();
    assert!(matches!(
        err,
        ExfigError::Discovery(DiscoveryError::DirectoryNotFound(path)) if path == PathBuf::from("/no/such/configs")
    ));
}

#[test]
fn test_missing_explicit_file_is_named() {
    let dir = TempDir::new().unwrap();
    let present = write_config(dir.path(), "ios", "f1", "Assets.xcassets");
    let missing = dir.path().join("android.pkl");

    let err = ConfigDiscovery::new("pkl")
        .discover_from_paths(&[present, missing.clone()])
        .unwrap_err();
    assert!(matches!(
        err,
        ExfigError::Discovery(DiscoveryError::FileNotFound(path)) if path == missing
    ));
}

#[test]
fn test_directory_scan_is_sorted_and_shallow() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "web", "f1", "web");
    write_config(dir.path(), "android", "f1", "res");
    fs::write(dir.path().join("README.md"), "docs").unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    write_config(&nested, "ios", "f1", "Assets.xcassets");

    let configs = ConfigDiscovery::new("pkl")
        .discover_in_directory(dir.path())
        .unwrap();

    let names: Vec<&str> = configs.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["android", "web"]);
}

#[test]
fn test_invalid_files_are_separated() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "ios", "f1", "Assets.xcassets");
    fs::write(dir.path().join("helpers.pkl"), "local x = 1\n").unwrap();
    fs::write(
        dir.path().join("flutter.pkl"),
        "flutter = new Flutter {\n  output = \"lib/gen\"\n}\n",
    )
    .unwrap();

    let discovery = ConfigDiscovery::new("pkl");
    let filtered =
        discovery.filter_valid_configs(discovery.discover_in_directory(dir.path()).unwrap());

    let valid: Vec<&str> = filtered.valid.iter().map(|c| c.name.as_str()).collect();
    let invalid: Vec<&str> = filtered.invalid.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(valid, vec!["flutter", "ios"]);
    assert_eq!(invalid, vec!["helpers"]);
}

#[test]
fn test_relative_outputs_resolving_to_one_path_conflict() {
    let dir = TempDir::new().unwrap();
    let app = dir.path().join("app");
    let widgets = dir.path().join("widgets");
    fs::create_dir_all(&app).unwrap();
    fs::create_dir_all(&widgets).unwrap();

    let a = write_config(&app, "app", "f1", "../Shared/Assets.xcassets");
    let b = write_config(&widgets, "widgets", "f2", "./../Shared/Assets.xcassets");
    let c = write_config(&widgets, "other", "f3", "Own.xcassets");

    let discovery = ConfigDiscovery::new("pkl");
    let configs = discovery.discover_from_paths(&[a, b, c]).unwrap();
    let conflicts = discovery.detect_output_path_conflicts(&configs, &PatternConfigReader::new());

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].path, dir.path().join("Shared/Assets.xcassets"));
    assert_eq!(conflicts[0].config_names(), vec!["app", "widgets"]);
}

#[test]
fn test_file_ids_are_unique_across_configs() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "a", "shared", "a");
    write_config(dir.path(), "b", "own", "b");
    write_config(dir.path(), "c", "shared", "c");

    let configs = ConfigDiscovery::new("pkl")
        .discover_in_directory(dir.path())
        .unwrap();
    let ids = FileIdExtractor::new(Arc::new(PatternConfigReader::new())).extract_unique(&configs);

    let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec!["shared", "own"]);
}
