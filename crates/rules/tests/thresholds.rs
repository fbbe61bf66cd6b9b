//! Thresholds loaded from disk.

use std::io::Write;
use std::path::PathBuf;

use adwatch_rules::{RuleThresholds, RulesError};

fn shipped_rules() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/rules.yml")
}

#[test]
fn shipped_file_matches_defaults() {
    let loaded = RuleThresholds::from_file(&shipped_rules()).unwrap();
    assert_eq!(loaded, RuleThresholds::default());
}

#[test]
fn override_file_is_applied() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "token:\n  expiry_warning_days: 14").unwrap();

    let loaded = RuleThresholds::load(Some(file.path())).unwrap();
    assert_eq!(loaded.token.expiry_warning_days, 14);
    assert_eq!(loaded.cpa, RuleThresholds::default().cpa);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RuleThresholds::from_file(&dir.path().join("absent.yml")).unwrap_err();
    assert!(matches!(err, RulesError::Io(_)));
}
