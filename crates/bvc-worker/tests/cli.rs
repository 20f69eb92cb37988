//! Command-line tests of the `blackvueconcat` binary.

use assert_cmd::Command;

fn blackvueconcat() -> Command {
    Command::cargo_bin("blackvueconcat").unwrap()
}

#[test]
fn test_help_lists_options() {
    let output = blackvueconcat().arg("--help").output().unwrap();
    assert!(output.status.success());

    let help = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--logging-level",
        "--source-dir",
        "--work-dir",
        "--output-dir",
        "--consecutive-threshold",
        "--concat-threshold",
        "--retention",
        "--initial-impact",
        "--no-output",
        "--overwrite",
    ] {
        assert!(help.contains(flag), "missing {flag} in help");
    }
}

#[test]
fn test_rejects_unknown_logging_level() {
    blackvueconcat()
        .args(["--logging-level", "VERBOSE"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_source_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");

    blackvueconcat()
        .arg("--source-dir")
        .arg(&missing)
        .arg("--work-dir")
        .arg(dir.path())
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .code(1);
}

#[test]
fn test_empty_directories_succeed() {
    let dir = tempfile::tempdir().unwrap();

    blackvueconcat()
        .args(["--logging-level", "DEBUG"])
        .arg("--source-dir")
        .arg(dir.path())
        .arg("--work-dir")
        .arg(dir.path())
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .success();

    assert!(dir.path().join("blackvueconcat.lock").exists());
}

#[test]
fn test_log_file_receives_lines() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("concat.log");

    blackvueconcat()
        .args(["--logging-level", "DEBUG"])
        .arg("--source-dir")
        .arg(dir.path())
        .arg("--work-dir")
        .arg(dir.path())
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--log-file")
        .arg(&log)
        .assert()
        .success();

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("start"));
}
