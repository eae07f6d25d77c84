//! End-to-end scans against a stand-in scanner, locally and through a worker
#![cfg(unix)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

/// Records its arguments to `argv.txt` in the working directory, prints one
/// finding and exits with the code given in `SCAN_EXIT` (default 0)
const FAKE_SCANNER: &str = "#!/bin/sh\n\
printf '%s\\n' \"$@\" > argv.txt\n\
echo \"[critical] [demo-template] https://example.com\"\n\
exit ${SCAN_EXIT:-0}\n";

/// Place the stand-in scanner where provisioning would install it, so no
/// download happens
fn install_fake_scanner(workspace: &Path) {
    let dir = workspace.join(".nuclei/3.3.7/linux-amd64");
    fs::create_dir_all(&dir).unwrap();
    let binary = dir.join("nuclei");
    fs::write(&binary, FAKE_SCANNER).unwrap();
    fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();
}

fn write_config(dir: &Path, remote: bool) {
    let mut config = String::from("[templates]\nupdate = false\n");
    if remote {
        config.push_str(&format!(
            "\n[remote]\nprogram = \"{}\"\nargs = [\"worker\"]\nos = \"linux\"\narch = \"amd64\"\n",
            cargo_bin("nuclei-step").display()
        ));
    }
    fs::write(dir.join("nuclei-step.toml"), config).unwrap();
}

fn nuclei_step(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nuclei-step").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

fn recorded_argv(workspace: &Path) -> Vec<String> {
    fs::read_to_string(workspace.join("argv.txt"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_local_scan_passes_arguments_and_streams_output() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("job");
    install_fake_scanner(&workspace);
    write_config(temp.path(), false);

    nuclei_step(&temp)
        .args(["run", "--target", "https://example.com", "--flags", "-severity critical"])
        .args(["--workspace", "job", "--run-id", "42", "--os", "linux", "--arch", "amd64"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Retrieved operating system: linux/amd64"))
        .stdout(predicate::str::contains("[critical] [demo-template] https://example.com"));

    let workspace = workspace.canonicalize().unwrap();
    let templates = workspace.join("nuclei-templates").display().to_string();
    let output = workspace.join("nucleiOutput-42.txt").display().to_string();
    assert_eq!(
        recorded_argv(&workspace),
        [
            "-templates",
            templates.as_str(),
            "-target",
            "https://example.com",
            "-output",
            output.as_str(),
            "-no-color",
            "-severity",
            "critical",
        ]
    );
}

#[test]
fn test_local_scan_writes_reporting_config_and_returns_exit_code() {
    let temp = TempDir::new().unwrap();
    install_fake_scanner(temp.path());
    write_config(temp.path(), false);
    fs::write(temp.path().join("jira.yml"), "issueTracker: jira").unwrap();

    nuclei_step(&temp)
        .env("SCAN_EXIT", "3")
        .args(["run", "--target", "https://example.com", "--report-config", "jira.yml"])
        .args(["--os", "linux", "--arch", "amd64"])
        .assert()
        .code(3);

    let workspace = temp.path().canonicalize().unwrap();
    let config_path = workspace.join("reporting_config.yml");
    assert_eq!(fs::read_to_string(&config_path).unwrap(), "issueTracker: jira");

    let argv = recorded_argv(&workspace);
    let position = argv.iter().position(|a| a == "-report-config").unwrap();
    assert_eq!(argv[position + 1], config_path.display().to_string());
}

#[test]
fn test_remote_scan_runs_through_worker() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("agent-workspace");
    install_fake_scanner(&workspace);
    write_config(temp.path(), true);

    nuclei_step(&temp)
        .env("SCAN_EXIT", "2")
        .args(["run", "--remote", "--target", "https://example.com", "--run-id", "9"])
        .arg("--workspace")
        .arg(&workspace)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Retrieved operating system: linux/amd64"))
        .stdout(predicate::str::contains("[critical] [demo-template] https://example.com"));

    let workspace = workspace.canonicalize().unwrap();
    let argv = recorded_argv(&workspace);
    assert!(argv.contains(&workspace.join("nucleiOutput-9.txt").display().to_string()));
}

#[test]
fn test_remote_scan_with_relative_workspace() {
    let temp = TempDir::new().unwrap();
    install_fake_scanner(&temp.path().join("job"));
    write_config(temp.path(), true);

    nuclei_step(&temp)
        .args(["run", "--remote", "--workspace", "job", "--target", "https://example.com"])
        .args(["--run-id", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[critical] [demo-template] https://example.com"))
        .stdout(predicate::str::contains("Failed to launch").not());

    let workspace = temp.path().join("job").canonicalize().unwrap();
    let output = workspace.join("nucleiOutput-5.txt").display().to_string();
    assert!(recorded_argv(&workspace).contains(&output));
}

#[test]
fn test_worker_reports_malformed_request() {
    let temp = TempDir::new().unwrap();
    nuclei_step(&temp)
        .arg("worker")
        .write_stdin("this is not a request\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""event":"error""#))
        .stdout(predicate::str::contains("invalid_request"));
}
