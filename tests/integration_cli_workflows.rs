//! Integration tests exercising CLI commands end-to-end.
//!
//! These tests invoke the real `orgchart` binary against a temporary data
//! directory and check output and persisted state.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

use orgchart::store::{self, load_snapshot};
use orgchart::test_helpers::{directory_of, setup_orgchart};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn orgchart_binary() -> PathBuf {
    let mut path = std::env::current_exe().expect("could not get current exe path");
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("orgchart");
    assert!(
        path.exists(),
        "orgchart binary not found at {:?}. Run `cargo build` first.",
        path
    );
    path
}

/// User-wide config directory for a test run, next to the data directory.
fn fake_config_home(dir: &Path) -> PathBuf {
    dir.parent().unwrap_or(dir).join("xdg-config")
}

fn orgchart_cmd(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(orgchart_binary())
        .env("XDG_CONFIG_HOME", fake_config_home(dir))
        .arg("--dir")
        .arg(dir)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .unwrap_or_else(|e| panic!("Failed to run orgchart {:?}: {}", args, e))
}

fn orgchart_ok(dir: &Path, args: &[&str]) -> String {
    let output = orgchart_cmd(dir, args);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    assert!(
        output.status.success(),
        "orgchart {:?} failed.\nstdout: {}\nstderr: {}",
        args,
        stdout,
        stderr
    );
    stdout
}

fn orgchart_fail(dir: &Path, args: &[&str]) -> String {
    let output = orgchart_cmd(dir, args);
    assert!(
        !output.status.success(),
        "orgchart {:?} unexpectedly succeeded",
        args
    );
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn small_org(tmp: &TempDir) -> PathBuf {
    let dir = tmp.path().join(".orgchart");
    setup_orgchart(
        &dir,
        &directory_of(&[
            ("ceo", "Exec", None),
            ("vp", "Eng", Some("ceo")),
            ("dev1", "Eng", Some("vp")),
            ("dev2", "Eng", Some("vp")),
            ("rep", "Sales", Some("ceo")),
        ]),
    );
    dir
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn test_init_mock_then_tree() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join(".orgchart");

    orgchart_ok(&dir, &["init", "--mock"]);
    assert!(store::directory_path(&dir).exists());
    assert!(dir.join("config.toml").exists());

    let stdout = orgchart_ok(&dir, &["--json", "tree"]);
    let tree: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(tree["root"]["kind"]["id"], "user-001");

    // A second init refuses to overwrite.
    orgchart_fail(&dir, &["init"]);
}

#[test]
fn test_commands_require_init() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join(".orgchart");
    let stderr = orgchart_fail(&dir, &["tree"]);
    assert!(stderr.contains("not initialized"), "stderr: {}", stderr);
}

#[test]
fn test_global_config_used_without_local_file() {
    let tmp = TempDir::new().unwrap();
    let dir = small_org(&tmp);
    let global = fake_config_home(&dir).join("orgchart");
    fs::create_dir_all(&global).unwrap();
    fs::write(
        global.join("config.toml"),
        "[tree]\ngroup_by_department = false\n",
    )
    .unwrap();

    let stdout = orgchart_ok(&dir, &["tree"]);
    assert!(!stdout.contains("member(s)"), "stdout: {}", stdout);

    // A local file wins over the global one.
    fs::write(dir.join("config.toml"), "[tree]\ngroup_by_department = true\n").unwrap();
    let stdout = orgchart_ok(&dir, &["tree"]);
    assert!(stdout.contains("[Eng] 3 member(s)"), "stdout: {}", stdout);
}

// ---------------------------------------------------------------------------
// read-only commands
// ---------------------------------------------------------------------------

#[test]
fn test_layout_json_has_nodes_edges_and_paths() {
    let tmp = TempDir::new().unwrap();
    let dir = small_org(&tmp);

    let stdout = orgchart_ok(&dir, &["--json", "layout"]);
    let layout: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    // ceo, two department groups, vp, dev1, dev2, rep
    assert_eq!(layout["nodes"].as_array().unwrap().len(), 7);
    assert_eq!(layout["edges"].as_array().unwrap().len(), 6);
    assert_eq!(layout["edge_paths"].as_array().unwrap().len(), 6);
    assert!(layout["bounds"].is_object());

    orgchart_ok(&dir, &["layout", "--cluster"]);
}

#[test]
fn test_search_and_departments() {
    let tmp = TempDir::new().unwrap();
    let dir = small_org(&tmp);

    let stdout = orgchart_ok(&dir, &["--json", "search", "--department", "Eng"]);
    let hits: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let ids: Vec<&str> = hits
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["vp", "dev1", "dev2"]);

    let stdout = orgchart_ok(&dir, &["departments"]);
    assert!(stdout.contains("Eng"));
    assert!(stdout.contains("Sales"));
}

#[test]
fn test_show_person_details() {
    let tmp = TempDir::new().unwrap();
    let dir = small_org(&tmp);

    let stdout = orgchart_ok(&dir, &["--json", "show", "vp"]);
    let details: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(details["team_size"], 2);
    assert_eq!(details["direct_reports"].as_array().unwrap().len(), 2);
    assert_eq!(details["manager_chain"][0]["id"], "ceo");

    orgchart_fail(&dir, &["show", "nobody"]);
}

#[test]
fn test_check_reports_loop() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join(".orgchart");
    setup_orgchart(
        &dir,
        &directory_of(&[
            ("ceo", "Exec", None),
            ("a", "X", Some("b")),
            ("b", "X", Some("a")),
        ]),
    );
    let stderr = orgchart_fail(&dir, &["check"]);
    assert!(stderr.contains("Management loops"), "stderr: {}", stderr);
}

#[test]
fn test_export_csv() {
    let tmp = TempDir::new().unwrap();
    let dir = small_org(&tmp);
    let out = tmp.path().join("people.csv");

    orgchart_ok(&dir, &["export", "--output", out.to_str().unwrap()]);
    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(content.lines().count(), 6);
    assert!(content.contains("Person dev1,,Eng,,,,Person vp"));
}

// ---------------------------------------------------------------------------
// edits
// ---------------------------------------------------------------------------

#[test]
fn test_manager_set_and_remove() {
    let tmp = TempDir::new().unwrap();
    let dir = small_org(&tmp);

    orgchart_ok(&dir, &["manager", "set", "rep", "vp"]);
    assert_eq!(load_snapshot(&dir).unwrap().manager_of("rep"), Some("vp"));

    let stdout = orgchart_ok(&dir, &["--json", "manager", "remove", "rep"]);
    let changes: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(changes[0]["action"], "remove");
    assert_eq!(changes[0]["person_id"], "rep");
    assert_eq!(load_snapshot(&dir).unwrap().manager_of("rep"), None);
}

#[test]
fn test_manager_set_rejects_cycle_and_keeps_file() {
    let tmp = TempDir::new().unwrap();
    let dir = small_org(&tmp);
    let before = fs::read_to_string(store::directory_path(&dir)).unwrap();

    let stderr = orgchart_fail(&dir, &["manager", "set", "vp", "dev1"]);
    assert!(stderr.contains("cycle"), "stderr: {}", stderr);
    assert_eq!(fs::read_to_string(store::directory_path(&dir)).unwrap(), before);
}

#[test]
fn test_exclude_and_include() {
    let tmp = TempDir::new().unwrap();
    let dir = small_org(&tmp);

    orgchart_ok(&dir, &["exclude", "dev2"]);
    let stdout = orgchart_ok(&dir, &["tree", "--no-grouping"]);
    assert!(!stdout.contains("(dev2)"));

    orgchart_ok(&dir, &["include", "dev2"]);
    let stdout = orgchart_ok(&dir, &["tree", "--no-grouping"]);
    assert!(stdout.contains("(dev2)"));
}
