use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn swatchlog(dir: &Path, capacity: u32) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_swatchlog"));
    cmd.env("SWATCHLOG_DB_PATH", dir.join("history.db"))
        .env("SWATCHLOG_HISTORY_CAPACITY", capacity.to_string())
        .env_remove("SWATCHLOG_HISTORY_ENABLED")
        .current_dir(dir);
    cmd
}

fn write_themes(dir: &Path, name: &str, json: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, json).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const TWO_THEMES: &str = r#"[
    {"title": "Sunset", "author": "ann", "edited_at": "Mar 3, 2013", "rating": "4",
     "swatches": [16711680, 65280, 255]},
    {"title": "Mono", "author": "bob", "edited_at": "Mar 4, 2013", "rating": "2",
     "swatches": []}
]"#;

#[test]
fn list_empty_history() {
    let dir = TempDir::new().unwrap();
    let output = swatchlog(dir.path(), 3).arg("list").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("no history entries"));
}

#[test]
fn save_then_show_prints_hex_swatches() {
    let dir = TempDir::new().unwrap();
    let file = write_themes(dir.path(), "warm.json", TWO_THEMES);

    let output = swatchlog(dir.path(), 3)
        .args(["save", "warm"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("saved warm (2 themes)"));

    let output = swatchlog(dir.path(), 3)
        .args(["show", "warm"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Sunset by ann (Mar 3, 2013, rated 4)"), "{out}");
    assert!(out.contains("#FF0000 #00FF00 #0000FF ------- -------"), "{out}");
    assert!(out.contains("------- ------- ------- ------- -------"), "{out}");
}

#[test]
fn show_raw_prints_stored_columns() {
    let dir = TempDir::new().unwrap();
    let file = write_themes(
        dir.path(),
        "t.json",
        r#"[{"title":"t","author":"a","edited_at":"d","rating":"1","swatches":[5,7,9]}]"#,
    );
    swatchlog(dir.path(), 3)
        .args(["save", "odd"])
        .arg(&file)
        .output()
        .unwrap();

    let output = swatchlog(dir.path(), 3)
        .args(["show", "odd", "--raw"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "5 | 7 | 9 | NULL | NULL");
}

#[test]
fn saves_beyond_capacity_evict_oldest() {
    let dir = TempDir::new().unwrap();
    let file = write_themes(dir.path(), "t.json", TWO_THEMES);

    for id in ["catA", "catB", "catC"] {
        let output = swatchlog(dir.path(), 2)
            .args(["save", id])
            .arg(&file)
            .output()
            .unwrap();
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        if id == "catC" {
            assert!(stderr(&output).contains("evicted catA"));
        }
    }

    let output = swatchlog(dir.path(), 2).arg("list").output().unwrap();
    let ids: Vec<String> = stdout(&output)
        .lines()
        .filter_map(|l| l.split_whitespace().last().map(ToOwned::to_owned))
        .collect();
    assert_eq!(ids, vec!["catB", "catC"]);

    let output = swatchlog(dir.path(), 2)
        .args(["show", "catA"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not found: catA"));
}

#[test]
fn disabled_history_saves_nothing() {
    let dir = TempDir::new().unwrap();
    let file = write_themes(dir.path(), "t.json", TWO_THEMES);

    let output = swatchlog(dir.path(), 2)
        .env("SWATCHLOG_HISTORY_ENABLED", "false")
        .args(["save", "quiet"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stderr(&output).contains("history disabled"));

    let output = swatchlog(dir.path(), 2).arg("list").output().unwrap();
    assert!(stdout(&output).is_empty());
}

#[test]
fn duplicate_save_fails() {
    let dir = TempDir::new().unwrap();
    let file = write_themes(dir.path(), "t.json", TWO_THEMES);
    swatchlog(dir.path(), 3)
        .args(["save", "same"])
        .arg(&file)
        .output()
        .unwrap();

    let output = swatchlog(dir.path(), 3)
        .args(["save", "same"])
        .arg(&file)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("already exists: same"));
}

#[test]
fn save_rejects_malformed_json() {
    let dir = TempDir::new().unwrap();
    let file = write_themes(dir.path(), "bad.json", "{ not json");
    let output = swatchlog(dir.path(), 3)
        .args(["save", "bad"])
        .arg(&file)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to parse themes"));
}

#[test]
fn config_reports_env_overrides() {
    let dir = TempDir::new().unwrap();
    let output = swatchlog(dir.path(), 7).arg("config").output().unwrap();
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("capacity = 7"), "{out}");
    assert!(out.contains("history.db"), "{out}");
}
