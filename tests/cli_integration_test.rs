use assert_cmd::Command;
use indoc::indoc;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn testup() -> Command {
    Command::cargo_bin("testup").unwrap()
}

#[test]
fn test_init_creates_config_and_refuses_overwrite() {
    let dir = TempDir::new().unwrap();

    testup()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created .testup.toml"));
    assert!(dir.path().join(".testup.toml").is_file());

    testup()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_list_shows_depth_one_units() {
    let dir = TempDir::new().unwrap();
    let tests = dir.path().join("tests");
    fs::create_dir_all(tests.join("Face/assets")).unwrap();
    fs::write(tests.join("Face/TC_Face.rb"), "").unwrap();
    fs::write(tests.join("Face/assets/TC_Hidden.rb"), "").unwrap();

    testup()
        .current_dir(dir.path())
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TC_Face"))
        .stdout(predicate::str::contains("TC_Hidden").not());
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    testup()
        .current_dir(dir.path())
        .args(["--config", "nope.toml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn test_coverage_over_existing_run() {
    let dir = TempDir::new().unwrap();
    let run = dir.path().join("results/run");
    fs::create_dir_all(&run).unwrap();
    fs::write(
        run.join("TC_Face_results.txt"),
        indoc! {"
            Loaded suite TC_Face
            Started
            test_pushpull_api_example(TC_Face): .
            test_explode(TC_Face): F

              1) Failure: test_explode(TC_Face) [TC_Face.rb]:
            expected 6 faces

            2 tests, 1 failures, 0 errors
        "},
    )
    .unwrap();
    let list = dir.path().join("api.txt");
    fs::write(&list, "Face.pushpull\nFace.explode\n").unwrap();

    testup()
        .current_dir(dir.path())
        .args(["coverage", "api.txt", "results/run", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"covered_methods\": 1"))
        .stdout(predicate::str::contains("\"value\": 50.0"));
    assert!(dir.path().join("api_coverage.html").is_file());

    testup()
        .current_dir(dir.path())
        .args(["parse", "results/run"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("test_explode(TC_Face)"));
}

#[cfg(unix)]
fn shell_suite() -> TempDir {
    let dir = TempDir::new().unwrap();
    let tests = dir.path().join("tests/Shell");
    fs::create_dir_all(&tests).unwrap();
    fs::write(
        tests.join("TC_Shell.sh"),
        indoc! {r#"
            : <<'TESTS'
            class TC_Shell
            def test_ok
            def test_bad
            TESTS
            case "$1" in
              test_ok) exit 0 ;;
              *) echo "expected ok" >&2; exit 1 ;;
            esac
        "#},
    )
    .unwrap();
    fs::write(
        dir.path().join(".testup.toml"),
        indoc! {r#"
            test_extension = "sh"

            [runner]
            command = "sh {file} {test}"
        "#},
    )
    .unwrap();
    dir
}

#[cfg(unix)]
#[test]
fn test_run_with_shell_runner() {
    let dir = shell_suite();
    let output = testup()
        .current_dir(dir.path())
        .args(["run", "--format", "json", "--quiet"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["tally"]["pass"], 1);
    assert_eq!(summary["tally"]["fail"], 1);
    assert_eq!(summary["files"][0]["element_id"], "TC_Shell.sh");
    assert_eq!(summary["files"][0]["failures"][0], "test_bad(TC_Shell)");

    let run_dir = summary["run_dir"].as_str().unwrap();
    let transcript =
        fs::read_to_string(std::path::Path::new(run_dir).join("TC_Shell_results.txt")).unwrap();
    assert!(transcript.contains("expected ok"));
}

#[cfg(unix)]
#[test]
fn test_live_run_keeps_stdout_to_events() {
    let dir = shell_suite();
    let output = testup()
        .current_dir(dir.path())
        .args(["run", "--live", "--format", "json", "--quiet", "--output", "summary.json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.trim().is_empty());
    for line in stdout.lines() {
        let event: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(event["op"], "set");
    }
    assert!(stdout.contains(r#""id":"summary""#));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["tally"]["pass"], 1);
    assert_eq!(summary["tally"]["fail"], 1);
}
