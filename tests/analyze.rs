use std::io::Write;
use std::process::{Command, Stdio};

fn diffsarif(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_diffsarif"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn analyze_without_credential_exits_early() {
    let dir = tempfile::tempdir().unwrap();

    let output = diffsarif(dir.path())
        .args(["analyze", "--stdin"])
        .env_remove("OPENAI_API_KEY")
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(output.stdout.is_empty(), "no report should be printed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OPENAI_API_KEY is not set"), "stderr: {stderr}");
}

#[test]
fn credential_variable_follows_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".diffsarif.toml"),
        "[llm]\napi_key_env = \"DIFFSARIF_TEST_KEY\"\n",
    )
    .unwrap();

    let output = diffsarif(dir.path())
        .args(["analyze", "--stdin"])
        .env_remove("DIFFSARIF_TEST_KEY")
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("DIFFSARIF_TEST_KEY is not set"));
}

#[test]
fn empty_diff_exits_early_without_contacting_llm() {
    let dir = tempfile::tempdir().unwrap();

    let mut child = diffsarif(dir.path())
        .args(["analyze", "--stdin"])
        .env("OPENAI_API_KEY", "sk-never-used")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No differences found"));
    assert!(!stderr.contains("sk-never-used"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".diffsarif.toml"),
        "[analysis]\nmax_concurrent = 0\n",
    )
    .unwrap();

    let output = diffsarif(dir.path())
        .args(["analyze", "--stdin"])
        .env("OPENAI_API_KEY", "sk-test")
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn too_many_files_fail_before_any_llm_call() {
    let dir = tempfile::tempdir().unwrap();
    let diff = "--- a.py\n+++ a.py\n@@ -1 +1 @@\n-x\n+y\n--- b.py\n+++ b.py\n@@ -1 +1 @@\n-p\n+q\n";

    let mut child = diffsarif(dir.path())
        .args(["analyze", "--stdin", "--max-files", "1"])
        .env("OPENAI_API_KEY", "sk-never-used")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(diff.as_bytes()).unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("limit of 1"), "stderr: {stderr}");
}
