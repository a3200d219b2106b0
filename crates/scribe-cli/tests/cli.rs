use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn tools_available() -> bool {
    ["git", "bash"].iter().all(|tool| {
        std::process::Command::new(tool)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

fn scribe() -> Command {
    let mut cmd = Command::cargo_bin("scribe").unwrap();
    cmd.env_remove("SCRIBE_REMOTE_URL")
        .env_remove("SCRIBE_FORK_URL")
        .env_remove("SCRIBE_POOL");
    cmd
}

const CLONE_DOC: &str = "# Getting started\n\n\
                         ```sh\n\
                         $ git clone https://github.com/username/reponame\n\
                         $ cd reponame\n\
                         ```\n";

#[test]
fn test_pool_lists_builtin_identities() {
    scribe()
        .arg("pool")
        .assert()
        .success()
        .stdout(predicate::str::contains("e008dfa"))
        .stdout(predicate::str::contains("23 identities"));
}

#[test]
fn test_pool_rejects_duplicate_prefixes() {
    let tmp = tempfile::TempDir::new().unwrap();
    let pool = tmp.path().join("pool.json");
    fs::write(
        &pool,
        r#"[
            {"hash": "abcdef0000000000000000000000000000000000", "date": "Mon May 24 00:29:07 2021 +0300"},
            {"hash": "abcdef0111111111111111111111111111111111", "date": "Mon May 24 00:28:13 2021 +0300"}
        ]"#,
    )
    .unwrap();
    scribe()
        .args(["pool", "--file"])
        .arg(&pool)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid identity pool"));
}

#[test]
fn test_run_rewrites_document_in_place() {
    let tmp = tempfile::TempDir::new().unwrap();
    let doc = tmp.path().join("getting-started.md");
    fs::write(&doc, CLONE_DOC).unwrap();

    scribe()
        .arg("run")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("changed: 2 commands in 1 blocks"));

    let written = fs::read_to_string(&doc).unwrap();
    assert!(written.contains(
        "$ git clone https://github.com/username/reponame\nCloning into 'reponame'...\n"
    ));
    assert!(written.ends_with("\n$ cd reponame\n```\n"));
}

#[test]
fn test_check_fails_on_stale_document_and_leaves_it_alone() {
    let tmp = tempfile::TempDir::new().unwrap();
    let doc = tmp.path().join("getting-started.md");
    fs::write(&doc, CLONE_DOC).unwrap();

    scribe()
        .arg("check")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of date"));
    assert_eq!(fs::read_to_string(&doc).unwrap(), CLONE_DOC);

    scribe().arg("run").arg(&doc).assert().success();
    scribe()
        .args(["--format", "json", "check"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""changed": false"#));
}

#[test]
fn test_run_reads_contents_index() {
    if !tools_available() {
        return;
    }
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(
        tmp.path().join("README.md"),
        "# Guide\n\nContents:\n\
         - [Getting started](getting-started.md): cloning\n\
         - [Looking around](looking-around.md): ls and status\n",
    )
    .unwrap();
    fs::write(tmp.path().join("getting-started.md"), CLONE_DOC).unwrap();
    fs::write(
        tmp.path().join("looking-around.md"),
        "```sh\n$ ls\n$ git status\n```\n",
    )
    .unwrap();

    scribe()
        .arg("run")
        .arg("--contents-from")
        .arg(tmp.path().join("README.md"))
        .assert()
        .success()
        .stdout(predicate::str::contains("2 documents, 2 changed"));

    let second = fs::read_to_string(tmp.path().join("looking-around.md")).unwrap();
    assert!(second.contains("$ ls\nLICENSE  README.md\n"));
    assert!(second.contains("$ git status\nOn branch main\n"));
}

#[test]
fn test_failing_command_aborts_without_writing() {
    if !tools_available() {
        return;
    }
    let tmp = tempfile::TempDir::new().unwrap();
    let doc = tmp.path().join("broken.md");
    let content = "```sh\n$ git status\n```\n";
    fs::write(&doc, content).unwrap();

    scribe()
        .arg("run")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("git status"));
    assert_eq!(fs::read_to_string(&doc).unwrap(), content);
}

#[test]
fn test_sandbox_keep() {
    let output = scribe()
        .args(["--format", "json", "sandbox", "--keep"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let layout: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let root = std::path::PathBuf::from(layout["root"].as_str().unwrap());
    assert!(root.join("fake_remote/reponame/README.md").exists());
    assert_eq!(layout["kept"], true);
    fs::remove_dir_all(root).unwrap();
}

#[test]
fn test_sandbox_without_keep_is_removed() {
    scribe()
        .arg("sandbox")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sandbox removed"));
}
