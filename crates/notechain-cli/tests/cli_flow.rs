use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const KEY: &str = "0101010101010101010101010101010101010101010101010101010101010101";

fn notechain(data_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("notechain").unwrap();
    cmd.env("NOTECHAIN_DATA_DIR", data_dir).env("NOTECHAIN_KEY", KEY);
    cmd
}

#[test]
fn add_show_and_verify() {
    let dir = tempdir().unwrap();
    notechain(dir.path())
        .args(["add", "--id", "n1", "--title", "Groceries"])
        .args(["--content", "milk, eggs", "--tag", "home"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"previousHash\""));
    notechain(dir.path())
        .args(["add", "--id", "n2", "--title", "Taxes"])
        .args(["--content", "file by April", "--tag", "finance"])
        .assert()
        .success();

    notechain(dir.path())
        .args(["show", "n2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("file by April"));
    notechain(dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"count\": 3")
                .and(predicate::str::contains("\"isValid\": true")),
        );
    notechain(dir.path())
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("chain is valid"));
}

#[test]
fn update_keeps_sealed_copy() {
    let dir = tempdir().unwrap();
    notechain(dir.path())
        .args(["add", "--id", "n1", "--title", "Groceries", "--content", "milk"])
        .assert()
        .success();
    notechain(dir.path())
        .args(["update", "n1", "--content", "milk, eggs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("milk, eggs"));
    notechain(dir.path())
        .args(["show", "n1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"content\": \"milk\""));
}

#[test]
fn wrong_key_cannot_show() {
    let dir = tempdir().unwrap();
    notechain(dir.path())
        .args(["add", "--id", "n1", "--title", "Groceries", "--content", "milk"])
        .assert()
        .success();
    notechain(dir.path())
        .env("NOTECHAIN_KEY", "02".repeat(32))
        .args(["show", "n1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("decryption failed"));
}

#[test]
fn export_then_import_tampered_is_rejected() {
    let dir = tempdir().unwrap();
    let export = dir.path().join("chain.json");
    let data = dir.path().join("data");
    notechain(&data)
        .args(["add", "--id", "n1", "--title", "Groceries", "--content", "milk"])
        .assert()
        .success();
    notechain(&data)
        .args(["export", "--out", export.to_str().unwrap()])
        .assert()
        .success();

    let tampered = std::fs::read_to_string(&export).unwrap().replace("\"n1\"", "\"n9\"");
    let tampered_path = dir.path().join("tampered.json");
    std::fs::write(&tampered_path, tampered).unwrap();

    notechain(&data)
        .args(["import", tampered_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed validation"));
    notechain(&data)
        .args(["import", export.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("imported 2 blocks"));
}

#[test]
fn digest_prints_sha256() {
    let dir = tempdir().unwrap();
    notechain(dir.path())
        .args(["digest", "abc"])
        .assert()
        .success()
        .stdout("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad\n");
}

#[test]
fn genesis_note_id_round_trips() {
    let dir = tempdir().unwrap();
    notechain(dir.path())
        .args(["add", "--id", "genesis", "--title", "Groceries", "--content", "milk"])
        .assert()
        .success();
    notechain(dir.path())
        .args(["show", "genesis"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Groceries\""));
}

#[test]
fn add_can_be_retried_after_mining_gives_up() {
    let dir = tempdir().unwrap();
    notechain(dir.path())
        .args(["--difficulty", "64", "--max-mining-iterations", "3"])
        .args(["add", "--id", "n1", "--title", "Groceries", "--content", "milk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mining gave up"));
    notechain(dir.path())
        .args(["add", "--id", "n1", "--title", "Groceries", "--content", "milk"])
        .assert()
        .success();
}

#[test]
fn difficulty_below_minimum_is_refused() {
    let dir = tempdir().unwrap();
    notechain(dir.path())
        .args(["--difficulty", "0", "stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("below the minimum"));
}

#[test]
fn harder_difficulty_reads_existing_chain() {
    let dir = tempdir().unwrap();
    notechain(dir.path())
        .args(["add", "--id", "n1", "--title", "Groceries", "--content", "milk"])
        .assert()
        .success();
    notechain(dir.path())
        .args(["--difficulty", "3", "verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chain is valid"));
}
