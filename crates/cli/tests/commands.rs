use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const WORDS: &str = "hello 0.9 0.1 0.0 0.0 0.2 0.0\n\
                     world 0.1 0.9 0.1 0.0 0.0 0.1\n\
                     greetings 0.0 0.1 0.9 0.3 0.0 0.0\n\
                     friend 0.0 0.0 0.4 0.9 0.1 0.0\n\
                     earthling 0.1 0.2 0.3 0.1 0.8 0.2\n";

fn setup() -> TempDir {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("words.txt"), WORDS).unwrap();
    temp
}

#[allow(deprecated)]
fn kanaja(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kanaja").expect("binary");
    cmd.current_dir(workdir)
        .env_remove("KANAJA_STORE")
        .env("KANAJA_WORD_VECTORS", workdir.join("words.txt"))
        .env("RUST_LOG", "warn");
    cmd
}

fn run_json(workdir: &Path, args: &[&str]) -> Value {
    let output = kanaja(workdir).args(args).output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn add_then_search_both_algorithms() {
    let temp = setup();
    let root = temp.path();
    let store = root.join("vectors.json");
    let store_arg = store.to_str().unwrap();

    run_json(root, &["--store", store_arg, "add", "hello world"]);
    let friend = run_json(root, &["--store", store_arg, "add", "greetings friend"]);
    let friend_id = friend["id"].as_str().unwrap().to_string();
    assert!(store.exists());

    for algorithm in ["exact", "approximate", "knn", "ann"] {
        let response = run_json(
            root,
            &[
                "--store",
                store_arg,
                "search",
                "greetings earthling",
                "-k",
                "1",
                "--algorithm",
                algorithm,
            ],
        );
        let results = response["results"].as_array().unwrap();
        assert_eq!(results.len(), 1, "{algorithm}");
        assert_eq!(results[0]["id"], friend_id.as_str(), "{algorithm}");
        assert!(results[0]["score"].as_f64().unwrap() > 0.0);
    }

    let stats = run_json(root, &["--store", store_arg, "stats"]);
    assert_eq!(stats["vectors"], 2);
    assert_eq!(stats["dimension"], 8);
}

#[test]
fn search_returns_all_entries_when_k_is_large() {
    let temp = setup();
    let root = temp.path();
    let store = root.join("vectors.json");
    let store_arg = store.to_str().unwrap();

    for text in ["hello", "world", "friend"] {
        run_json(root, &["--store", store_arg, "add", text]);
    }
    let response = run_json(
        root,
        &["--store", store_arg, "search", "hello world", "-k", "10"],
    );
    let scores: Vec<f64> = response["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["score"].as_f64().unwrap())
        .collect();
    assert_eq!(scores.len(), 3);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn invalid_k_is_rejected() {
    let temp = setup();
    kanaja(temp.path())
        .args(["search", "hello", "-k", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("k must be a positive integer"));
}

#[test]
fn unknown_words_fail_to_store() {
    let temp = setup();
    kanaja(temp.path())
        .args(["add", "zebra quokka"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no words in the text"));
}

#[test]
fn malformed_word_table_aborts_startup() {
    let temp = setup();
    let root = temp.path();
    fs::write(root.join("words.txt"), "hello 1.0 oops\n").unwrap();
    kanaja(root)
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load word vectors"));
}

#[test]
fn empty_store_stats() {
    let temp = setup();
    let stats = run_json(temp.path(), &["stats"]);
    assert_eq!(stats["vectors"], 0);
    assert_eq!(stats["dimension"], Value::Null);
}
