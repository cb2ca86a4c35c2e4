use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn lyr_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lyr"))
}

const CATALOG: &str = r#"[
    {
        "title": "Warning Shots",
        "content": "Warning shots fired, no retreat, no surrender.\nA song about resilience under pressure.",
        "metadata": {"album": "Full Disclosure", "trackNumber": 2, "category": "lyrics"}
    },
    {
        "title": "Full Disclosure",
        "content": "Full disclosure, no composure when I enter the room.\nTruth told plainly with nothing held back.",
        "metadata": {"album": "Full Disclosure", "trackNumber": 5}
    },
    {
        "title": "",
        "content": "orphaned verse with no title"
    }
]"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    fs::write(root.join("catalog.json"), CATALOG).unwrap();

    let config_content = format!(
        r#"[storage]
backend = "sqlite"

[db]
path = "{}/data/lyr.sqlite"

[retrieval]
limit = 6

[server]
bind = "127.0.0.1:7341"
"#,
        root.display()
    );

    let config_path = config_dir.join("lyr.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_lyr(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = lyr_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run lyr binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn seeded_env() -> (TempDir, PathBuf) {
    let (tmp, config_path) = setup_test_env();
    let (_, stderr, ok) = run_lyr(&config_path, &["init"]);
    assert!(ok, "init failed: {}", stderr);

    let catalog = tmp.path().join("catalog.json");
    let (stdout, stderr, ok) = run_lyr(&config_path, &["seed", catalog.to_str().unwrap()]);
    assert!(ok, "seed failed: {}", stderr);
    assert!(stdout.contains("inserted: 2"), "unexpected seed output: {}", stdout);
    assert!(stdout.contains("skipped:  1"), "unexpected seed output: {}", stdout);

    (tmp, config_path)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();
    let (stdout, stderr, ok) = run_lyr(&config_path, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("lyr.sqlite").exists());

    // Idempotent.
    let (_, stderr, ok) = run_lyr(&config_path, &["init"]);
    assert!(ok, "second init failed: {}", stderr);
}

#[test]
fn test_search_finds_track_by_title() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, stderr, ok) = run_lyr(
        &config_path,
        &["search", "What is Warning Shots about?", "--explain"],
    );
    assert!(ok, "search failed: {}", stderr);
    assert!(stdout.contains("stage: primary"), "got: {}", stdout);
    assert!(stdout.contains("1. [0.85] Warning Shots"), "got: {}", stdout);
    assert!(!stdout.contains("2. ["), "got: {}", stdout);
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = seeded_env();
    let (stdout, _, ok) = run_lyr(&config_path, &["search", "asdkjasdlkj"]);
    assert!(ok);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_ask_json_and_history() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, stderr, ok) = run_lyr(
        &config_path,
        &["ask", "What is Full Disclosure about?", "--json"],
    );
    assert!(ok, "ask failed: {}", stderr);

    let response: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let citations = response["citations"].as_array().unwrap();
    assert_eq!(citations.len(), 1);
    assert_eq!(citations[0]["title"], "Full Disclosure");
    assert_eq!(citations[0]["score"], 0.85);
    assert!(response["answer"].as_str().unwrap().contains("[1]"));

    let (stdout, _, ok) = run_lyr(&config_path, &["history"]);
    assert!(ok);
    assert!(stdout.contains("you: What is Full Disclosure about?"));
    assert!(stdout.contains("sources: Full Disclosure"));

    let (_, _, ok) = run_lyr(&config_path, &["history", "--clear"]);
    assert!(ok);
    let (stdout, _, _) = run_lyr(&config_path, &["history"]);
    assert!(stdout.contains("No messages."));
}

#[test]
fn test_ask_empty_question_fails() {
    let (_tmp, config_path) = seeded_env();
    let (_, stderr, ok) = run_lyr(&config_path, &["ask", "   "]);
    assert!(!ok);
    assert!(stderr.contains("query must not be empty"));
}

#[test]
fn test_get_document_and_missing() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, stderr, ok) = run_lyr(&config_path, &["get", "1"]);
    assert!(ok, "get failed: {}", stderr);
    assert!(stdout.contains("title:      Warning Shots"));
    assert!(stdout.contains("\"trackNumber\":2"));

    let (_, stderr, ok) = run_lyr(&config_path, &["get", "999"]);
    assert!(!ok);
    assert!(stderr.contains("document not found: 999"));
}

#[test]
fn test_seed_directory_with_reset() {
    let (tmp, config_path) = seeded_env();

    let album = tmp.path().join("lyrics").join("full_disclosure");
    fs::create_dir_all(&album).unwrap();
    fs::write(album.join("05_full_disclosure.md"), "No composure when I enter").unwrap();

    let dir = tmp.path().join("lyrics");
    let (stdout, stderr, ok) = run_lyr(&config_path, &["seed", dir.to_str().unwrap(), "--reset"]);
    assert!(ok, "seed failed: {}", stderr);
    assert!(stdout.contains("cleared:  2"), "got: {}", stdout);
    assert!(stdout.contains("total:    1"), "got: {}", stdout);

    let (stdout, _, ok) = run_lyr(&config_path, &["search", "full disclosure"]);
    assert!(ok);
    assert!(stdout.contains("Full Disclosure"));
    assert!(stdout.contains("album: Full Disclosure"));
}

#[test]
fn test_stats_and_reset() {
    let (_tmp, config_path) = seeded_env();

    let (_, stderr, ok) = run_lyr(&config_path, &["ask", "Swordfish"]);
    assert!(ok, "ask failed: {}", stderr);

    let (stdout, _, ok) = run_lyr(&config_path, &["stats"]);
    assert!(ok);
    assert!(stdout.contains("Documents:   2"));
    assert!(stdout.contains("Messages:    2\n"), "got: {}", stdout);

    let (stdout, _, ok) = run_lyr(&config_path, &["reset"]);
    assert!(ok);
    assert!(stdout.contains("Removed 2 documents."));

    let (stdout, _, _) = run_lyr(&config_path, &["stats"]);
    assert!(stdout.contains("Documents:   0"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_lyr(&tmp.path().join("nope.toml"), &["stats"]);
    assert!(!ok);
    assert!(stderr.contains("Failed to read config file"));
}
