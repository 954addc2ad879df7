//! End-to-end tests for the agrikb binary against a temporary SQLite store

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("agrikb").expect("binary built");
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env("AGRIKB_DATABASE", self.dir.path().join("kb.db"))
            .env("NO_COLOR", "1")
            .env_remove("AGRIKB_CONFIG")
            .env_remove("AGRIKB_API_KEY")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("utf8 output")
    }

    /// (kind, id, label) rows from `search --format compact`
    fn compact_search(&self, query: &str) -> Vec<(String, String, String)> {
        self.run(&["search", query, "--format", "compact"])
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(3, '\t');
                Some((
                    parts.next()?.to_string(),
                    parts.next()?.to_string(),
                    parts.next()?.to_string(),
                ))
            })
            .collect()
    }

    fn search_json(&self, args: &[&str]) -> serde_json::Value {
        let mut full = vec!["search"];
        full.extend_from_slice(args);
        full.extend_from_slice(&["--format", "json"]);
        serde_json::from_str(&self.run(&full)).expect("json output")
    }
}

#[test]
fn init_creates_config_and_database() {
    let ws = Workspace::new();

    ws.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized agrikb"));

    assert!(ws.dir.path().join(".agrikb/config.toml").exists());
    assert!(ws.dir.path().join(".agrikb/data.db").exists());

    ws.cmd()
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn add_then_search_and_soft_delete() {
    let ws = Workspace::new();

    ws.run(&[
        "add", "knowledge", "Testing your soil", "Use a kit or a lab.",
        "--summary", "Soil pH testing guide", "--category", "soil",
    ]);
    ws.run(&["add", "knowledge", "pH basics", "Acid and alkaline.", "--category", "soil"]);

    let found = ws.compact_search("pH");
    assert_eq!(found.len(), 2);

    let basics = found
        .iter()
        .find(|(_, _, label)| label == "pH basics")
        .expect("pH basics listed");
    ws.cmd()
        .args(["delete", "knowledge", &basics.1, "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));

    let json = ws.search_json(&["pH"]);
    let knowledge = json["knowledge"].as_array().expect("knowledge array");
    assert_eq!(knowledge.len(), 1);
    assert_eq!(knowledge[0]["summary"], "Soil pH testing guide");
    assert_eq!(json["faqs"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["practices"].as_array().map(Vec::len), Some(0));
}

#[test]
fn delete_unknown_id_succeeds_without_changes() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["delete", "faq", "abc", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing changed"));
}

#[test]
fn search_treats_wildcards_literally() {
    let ws = Workspace::new();
    ws.run(&["add", "faq", "Is 50% shade too much?", "For lettuce, no.", "-c", "crops"]);
    ws.run(&["add", "faq", "When to harvest onions?", "When tops fall over.", "-c", "crops"]);

    let percent = ws.compact_search("%");
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].2, "Is 50% shade too much?");

    assert!(ws.compact_search("_").is_empty());
    assert!(ws.compact_search("') OR 1=1 --").is_empty());

    // Blank query lists everything
    assert_eq!(ws.compact_search("").len(), 2);
}

#[test]
fn category_filter_resolves_names() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["categories", "add", "Soil Health", "-d", "Testing and fertility"])
        .assert()
        .success()
        .stdout(predicate::str::contains("soil-health"));
    ws.run(&["categories", "add", "Soil Testing", "--parent", "soil-health"]);

    ws.cmd()
        .args(["categories", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("• Soil Health [soil-health]"))
        .stdout(predicate::str::contains("  • Soil Testing [soil-testing]"));

    ws.run(&["add", "practice", "Liming", "Raise soil pH", "--category", "Soil Health", "--step", "Test", "--step", "Spread lime"]);
    ws.run(&["add", "practice", "Mulching", "Cover the soil", "--category", "water"]);

    let json = ws.search_json(&["soil", "--category", "soil-health"]);
    let practices = json["practices"].as_array().expect("practices array");
    assert_eq!(practices.len(), 1);
    assert_eq!(practices[0]["practice_name"], "Liming");
    assert_eq!(practices[0]["steps"][1], "Spread lime");
}

#[test]
fn update_changes_only_given_fields() {
    let ws = Workspace::new();
    ws.run(&["add", "faq", "How often to water tomatoes?", "Daily.", "-c", "crops", "-t", "tomato"]);
    let id = ws.compact_search("tomatoes")[0].1.clone();

    ws.run(&["update", "faq", &id, "--answer", "Twice a week, deeply."]);

    let json = ws.search_json(&["tomatoes"]);
    let faq = &json["faqs"][0];
    assert_eq!(faq["answer"], "Twice a week, deeply.");
    assert_eq!(faq["question"], "How often to water tomatoes?");
    assert_eq!(faq["tags"][0], "tomato");

    ws.cmd()
        .args(["update", "faq", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to update"));

    ws.cmd()
        .args(["update", "faq", "missing", "--answer", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn faq_usage_and_analytics() {
    let ws = Workspace::new();
    ws.run(&["categories", "add", "Irrigation"]);
    ws.run(&["add", "faq", "Best time to irrigate?", "Early morning.", "-c", "irrigation"]);
    ws.run(&["add", "knowledge", "Drip lines", "Buried or surface.", "-c", "irrigation"]);
    let id = ws.compact_search("irrigate")[0].1.clone();

    ws.run(&["faq-used", &id]);
    ws.cmd()
        .args(["faq-used", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("used 2 times"));

    let json: serde_json::Value = serde_json::from_str(&ws.run(&["analytics", "--json"])).expect("json");
    assert_eq!(json["total_knowledge"], 1);
    assert_eq!(json["total_faqs"], 1);
    assert_eq!(json["total_practices"], 0);
    assert_eq!(json["top_categories"][0]["name"], "Irrigation");
    assert_eq!(json["top_categories"][0]["count"], 0);
}

#[test]
fn context_lookup_is_logged() {
    let ws = Workspace::new();
    ws.run(&[
        "add", "faq", "How to stop tomato blight?", "Remove infected leaves.",
        "-c", "pests", "-k", "tomato,blight",
    ]);

    ws.cmd()
        .args(["context", "What causes tomato blight?", "--log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RELEVANT FREQUENTLY ASKED QUESTIONS"))
        .stderr(predicate::str::contains("Logged context usage"));

    let json: serde_json::Value = serde_json::from_str(&ws.run(&["analytics", "--json"])).expect("json");
    assert_eq!(json["recent_activity"][0]["type"], "chat_query");
    assert_eq!(json["recent_activity"][0]["title"], "Query in pests");
}

#[test]
fn config_rejects_invalid_values() {
    let ws = Workspace::new();
    ws.run(&["init"]);

    ws.run(&["config", "search.per_collection_limit", "3"]);
    ws.cmd()
        .args(["config", "search.per_collection_limit"])
        .assert()
        .success()
        .stdout(predicate::str::diff("3\n"));

    ws.cmd()
        .args(["config", "store.backend", "mongo"])
        .assert()
        .failure();
}

#[test]
fn search_limit_comes_from_config() {
    let ws = Workspace::new();
    ws.run(&["init"]);
    ws.run(&["config", "search.per_collection_limit", "3"]);

    for i in 0..5 {
        let title = format!("Article {}", i);
        ws.run(&["add", "knowledge", &title, "Body", "-c", "misc"]);
    }

    let found = ws.compact_search("");
    assert_eq!(found.len(), 3);
    assert_eq!(found[0].2, "Article 4");
}
