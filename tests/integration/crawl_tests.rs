//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up both the forum and the Ollama
//! endpoint, and run full section scans against a SQLite file.

use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};
use talkscan::config::{load_config, Config};
use talkscan::crawler::{crawl, NOTE_ANALYZED, NOTE_UNAVAILABLE};
use talkscan::output::{build_report, write_report};
use talkscan::storage::{SqliteStorage, Storage};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANNOUNCEMENT_BODY: &str =
    "Official whitepaper: https://example.org/wp.pdf, github.com/foo/bar, premine 3%";

/// Writes a config file pointing at the mock servers and loads it
fn create_test_config(dir: &TempDir, forum: &MockServer, ollama: &MockServer) -> Config {
    let config_path = dir.path().join("talkscan.toml");
    let toml = format!(
        r#"
[forum]
base-url = "{forum}"
section-id = 159
pages = 1

[crawler]
max-retries = 1
request-timeout-secs = 5
pace-millis = 0
workers = 2

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[classifier]
endpoint = "{ollama}"
model = "llama3.1"
timeout-secs = 5

[output]
database-path = "{db}"
report-path = "{report}"
"#,
        forum = forum.uri(),
        ollama = ollama.uri(),
        db = dir.path().join("talkscan.db").display(),
        report = dir.path().join("report.json").display(),
    );
    std::fs::write(&config_path, toml).expect("Failed to write config");
    load_config(&config_path).expect("Failed to load config")
}

fn open_storage(config: &Config) -> Arc<Mutex<SqliteStorage>> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .expect("Failed to open database");
    Arc::new(Mutex::new(storage))
}

fn listing_html(forum: &MockServer, ids: &[i64]) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<tr><td><span><a href="{}/index.php?topic={}.0">Topic {}</a></span>
                <a class="new" href="{}/index.php?topic={}.msg{}#new"><img src="new.gif"></a></td></tr>"#,
                forum.uri(),
                id,
                id,
                forum.uri(),
                id,
                id + 1
            )
        })
        .collect();
    format!("<html><body><table>{}</table></body></html>", rows)
}

fn topic_html(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{} | Bitcoin Forum</title></head><body>
        <td class="poster_info"><b><a id="author_3" href="/profile">coindev</a></b></td>
        <td class="td_headerandpost"><div class="post">{}</div></td>
        </body></html>"#,
        title, body
    )
}

async fn mount_listing(forum: &MockServer, ids: &[i64]) {
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("board", "159.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(forum, ids)))
        .mount(forum)
        .await;
}

async fn mount_topic(forum: &MockServer, id: i64, template: ResponseTemplate, hits: u64) {
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("topic", format!("{}.msg{}", id, id + 1)))
        .respond_with(template)
        .expect(hits)
        .mount(forum)
        .await;
}

/// Ollama answer wrapping the classification in prose and a code fence
fn ollama_answer() -> serde_json::Value {
    let classification = json!({
        "innovation_score": 80,
        "disruptiveness_score": 60,
        "technical_score": 70,
        "premine_analysis": "3%",
        "is_fork": false,
        "fork_base": null,
        "mining_algorithm": "RandomX",
        "consensus_mechanism": "PoW",
        "unique_technical_features": ["ring signatures"],
        "technical_red_flags": [],
        "technical_strengths": ["open source"],
        "realism_assessment": "realistic"
    });

    json!({
        "model": "llama3.1",
        "response": format!("Here is the analysis:\n```json\n{}\n```", classification),
        "done": true
    })
}

async fn mount_ollama(ollama: &MockServer, template: ResponseTemplate, hits: u64) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"model": "llama3.1", "stream": false})))
        .respond_with(template)
        .expect(hits)
        .mount(ollama)
        .await;
}

#[tokio::test]
async fn test_announcement_end_to_end() {
    let forum = MockServer::start().await;
    let ollama = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &forum, &ollama);

    mount_listing(&forum, &[5001]).await;
    mount_topic(
        &forum,
        5001,
        ResponseTemplate::new(200).set_body_string(topic_html("[ANN] NewCoin", ANNOUNCEMENT_BODY)),
        1,
    )
    .await;
    mount_ollama(
        &ollama,
        ResponseTemplate::new(200).set_body_json(ollama_answer()),
        1,
    )
    .await;

    let storage = open_storage(&config);
    let stats = crawl(&config, storage.clone(), &CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(stats.pages_scanned, 1);
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.promising, 1);

    let storage = storage.lock().unwrap();
    let record = storage.get(5001).unwrap().expect("Item should be stored");
    assert_eq!(record.item.title, "[ANN] NewCoin");
    assert_eq!(record.item.author, "coindev");
    assert_eq!(record.item.body_excerpt, ANNOUNCEMENT_BODY);
    assert_eq!(record.final_score, 84);
    assert!(record.is_promising);
    assert_eq!(record.item.classification.mining_algorithm, "RandomX");
    assert_eq!(record.item.classification.premine_estimate, 3.0);
    assert_eq!(
        record.item.links.whitepaper.as_deref(),
        Some("https://example.org/wp.pdf")
    );
    assert_eq!(record.item.links.github.as_deref(), Some("github.com/foo/bar"));

    let history = storage.history(5001).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score, 84);
    assert_eq!(history[0].notes, NOTE_ANALYZED);

    let report = build_report(&*storage).unwrap();
    let report_path = Path::new(&config.output.report_path);
    write_report(&report, report_path).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(written["total_items"], 1);
    assert_eq!(written["promising_count"], 1);
    assert_eq!(written["average_score"], 84.0);
    assert_eq!(written["top_items"][0]["id"], 5001);
    assert_eq!(written["top_items"][0]["final_score"], 84);
    assert_eq!(written["top_items"][0]["is_promising"], true);
}

#[tokio::test]
async fn test_second_run_skips_known_topics() {
    let forum = MockServer::start().await;
    let ollama = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &forum, &ollama);

    mount_listing(&forum, &[7001]).await;
    // the topic page and the model are each hit once across both runs
    mount_topic(
        &forum,
        7001,
        ResponseTemplate::new(200).set_body_string(topic_html("[ANN] Coin", ANNOUNCEMENT_BODY)),
        1,
    )
    .await;
    mount_ollama(
        &ollama,
        ResponseTemplate::new(200).set_body_json(ollama_answer()),
        1,
    )
    .await;

    let first = crawl(&config, open_storage(&config), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.processed, 1);

    // fresh handle on the same file, as a new process would have
    let storage = open_storage(&config);
    let second = crawl(&config, storage.clone(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped, 1);

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_items().unwrap(), 1);
    assert_eq!(storage.history(7001).unwrap().len(), 1);
}

#[tokio::test]
async fn test_unavailable_topic_does_not_stop_the_scan() {
    let forum = MockServer::start().await;
    let ollama = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &forum, &ollama);

    mount_listing(&forum, &[101, 102]).await;
    mount_topic(&forum, 101, ResponseTemplate::new(500), 1).await;
    mount_topic(
        &forum,
        102,
        ResponseTemplate::new(200).set_body_string(topic_html("[ANN] Other", ANNOUNCEMENT_BODY)),
        1,
    )
    .await;
    mount_ollama(
        &ollama,
        ResponseTemplate::new(200).set_body_json(ollama_answer()),
        1,
    )
    .await;

    let storage = open_storage(&config);
    let stats = crawl(&config, storage.clone(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.topics_seen, 2);
    assert_eq!(stats.unavailable, 1);
    assert_eq!(stats.processed, 1);

    let storage = storage.lock().unwrap();
    assert!(!storage.exists(101).unwrap());
    assert!(storage.exists(102).unwrap());
}

#[tokio::test]
async fn test_classifier_failure_stores_default_classification() {
    let forum = MockServer::start().await;
    let ollama = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &forum, &ollama);

    mount_listing(&forum, &[42]).await;
    mount_topic(
        &forum,
        42,
        ResponseTemplate::new(200).set_body_string(topic_html("[ANN] Coin", ANNOUNCEMENT_BODY)),
        1,
    )
    .await;
    mount_ollama(
        &ollama,
        ResponseTemplate::new(500).set_body_string("model not loaded"),
        1,
    )
    .await;

    let storage = open_storage(&config);
    let stats = crawl(&config, storage.clone(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.promising, 0);

    let storage = storage.lock().unwrap();
    let record = storage.get(42).unwrap().unwrap();
    assert_eq!(record.item.classification.innovation_score, 0);
    // not a fork plus both link bonuses
    assert_eq!(record.final_score, 20);
    assert_eq!(storage.history(42).unwrap()[0].notes, NOTE_UNAVAILABLE);
}

#[tokio::test]
async fn test_answer_without_json_is_unparseable() {
    let forum = MockServer::start().await;
    let ollama = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &forum, &ollama);

    mount_listing(&forum, &[43]).await;
    mount_topic(
        &forum,
        43,
        ResponseTemplate::new(200).set_body_string(topic_html("[ANN] Vague", "No links here")),
        1,
    )
    .await;
    mount_ollama(
        &ollama,
        ResponseTemplate::new(200)
            .set_body_json(json!({"response": "I cannot assess this project.", "done": true})),
        1,
    )
    .await;

    let storage = open_storage(&config);
    crawl(&config, storage.clone(), &CancellationToken::new())
        .await
        .unwrap();

    let storage = storage.lock().unwrap();
    let record = storage.get(43).unwrap().unwrap();
    assert_eq!(record.final_score, 10);
    assert_eq!(storage.history(43).unwrap()[0].notes, NOTE_UNAVAILABLE);
}
