//! Integration tests for show ingestion
//!
//! These tests use wiremock to stand in for the catalog site and run the
//! full roster, character and gallery cycle end-to-end.

use roster_harvest::config::{
    CharacterErrorPolicy, Config, FetchConfig, IngestConfig, OutputConfig, PolitenessConfig,
    SiteConfig, UserAgentConfig,
};
use roster_harvest::crawler::{harvest, Harvester, PageFetcher, RequestClass};
use roster_harvest::storage::{
    CatalogStore, CharacterRecord, RunRecord, RunStatus, ShowRecord, SqliteStorage, StorageError,
    StorageResult,
};
use roster_harvest::url::{CatalogSite, ShowKind};
use roster_harvest::{ErrorKind, HarvestError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, db_path: &str, policy: CharacterErrorPolicy) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
        },
        politeness: PolitenessConfig { unit_ms: 0 },
        fetch: FetchConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        ingest: IngestConfig {
            on_character_error: policy,
        },
    }
}

/// Creates a harvester over an in-memory store
fn create_harvester(server: &MockServer, policy: CharacterErrorPolicy) -> Harvester<SqliteStorage> {
    let config = create_test_config(&server.uri(), ":memory:", policy);
    let site = CatalogSite::new(&config.site.base_url).expect("Failed to parse base URL");
    let fetcher = PageFetcher::from_config(&config).expect("Failed to build fetcher");
    let store = SqliteStorage::new_in_memory().expect("Failed to create storage");

    Harvester::new(site, fetcher, store).with_error_policy(policy)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

/// Anime roster page: title elements plus one table per character
fn anime_roster(base_url: &str, jp_title: &str, en_title: &str, char_ids: &[u32]) -> ResponseTemplate {
    let tables: String = char_ids
        .iter()
        .map(|id| {
            format!(
                r#"<table class="js-anime-character-table"><tr>
                <td><a href="{base}/character/{id}/Name_{id}">Name {id}</a></td>
                <td><a href="{base}/people/9{id}/Voice">Voice</a></td>
                </tr></table>"#,
                base = base_url,
                id = id
            )
        })
        .collect();

    html(format!(
        r#"<h1 class="title-name"><strong>{}</strong></h1><p class="title-english">{}</p>{}"#,
        jp_title, en_title, tables
    ))
}

fn character_page(id: u32, name: &str) -> ResponseTemplate {
    html(format!(
        r#"<h2 class="normal_header">{name} (ネーム{id})</h2>
        <a href="/character/{id}/Name_{id}/pics">Pictures</a>"#,
        name = name,
        id = id
    ))
}

fn gallery_page(id: u32) -> ResponseTemplate {
    html(format!(
        r#"<a class="js-picture-gallery" href="https://cdn.example.net/images/characters/{id}/a.jpg">a</a>
        <a class="js-picture-gallery" href="https://cdn.example.net/images/characters/{id}/b.jpg">b</a>
        <a class="js-picture-gallery" href="https://cdn.example.net/images/characters/{id}/a.jpg">a again</a>
        <a class="js-picture-gallery" href="https://cdn.example.net/images/voice_actors/{id}.jpg">va</a>"#,
        id = id
    ))
}

async fn mount_roster(server: &MockServer, mal_id: u32, char_ids: &[u32]) {
    Mock::given(method("GET"))
        .and(path(format!("/anime/{}/Show_{}/characters", mal_id, mal_id)))
        .respond_with(anime_roster(
            &server.uri(),
            &format!("ショー{}", mal_id),
            &format!("Show {}", mal_id),
            char_ids,
        ))
        .mount(server)
        .await;
}

/// Mounts detail and gallery pages for a character, expecting `fetches` visits each
async fn mount_character(server: &MockServer, id: u32, fetches: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/character/{}", id)))
        .respond_with(character_page(id, &format!("Name {}", id)))
        .expect(fetches)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/character/{}/Name_{}/pics", id, id)))
        .respond_with(gallery_page(id))
        .expect(fetches)
        .mount(server)
        .await;
}

fn show_url(server: &MockServer, mal_id: u32) -> String {
    format!("{}/anime/{}/Show_{}", server.uri(), mal_id, mal_id)
}

#[tokio::test]
async fn test_ingest_new_show() {
    let server = MockServer::start().await;
    mount_roster(&server, 100, &[1, 2]).await;
    mount_character(&server, 1, 1).await;
    mount_character(&server, 2, 1).await;

    let mut harvester = create_harvester(&server, CharacterErrorPolicy::Abort);
    let report = harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect("Ingest failed");

    assert!(report.show_inserted);
    assert_eq!(report.kind, ShowKind::Anime);
    assert_eq!(report.mal_id, 100);
    assert_eq!(report.characters_found, 2);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.linked, 0);
    assert!(report.failed.is_empty());

    let store = harvester.store();
    let show = store.get_show(report.show_id).unwrap();
    assert_eq!(show.mal_id, 100);
    assert_eq!(show.jp_title, "ショー100");
    assert_eq!(show.en_title.as_deref(), Some("Show 100"));

    let character = store.get_character("1").unwrap().expect("Character 1 missing");
    assert_eq!(character.en_name, "Name 1");
    assert_eq!(character.jp_name.as_deref(), Some("ネーム1"));
    assert_eq!(
        character.image_urls,
        vec![
            "https://cdn.example.net/images/characters/1/a.jpg",
            "https://cdn.example.net/images/characters/1/b.jpg",
        ]
    );

    assert_eq!(store.characters_for_show(report.show_id).unwrap(), vec!["1", "2"]);
    assert_eq!(store.count_images().unwrap(), 4);

    let run = store.get_latest_run().unwrap().expect("Run not recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.inserted, 2);

    let pacer = harvester.fetcher().pacer();
    assert_eq!(pacer.request_count(RequestClass::Roster), 1);
    assert_eq!(pacer.request_count(RequestClass::CharacterDetail), 2);
    assert_eq!(pacer.request_count(RequestClass::Gallery), 2);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let server = MockServer::start().await;
    mount_roster(&server, 100, &[1, 2]).await;
    mount_character(&server, 1, 1).await;
    mount_character(&server, 2, 1).await;

    let mut harvester = create_harvester(&server, CharacterErrorPolicy::Abort);
    harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect("First ingest failed");

    let report = harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect("Second ingest failed");

    assert!(!report.show_inserted);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.inserted, 0);
    assert!(report.is_noop());

    let store = harvester.store();
    assert_eq!(store.count_shows().unwrap(), 1);
    assert_eq!(store.count_characters().unwrap(), 2);
    assert_eq!(store.count_links().unwrap(), 2);
    assert_eq!(store.count_runs().unwrap(), 2);
}

#[tokio::test]
async fn test_shared_character_linked_without_refetch() {
    let server = MockServer::start().await;
    mount_roster(&server, 100, &[1, 2]).await;
    mount_roster(&server, 200, &[2, 3]).await;
    mount_character(&server, 1, 1).await;
    mount_character(&server, 2, 1).await;
    mount_character(&server, 3, 1).await;

    let mut harvester = create_harvester(&server, CharacterErrorPolicy::Abort);
    harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect("First show failed");

    let report = harvester
        .ingest_show(&show_url(&server, 200), false)
        .await
        .expect("Second show failed");

    assert!(report.show_inserted);
    assert_eq!(report.linked, 1);
    assert_eq!(report.inserted, 1);

    let store = harvester.store();
    assert_eq!(store.count_shows().unwrap(), 2);
    assert_eq!(store.count_characters().unwrap(), 3);
    assert_eq!(store.count_links().unwrap(), 4);
    assert_eq!(store.characters_for_show(report.show_id).unwrap(), vec!["2", "3"]);
}

#[tokio::test]
async fn test_abort_then_resume() {
    let server = MockServer::start().await;
    mount_roster(&server, 100, &[1, 2, 3]).await;
    mount_character(&server, 1, 1).await;
    mount_character(&server, 2, 1).await;
    Mock::given(method("GET"))
        .and(path("/character/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut harvester = create_harvester(&server, CharacterErrorPolicy::Abort);
    let err = harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect_err("Ingest should abort on character 3");
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(matches!(err, HarvestError::HttpStatus { status: 500, .. }));

    {
        let store = harvester.store();
        assert_eq!(store.count_shows().unwrap(), 1);
        assert_eq!(store.count_characters().unwrap(), 2);
        assert!(!store.character_exists("3").unwrap());

        let run = store.get_latest_run().unwrap().expect("Aborted run not recorded");
        assert_eq!(run.status, RunStatus::Aborted);
        assert_eq!(run.inserted, 2);
        assert!(run.error_message.is_some());
    }

    server.reset().await;
    mount_roster(&server, 100, &[1, 2, 3]).await;
    mount_character(&server, 1, 0).await;
    mount_character(&server, 2, 0).await;
    mount_character(&server, 3, 1).await;

    let report = harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect("Resumed ingest failed");

    assert!(!report.show_inserted);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.inserted, 1);
    assert_eq!(harvester.store().count_characters().unwrap(), 3);
    assert_eq!(harvester.store().count_links().unwrap(), 3);
}

#[tokio::test]
async fn test_skip_policy_continues_past_failure() {
    let server = MockServer::start().await;
    mount_roster(&server, 100, &[1, 2, 3]).await;
    mount_character(&server, 1, 1).await;
    mount_character(&server, 3, 1).await;
    Mock::given(method("GET"))
        .and(path("/character/2"))
        .respond_with(html("<h1>Not a character page</h1>".to_string()))
        .mount(&server)
        .await;

    let mut harvester = create_harvester(&server, CharacterErrorPolicy::Skip);
    let report = harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect("Skip policy should not abort");

    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].href.contains("/character/2/"));
    assert_eq!(report.processed(), 3);

    let store = harvester.store();
    assert!(!store.character_exists("2").unwrap());
    assert_eq!(store.get_latest_run().unwrap().unwrap().failed, 1);
}

#[tokio::test]
async fn test_overwrite_refetches_and_keeps_links() {
    let server = MockServer::start().await;
    mount_roster(&server, 100, &[1]).await;
    mount_character(&server, 1, 1).await;

    let mut harvester = create_harvester(&server, CharacterErrorPolicy::Abort);
    harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect("First ingest failed");

    server.reset().await;
    mount_roster(&server, 100, &[1]).await;
    Mock::given(method("GET"))
        .and(path("/character/1"))
        .respond_with(character_page(1, "Renamed"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/character/1/Name_1/pics"))
        .respond_with(html(String::new()))
        .expect(1)
        .mount(&server)
        .await;

    let report = harvester
        .ingest_show(&show_url(&server, 100), true)
        .await
        .expect("Overwrite ingest failed");
    assert_eq!(report.inserted, 1);

    let store = harvester.store();
    let character = store.get_character("1").unwrap().unwrap();
    assert_eq!(character.en_name, "Renamed");
    assert!(character.image_urls.is_empty());
    assert_eq!(store.count_characters().unwrap(), 1);
    assert_eq!(store.count_links().unwrap(), 1);
}

#[tokio::test]
async fn test_missing_title_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/anime/100/Show_100/characters"))
        .respond_with(html(
            r#"<table class="js-anime-character-table"><tr><td><a href="/character/1/A">A</a></td></tr></table>"#
                .to_string(),
        ))
        .mount(&server)
        .await;
    mount_character(&server, 1, 0).await;

    let mut harvester = create_harvester(&server, CharacterErrorPolicy::Skip);
    let err = harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect_err("Missing title should abort");
    assert_eq!(err.kind(), ErrorKind::MissingRequiredField);

    let store = harvester.store();
    assert_eq!(store.count_shows().unwrap(), 0);
    assert_eq!(store.count_characters().unwrap(), 0);
    assert_eq!(store.count_runs().unwrap(), 0);
}

#[tokio::test]
async fn test_manga_nested_english_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manga/2/Berserk/characters"))
        .respond_with(html(format!(
            r#"<span itemprop="name">ベルセルク<br><span class="title-english">Berserk</span></span>
            <table class="js-manga-character-table"><tr><td><a href="{}/character/1/Name_1">Guts</a></td></tr></table>"#,
            server.uri()
        )))
        .mount(&server)
        .await;
    mount_character(&server, 1, 1).await;

    let mut harvester = create_harvester(&server, CharacterErrorPolicy::Abort);
    let report = harvester
        .ingest_show(&format!("{}/manga/2/Berserk", server.uri()), false)
        .await
        .expect("Manga ingest failed");

    assert_eq!(report.kind, ShowKind::Manga);
    let show = harvester.store().get_show(report.show_id).unwrap();
    assert_eq!(show.kind, ShowKind::Manga);
    assert_eq!(show.jp_title, "ベルセルク");
    assert_eq!(show.en_title.as_deref(), Some("Berserk"));

    // The same external id as an anime is a different show
    assert!(!harvester.store().show_exists(2, ShowKind::Anime).unwrap());
}

#[tokio::test]
async fn test_unrecognized_url_makes_no_requests() {
    let server = MockServer::start().await;

    let mut harvester = create_harvester(&server, CharacterErrorPolicy::Abort);
    let err = harvester
        .ingest_show(&format!("{}/novel/1/Book", server.uri()), false)
        .await
        .expect_err("Unknown kind should fail");
    assert_eq!(err.kind(), ErrorKind::UrlParse);

    let err = harvester
        .ingest_show("https://elsewhere.example.com/anime/1/Show", false)
        .await
        .expect_err("Foreign domain should fail");
    assert_eq!(err.kind(), ErrorKind::UrlParse);

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
    assert_eq!(harvester.fetcher().pacer().total_requests(), 0);
}

#[tokio::test]
async fn test_harvest_persists_to_database_file() {
    let server = MockServer::start().await;
    mount_roster(&server, 100, &[1]).await;
    mount_character(&server, 1, 1).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("catalog.db");
    let config = create_test_config(
        &server.uri(),
        db_path.to_str().unwrap(),
        CharacterErrorPolicy::Abort,
    );

    let report = harvest(&config, "abc123", &show_url(&server, 100), false)
        .await
        .expect("Harvest failed");
    assert_eq!(report.inserted, 1);

    let storage = SqliteStorage::new(&db_path).expect("Failed to reopen database");
    assert_eq!(storage.count_shows().unwrap(), 1);
    assert_eq!(storage.count_characters().unwrap(), 1);

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.config_hash, "abc123");
    assert_eq!(run.show_url, show_url(&server, 100));
}

#[tokio::test]
async fn test_transient_failure_is_retried_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/anime/100/Show_100/characters"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_roster(&server, 100, &[1]).await;
    mount_character(&server, 1, 1).await;

    let mut config = create_test_config(&server.uri(), ":memory:", CharacterErrorPolicy::Abort);
    config.fetch.max_retries = 1;
    config.fetch.retry_delay_ms = 0;

    let site = CatalogSite::new(&config.site.base_url).unwrap();
    let fetcher = PageFetcher::from_config(&config).unwrap();
    let store = SqliteStorage::new_in_memory().unwrap();
    let mut harvester = Harvester::new(site, fetcher, store);

    let report = harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect("Retry should recover from one 503");
    assert_eq!(report.inserted, 1);

    // One pacing wait per logical fetch, regardless of attempts
    assert_eq!(harvester.fetcher().pacer().total_requests(), 3);
}

#[tokio::test]
async fn test_character_without_gallery_link_skips_gallery() {
    let server = MockServer::start().await;
    mount_roster(&server, 100, &[1]).await;
    Mock::given(method("GET"))
        .and(path("/character/1"))
        .respond_with(html(
            r#"<h2 class="normal_header">Loner (ローナー)</h2><a href="/character/1/Loner/clubs">Clubs</a>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/character/1/Loner/pics"))
        .respond_with(gallery_page(1))
        .expect(0)
        .mount(&server)
        .await;

    let mut harvester = create_harvester(&server, CharacterErrorPolicy::Abort);
    let report = harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect("Ingest failed");
    assert_eq!(report.inserted, 1);

    let character = harvester.store().get_character("1").unwrap().unwrap();
    assert_eq!(character.en_name, "Loner");
    assert!(character.image_urls.is_empty());

    let pacer = harvester.fetcher().pacer();
    assert_eq!(pacer.request_count(RequestClass::CharacterDetail), 1);
    assert_eq!(pacer.request_count(RequestClass::Gallery), 0);

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| !r.url.path().ends_with("/pics")));
}

/// SQLite store whose run log cannot be written
struct RunLogUnavailable(SqliteStorage);

impl CatalogStore for RunLogUnavailable {
    fn show_exists(&self, mal_id: i64, kind: ShowKind) -> StorageResult<bool> {
        self.0.show_exists(mal_id, kind)
    }

    fn insert_show(
        &mut self,
        mal_id: i64,
        jp_title: &str,
        en_title: Option<&str>,
        kind: ShowKind,
    ) -> StorageResult<()> {
        self.0.insert_show(mal_id, jp_title, en_title, kind)
    }

    fn get_show_id(&self, mal_id: i64, kind: ShowKind) -> StorageResult<i64> {
        self.0.get_show_id(mal_id, kind)
    }

    fn get_show(&self, show_id: i64) -> StorageResult<ShowRecord> {
        self.0.get_show(show_id)
    }

    fn character_exists(&self, char_id: &str) -> StorageResult<bool> {
        self.0.character_exists(char_id)
    }

    fn insert_character(&mut self, character: &CharacterRecord) -> StorageResult<()> {
        self.0.insert_character(character)
    }

    fn get_character(&self, char_id: &str) -> StorageResult<Option<CharacterRecord>> {
        self.0.get_character(char_id)
    }

    fn character_has_show(&self, char_id: &str, show_id: i64) -> StorageResult<bool> {
        self.0.character_has_show(char_id, show_id)
    }

    fn add_show_to_character(&mut self, char_id: &str, show_id: i64) -> StorageResult<()> {
        self.0.add_show_to_character(char_id, show_id)
    }

    fn characters_for_show(&self, show_id: i64) -> StorageResult<Vec<String>> {
        self.0.characters_for_show(show_id)
    }

    fn record_run(&mut self, _run: &RunRecord) -> StorageResult<i64> {
        Err(StorageError::Corrupt("run log is read-only".to_string()))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        self.0.get_latest_run()
    }

    fn count_shows(&self) -> StorageResult<u64> {
        self.0.count_shows()
    }

    fn count_characters(&self) -> StorageResult<u64> {
        self.0.count_characters()
    }

    fn count_links(&self) -> StorageResult<u64> {
        self.0.count_links()
    }

    fn count_images(&self) -> StorageResult<u64> {
        self.0.count_images()
    }

    fn count_runs(&self) -> StorageResult<u64> {
        self.0.count_runs()
    }
}

#[tokio::test]
async fn test_run_log_failure_keeps_successful_ingest() {
    let server = MockServer::start().await;
    mount_roster(&server, 100, &[1]).await;
    mount_character(&server, 1, 1).await;

    let config = create_test_config(&server.uri(), ":memory:", CharacterErrorPolicy::Abort);
    let site = CatalogSite::new(&config.site.base_url).unwrap();
    let fetcher = PageFetcher::from_config(&config).unwrap();
    let store = RunLogUnavailable(SqliteStorage::new_in_memory().unwrap());
    let mut harvester = Harvester::new(site, fetcher, store);

    let report = harvester
        .ingest_show(&show_url(&server, 100), false)
        .await
        .expect("Run log failure should not fail the ingest");
    assert_eq!(report.inserted, 1);

    let store = harvester.store();
    assert_eq!(store.count_characters().unwrap(), 1);
    assert_eq!(store.count_links().unwrap(), 1);
    assert_eq!(store.count_runs().unwrap(), 0);
}
