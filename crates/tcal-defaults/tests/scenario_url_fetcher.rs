//! `UrlFetcher` against a local mock HTTP server and the filesystem.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use tcal_core::ScheduleError;
use tcal_defaults::{DefaultsFetcher, DefaultsManager, ManagerOptions, UrlFetcher};
use tcal_definition::BUILTIN_DEFAULTS;

const PAYLOAD: &[u8] = br#"{"holidays": {"US": [20240704]}}"#;

fn fetcher() -> UrlFetcher {
    UrlFetcher::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn http_fetch_returns_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/defaults.json");
            then.status(200).body(PAYLOAD);
        })
        .await;

    let bytes = fetcher().fetch(&server.url("/defaults.json")).await.unwrap();
    assert_eq!(bytes, PAYLOAD);
    mock.assert_async().await;
}

#[tokio::test]
async fn http_error_status_is_fetch_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/defaults.json");
            then.status(503);
        })
        .await;

    let err = fetcher()
        .fetch(&server.url("/defaults.json"))
        .await
        .unwrap_err();
    match err {
        ScheduleError::FetchFailure { message, .. } => assert!(message.contains("503")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn file_url_reads_local_payload() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(BUILTIN_DEFAULTS).unwrap();
    let url = reqwest::Url::from_file_path(file.path()).unwrap().to_string();

    assert_eq!(fetcher().fetch(&url).await.unwrap(), BUILTIN_DEFAULTS);

    let missing = reqwest::Url::from_file_path(file.path().with_extension("missing"))
        .unwrap()
        .to_string();
    assert!(matches!(
        fetcher().fetch(&missing).await,
        Err(ScheduleError::FetchFailure { .. })
    ));
}

#[tokio::test]
async fn refresh_now_installs_served_payload() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/defaults.json");
            then.status(200).body(PAYLOAD);
        })
        .await;

    let m = DefaultsManager::new(
        Arc::new(fetcher()),
        tokio::runtime::Handle::current(),
        ManagerOptions::default(),
    )
    .unwrap();

    let generation = m.refresh_now(&server.url("/defaults.json")).await.unwrap();
    assert_eq!(generation, 1);
    assert!(m.snapshot().data.holidays["US"].contains(&2024_07_04));
    assert!(m.snapshot().data.schedules.is_empty());
}
