use std::fs;
use std::time::Duration;

use httpmock::prelude::*;
use mutual_core::{
    export_mutual_graph, read_csv_rows, ApiErrorKind, ClientOptions, Credentials, Cursor,
    ExportOptions, ListingClient, MutualError, RunError, TwitterClient,
};
use serde_json::{json, Value};
use tempfile::tempdir;

type TestResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn credentials() -> Credentials {
    Credentials::new("ck", "cs", "at", "as")
}

fn user(id: u64, screen_name: &str) -> Value {
    json!({
        "id": id,
        "id_str": id.to_string(),
        "screen_name": screen_name,
        "name": format!("{screen_name} display"),
        "url": null,
        "description": "hello, world",
        "friends_count": 12,
        "followers_count": 34,
        "statuses_count": 56,
        "listed_count": 7,
        "protected": false,
        "lang": null,
        "location": "Tokyo",
        "time_zone": null,
        "created_at": "Sat Dec 01 00:00:00 +0000 2012"
    })
}

fn client_for(server: &MockServer, timeout: Duration) -> TwitterClient {
    let options = ClientOptions {
        timeout,
        base_url: Some(server.base_url()),
        ..ClientOptions::default()
    };
    TwitterClient::new(credentials(), options).expect("client")
}

#[tokio::test]
async fn friends_page_request_shape() -> TestResult<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/friends/list.json")
                .query_param("screen_name", "alice")
                .query_param("cursor", "-1")
                .query_param("count", "200")
                .header_exists("authorization");
            then.status(200).json_body(json!({
                "users": [user(1, "bob")],
                "next_cursor": 1_600_000_000_i64,
                "next_cursor_str": "1600000000"
            }));
        })
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let page = client.list_friends_page("alice", Cursor::start()).await?;

    mock.assert_async().await;
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].screen_name, "bob");
    assert_eq!(page.items[0].location.as_deref(), Some("Tokyo"));
    assert_eq!(page.next_cursor, Cursor::new("1600000000"));
    Ok(())
}

#[tokio::test]
async fn ids_page_uses_large_page_size() -> TestResult<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/friends/ids.json")
                .query_param("screen_name", "bob")
                .query_param("cursor", "-1")
                .query_param("count", "5000");
            then.status(200).json_body(json!({
                "ids": [3, 1, 2],
                "next_cursor_str": "0"
            }));
        })
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let page = client.list_friend_ids_page("bob", Cursor::start()).await?;

    mock.assert_async().await;
    assert_eq!(page.items, vec![3, 1, 2]);
    assert!(page.next_cursor.is_end());
    Ok(())
}

#[tokio::test]
async fn unauthorized_is_classified_as_denial() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/1.1/friends/ids.json");
            then.status(401).json_body(json!({
                "request": "/1.1/friends/ids.json",
                "error": "Not authorized."
            }));
        })
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let err = client
        .list_friend_ids_page("locked", Cursor::start())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::AuthorizationDenied);
    assert_eq!(err.status, Some(401));
}

#[tokio::test]
async fn malformed_body_is_protocol_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/1.1/friends/ids.json");
            then.status(200).body("not json");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/1.1/friends/list.json");
            then.status(200).json_body(json!({ "users": [] }));
        })
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let err = client
        .list_friend_ids_page("bob", Cursor::start())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Protocol);

    let err = client
        .list_friends_page("bob", Cursor::start())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Protocol);
    assert!(err.message.contains("next_cursor_str"));
}

#[tokio::test]
async fn slow_response_is_transport_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/1.1/friends/ids.json");
            then.status(200)
                .delay(Duration::from_millis(1500))
                .json_body(json!({ "ids": [], "next_cursor_str": "0" }));
        })
        .await;

    let client = client_for(&server, Duration::from_millis(200));
    let err = client
        .list_friend_ids_page("bob", Cursor::start())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Transport);
}

async fn mock_alice_friends(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/friends/list.json")
                .query_param("screen_name", "alice")
                .query_param("cursor", "-1");
            then.status(200).json_body(json!({
                "users": [user(1, "bob")],
                "next_cursor_str": "42"
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/friends/list.json")
                .query_param("screen_name", "alice")
                .query_param("cursor", "42");
            then.status(200).json_body(json!({
                "users": [user(2, "carol"), user(3, "dave")],
                "next_cursor_str": "0"
            }));
        })
        .await;
}

async fn mock_ids(server: &MockServer, account: &str, ids: &[u64]) {
    let account = account.to_string();
    let ids = ids.to_vec();
    server
        .mock_async(move |when, then| {
            when.method(GET)
                .path("/1.1/friends/ids.json")
                .query_param("screen_name", account.as_str())
                .query_param("cursor", "-1");
            then.status(200).json_body(json!({
                "ids": ids,
                "next_cursor_str": "0"
            }));
        })
        .await;
}

fn export_options(server: &MockServer, dir: &std::path::Path) -> ExportOptions {
    let mut options = ExportOptions::new("alice", credentials());
    options.output_dir = dir.to_path_buf();
    options.base_url = Some(server.base_url());
    options.timeout_secs = 5;
    options
}

#[tokio::test]
async fn export_writes_both_files() -> TestResult<()> {
    let server = MockServer::start_async().await;
    mock_alice_friends(&server).await;
    mock_ids(&server, "bob", &[2]).await;
    mock_ids(&server, "carol", &[1, 2, 99]).await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/friends/ids.json")
                .query_param("screen_name", "dave");
            then.status(401)
                .json_body(json!({ "errors": [{ "code": 220, "message": "Not authorized." }] }));
        })
        .await;

    let dir = tempdir()?;
    let result = export_mutual_graph(export_options(&server, dir.path())).await?;

    assert_eq!(result.friends_csv_path, dir.path().join("alice.csv"));
    assert_eq!(
        result.following_csv_path,
        dir.path().join("alice_following_list.csv")
    );
    assert_eq!(result.graph.private_accounts, vec!["dave".to_string()]);

    let friends = read_csv_rows(&result.friends_csv_path, "utf-8")?;
    let names: Vec<_> = friends.iter().map(|row| row["ScreenName"].as_str()).collect();
    assert_eq!(names, vec!["bob", "carol", "dave"]);
    assert_eq!(friends[0]["Description"], "hello, world");
    assert_eq!(friends[0]["FollowersCount"], "34");

    let following = fs::read_to_string(&result.following_csv_path)?;
    assert_eq!(
        following,
        "Following,Follower\nbob,carol\ncarol,bob\ncarol,carol\n"
    );

    // A second run replaces the files rather than appending to them.
    let again = export_mutual_graph(export_options(&server, dir.path())).await?;
    assert_eq!(fs::read_to_string(&again.following_csv_path)?, following);
    Ok(())
}

#[tokio::test]
async fn server_error_aborts_after_friend_export() -> TestResult<()> {
    let server = MockServer::start_async().await;
    mock_alice_friends(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/friends/ids.json")
                .query_param("screen_name", "bob");
            then.status(500).body("internal error");
        })
        .await;
    let carol = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/friends/ids.json")
                .query_param("screen_name", "carol");
            then.status(200)
                .json_body(json!({ "ids": [], "next_cursor_str": "0" }));
        })
        .await;

    let dir = tempdir()?;
    let err = export_mutual_graph(export_options(&server, dir.path()))
        .await
        .unwrap_err();

    match err {
        RunError::Core(MutualError::Api(api)) => {
            assert_eq!(api.kind, ApiErrorKind::Other);
            assert_eq!(api.status, Some(500));
        }
        other => panic!("unexpected error: {other}"),
    }
    carol.assert_hits_async(0).await;
    assert!(dir.path().join("alice.csv").exists());
    assert!(!dir.path().join("alice_following_list.csv").exists());
    Ok(())
}

#[tokio::test]
async fn failed_rerun_does_not_leave_previous_pair_file() -> TestResult<()> {
    let server = MockServer::start_async().await;
    mock_alice_friends(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/friends/ids.json")
                .query_param("screen_name", "bob");
            then.status(500).body("internal error");
        })
        .await;

    let dir = tempdir()?;
    let stale_friends = dir.path().join("alice.csv");
    let stale_pairs = dir.path().join("alice_following_list.csv");
    fs::write(&stale_friends, "Id,ScreenName\n9,zed\n")?;
    fs::write(&stale_pairs, "Following,Follower\nzed,zed\n")?;

    export_mutual_graph(export_options(&server, dir.path()))
        .await
        .unwrap_err();

    let friends = read_csv_rows(&stale_friends, "utf-8")?;
    let names: Vec<_> = friends.iter().map(|row| row["ScreenName"].as_str()).collect();
    assert_eq!(names, vec!["bob", "carol", "dave"]);
    assert!(!stale_pairs.exists());
    Ok(())
}

#[tokio::test]
async fn denial_on_target_account_is_fatal() -> TestResult<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/1.1/friends/list.json");
            then.status(401).json_body(json!({ "error": "Not authorized." }));
        })
        .await;

    let dir = tempdir()?;
    let previous_pairs = dir.path().join("alice_following_list.csv");
    fs::write(&previous_pairs, "Following,Follower\nbob,carol\n")?;

    let err = export_mutual_graph(export_options(&server, dir.path()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("fetching followees of alice"));
    assert!(!dir.path().join("alice.csv").exists());
    // Nothing was replaced, so the earlier output is left alone.
    assert!(previous_pairs.exists());
    Ok(())
}
