//! Integration tests for the client surface
//!
//! These tests use httpmock to simulate upstream HTTP endpoints.

use httpmock::prelude::*;
use httpmock::Method::{HEAD, PATCH};
use serde_json::json;

use hostpool::{Client, ClientConfig, ClientError, Content, Graph, Remote, Resource, TokenCache};

#[tokio::test]
async fn test_client_joins_relative_paths() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/items");
        then.status(200).body("ok");
    });

    let client = Client::new(&server.url("/api")).unwrap();
    let response = client.get("items").await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
    mock.assert();
}

#[tokio::test]
async fn test_client_trailing_policy() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/items/");
        then.status(200);
    });

    let config = ClientConfig::new().with_trailing("/");
    let client = Client::with_config(&server.url("/api"), &config).unwrap();
    client.get("items").await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_client_path_derivation_shares_transport() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/users/42");
        then.status(200);
    });

    let api = Client::new(&server.url("/api")).unwrap();
    let users = api.path("users").unwrap();
    users.get("42").await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_client_sends_bearer_and_default_headers() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/secure")
            .header("authorization", "Bearer test-token")
            .header("x-api-version", "2");
        then.status(200);
    });

    let config = ClientConfig::new()
        .with_bearer("test-token")
        .with_header("x-api-version", "2")
        .unwrap();
    let client = Client::with_config(&server.base_url(), &config).unwrap();
    client.get("secure").await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_client_returns_error_statuses_as_responses() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404).body("nope");
    });

    let client = Client::new(&server.base_url()).unwrap();
    let response = client.get("missing").await.unwrap();

    // plain clients never raise on status
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_client_post_json() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/items")
            .header("content-type", "application/json")
            .json_body(json!({"name": "widget"}));
        then.status(201);
    });

    let client = Client::new(&server.base_url()).unwrap();
    let response = client.post("items", &json!({"name": "widget"})).await.unwrap();

    assert_eq!(response.status(), 201);
    mock.assert();
}

#[tokio::test]
async fn test_resource_json_content() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/users/42");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": 42, "name": "ada"}));
    });

    let resource = Resource::new(&server.base_url()).unwrap();
    let content = resource.get("users/42").await.unwrap();

    assert_eq!(
        content.as_json().unwrap(),
        &json!({"id": 42, "name": "ada"})
    );
}

#[tokio::test]
async fn test_resource_text_content() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/motd");
        then.status(200)
            .header("content-type", "text/plain; charset=utf-8")
            .body("hello");
    });

    let resource = Resource::new(&server.base_url()).unwrap();
    let content = resource.get("motd").await.unwrap();

    assert_eq!(content, Content::Text("hello".into()));
}

#[tokio::test]
async fn test_resource_raises_on_error_status() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404).body("not here");
    });

    let resource = Resource::new(&server.base_url()).unwrap();
    let err = resource.get("missing").await.unwrap_err();

    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "not here");
        }
        other => panic!("Expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resource_call_with_params() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("q", "rust")
            .query_param("page", "2");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"results": []}));
    });

    let resource = Resource::new(&server.base_url()).unwrap();
    let content = resource
        .call("search", &[("q", "rust"), ("page", "2")])
        .await
        .unwrap();

    assert_eq!(content.as_json().unwrap(), &json!({"results": []}));
    mock.assert();
}

#[tokio::test]
async fn test_resource_create_returns_location() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST).path("/items").json_body(json!({"name": "widget"}));
        then.status(201).header("location", "/items/7");
    });

    let resource = Resource::new(&server.base_url()).unwrap();
    let location = resource.create("items", &json!({"name": "widget"})).await.unwrap();

    assert_eq!(location.as_deref(), Some("/items/7"));
    mock.assert();
}

#[tokio::test]
async fn test_resource_update() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(PATCH).path("/users/42").json_body(json!({"name": "grace"}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": 42, "name": "grace"}));
    });

    let resource = Resource::new(&server.base_url()).unwrap();
    let content = resource.update("users/42", &json!({"name": "grace"})).await.unwrap();

    assert_eq!(content.as_json().unwrap()["name"], "grace");
    mock.assert();
}

#[tokio::test]
async fn test_resource_exists() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(HEAD).path("/present");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(HEAD).path("/absent");
        then.status(404);
    });

    let resource = Resource::new(&server.base_url()).unwrap();
    assert!(resource.exists("present").await.unwrap());
    assert!(!resource.exists("absent").await.unwrap());
}

#[tokio::test]
async fn test_resource_iter_lines() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/log");
        then.status(200)
            .header("content-type", "text/plain")
            .body("first\nsecond\nthird\n");
    });

    let resource = Resource::new(&server.base_url()).unwrap();
    let mut lines = resource.iter_lines("log").await.unwrap();

    assert_eq!(lines.next_line().await.unwrap(), Some("first".into()));
    assert_eq!(lines.next_line().await.unwrap(), Some("second".into()));
    assert_eq!(lines.next_line().await.unwrap(), Some("third".into()));
    assert_eq!(lines.next_line().await.unwrap(), None);
}

#[tokio::test]
async fn test_resource_iter_json() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/events");
        then.status(200)
            .header("content-type", "application/json")
            .body("{\"n\":1}\n{\"n\":2}\n");
    });

    let resource = Resource::new(&server.base_url()).unwrap();
    let mut values = resource.iter_json("events").await.unwrap();

    assert_eq!(values.next_value().await.unwrap(), Some(json!({"n": 1})));
    assert_eq!(values.next_value().await.unwrap(), Some(json!({"n": 2})));
    assert_eq!(values.next_value().await.unwrap(), None);
}

#[tokio::test]
async fn test_resource_download() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/archive");
        then.status(200).body("binary payload");
    });

    let resource = Resource::new(&server.base_url()).unwrap();
    let mut sink = std::io::Cursor::new(Vec::new());
    let written = resource.download("archive", &mut sink).await.unwrap();

    assert_eq!(written, 14);
    assert_eq!(sink.into_inner(), b"binary payload");
}

#[tokio::test]
async fn test_remote_merges_default_body() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/rpc")
            .json_body(json!({"jsonrpc": "2.0", "method": "ping", "id": 7}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"jsonrpc": "2.0", "result": "pong", "id": 7}));
    });

    let mut defaults = serde_json::Map::new();
    defaults.insert("jsonrpc".into(), json!("2.0"));
    defaults.insert("id".into(), json!(1));

    let remote = Remote::new(&server.url("/rpc"))
        .unwrap()
        .with_defaults(defaults);

    let mut body = serde_json::Map::new();
    body.insert("method".into(), json!("ping"));
    body.insert("id".into(), json!(7));

    let result = remote.call("", body).await.unwrap();
    assert_eq!(result["result"], "pong");
    mock.assert();
}

#[tokio::test]
async fn test_graph_returns_data() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"data": {"viewer": {"login": "ada"}}}));
    });

    let graph = Graph::new(&server.url("/graphql")).unwrap();
    let data = graph
        .execute("query { viewer { login } }", json!({}))
        .await
        .unwrap();

    assert_eq!(data["viewer"]["login"], "ada");
}

#[tokio::test]
async fn test_graph_surfaces_errors() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"errors": [{"message": "bad field"}]}));
    });

    let graph = Graph::new(&server.url("/graphql")).unwrap();
    let err = graph.execute("query { nope }", json!({})).await.unwrap_err();

    match err {
        ClientError::Remote(message) => assert!(message.contains("bad field")),
        other => panic!("Expected Remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_token_cache_fetches_once() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST).path("/oauth/token");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"access_token": "abc123", "expires_in": 3600}));
    });

    let endpoint = Client::new(&server.url("/oauth/token")).unwrap();
    let tokens = TokenCache::new(endpoint, json!({"grant_type": "client_credentials"}));

    assert_eq!(tokens.token().await.unwrap(), "abc123");
    assert_eq!(tokens.token().await.unwrap(), "abc123");
    mock.assert_hits(1);

    assert_eq!(tokens.header().await.unwrap(), "Bearer abc123");

    tokens.invalidate().await;
    tokens.token().await.unwrap();
    mock.assert_hits(2);
}

#[test]
fn test_blocking_client() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/status");
        then.status(200).body("alive");
    });

    let client = Client::new(&server.base_url()).unwrap();
    let response = client.blocking().get("status").unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text_blocking().unwrap(), "alive");
    mock.assert();
}
