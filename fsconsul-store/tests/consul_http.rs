//! `ConsulStore` against a mock Consul HTTP API.

use std::net::TcpListener;
use std::time::Duration;

use fsconsul_core::StoreConnection;
use fsconsul_store::{ConsulStore, KvStore, StoreError, StoreErrorKind};
use httpmock::Method::{DELETE, GET};
use httpmock::MockServer;
use serde_json::json;

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn store_for(server: &MockServer, dc: &str, token: &str) -> ConsulStore {
    let connection = StoreConnection {
        address: server.base_url(),
        datacenter: dc.into(),
        auth_token: token.into(),
    };
    ConsulStore::with_wait(connection, Duration::from_secs(1)).expect("client")
}

#[tokio::test]
async fn initial_listing_decodes_values_and_index() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/kv/simple_file")
                .query_param("recurse", "true")
                .query_param("dc", "dc1");
            then.status(200).header("X-Consul-Index", "7").json_body(json!([
                {"Key": "simple_file/randomEntry", "Value": "aGVsbG8=", "Flags": 42, "ModifyIndex": 7},
                {"Key": "simple_file/dir/", "Value": null, "Flags": 0, "ModifyIndex": 5}
            ]));
        })
        .await;

    let store = store_for(&server, "dc1", "");
    let listing = store.list_prefix("simple_file", 0).await.expect("list");

    mock.assert_async().await;
    assert_eq!(listing.index, 7);
    assert_eq!(listing.entries.len(), 2);
    assert_eq!(listing.entries[0].key, "simple_file/randomEntry");
    assert_eq!(listing.entries[0].value, b"hello");
    assert_eq!(listing.entries[0].flags, 42);
    assert!(listing.entries[1].value.is_empty());
}

#[tokio::test]
async fn blocking_query_sends_index_wait_and_token() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/kv/app")
                .query_param("index", "7")
                .query_param("wait", "1s")
                .header("X-Consul-Token", "secret");
            then.status(200)
                .header("X-Consul-Index", "9")
                .json_body(json!([{"Key": "app/a", "Value": "MQ==", "Flags": 0}]));
        })
        .await;

    let store = store_for(&server, "", "secret");
    let listing = store.list_prefix("app", 7).await.expect("list");

    mock.assert_async().await;
    assert_eq!(listing.index, 9);
    assert_eq!(listing.entries[0].value, b"1");
}

#[tokio::test]
async fn unchanged_index_is_polled_again() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start_async().await;
    let mut unchanged = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/kv/app").query_param("index", "7");
            then.status(200)
                .header("X-Consul-Index", "7")
                .json_body(json!([{"Key": "app/a", "Value": "MQ==", "Flags": 0}]));
        })
        .await;

    let store = store_for(&server, "", "");
    let pending = tokio::time::timeout(Duration::from_millis(300), store.list_prefix("app", 7)).await;
    assert!(pending.is_err(), "a listing at the same index must not be returned");
    assert!(unchanged.hits_async().await > 1);

    unchanged.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/kv/app").query_param("index", "7");
            then.status(200)
                .header("X-Consul-Index", "8")
                .json_body(json!([{"Key": "app/a", "Value": "Mg==", "Flags": 0}]));
        })
        .await;

    let listing = store.list_prefix("app", 7).await.expect("list");
    assert_eq!(listing.index, 8);
    assert_eq!(listing.entries[0].value, b"2");
}

#[tokio::test]
async fn missing_prefix_is_an_empty_listing() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/kv/gotest");
            then.status(404).header("X-Consul-Index", "3");
        })
        .await;

    let listing = store_for(&server, "", "")
        .list_prefix("gotest", 0)
        .await
        .expect("list");
    assert!(listing.entries.is_empty());
    assert_eq!(listing.index, 3);
}

#[tokio::test]
async fn forbidden_is_permanent() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/kv/app");
            then.status(403).body("Permission denied");
        })
        .await;

    let err = store_for(&server, "", "bad")
        .list_prefix("app", 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::Permanent);
    assert!(err.to_string().contains("Permission denied"));
}

#[tokio::test]
async fn server_error_is_transient() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/kv/app");
            then.status(500).body("No cluster leader");
        })
        .await;

    let err = store_for(&server, "", "")
        .list_prefix("app", 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::Transient);
}

#[tokio::test]
async fn index_going_backwards_is_stale() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/kv/app").query_param("index", "50");
            then.status(200).header("X-Consul-Index", "4").json_body(json!([]));
        })
        .await;

    let err = store_for(&server, "", "")
        .list_prefix("app", 50)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::StaleIndex {
            requested: 50,
            current: 4
        }
    );
}

#[tokio::test]
async fn unreachable_agent_is_transient() {
    // Grab a free port, then release it so nothing is listening.
    let Ok(listener) = TcpListener::bind("127.0.0.1:0") else {
        return;
    };
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let connection = StoreConnection {
        address: addr.to_string(),
        datacenter: String::new(),
        auth_token: String::new(),
    };
    let store = ConsulStore::with_wait(connection, Duration::from_secs(1)).expect("client");
    let err = store.list_prefix("app", 0).await.unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::Transient);
}

#[tokio::test]
async fn delete_tree_issues_recursive_delete() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v1/kv/gotest")
                .query_param("recurse", "true");
            then.status(200).body("true");
        })
        .await;

    store_for(&server, "", "")
        .delete_tree("gotest")
        .await
        .expect("delete");
    mock.assert_async().await;
}
