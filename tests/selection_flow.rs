//! End-to-end selection behaviour against an in-memory service

mod common;

use common::FakeServer;
use serde_json::json;
use tablink::error::Error;
use tablink::{Datum, Field, Filter, FilterList};

const DB: &str = "proj_big";
const MODULE: &str = "shot_task";

fn seed(server: &FakeServer) {
    server.insert(DB, MODULE, "1", &[("artist", "monkey"), ("pipeline", "comp"), ("account_id", "bob")]);
    server.insert(DB, MODULE, "2", &[("artist", "dog"), ("pipeline", "comp"), ("account_id", "")]);
    server.insert(DB, MODULE, "3", &[("artist", "monkey"), ("pipeline", "light"), ("account_id", "")]);
}

#[tokio::test]
async fn test_filter_then_get_fields() {
    let server = FakeServer::new();
    seed(&server);
    let (transport, client) = server.client();
    let module = client.database(DB).module(MODULE);

    let selection = module
        .filter(Field::new("pipeline").eq("comp"))
        .await
        .expect("filter");
    assert_eq!(selection.ids(), ["1", "2"]);

    // server answers in reverse order; rows must follow the selection
    let result = selection.get_fields(&["id", "artist"]).await.expect("get_fields");
    assert_eq!(result.len(), selection.len());
    assert_eq!(
        result.column("id").unwrap(),
        vec![Datum::from("1"), Datum::from("2")]
    );
    assert_eq!(
        result.column("artist").unwrap(),
        vec![Datum::from("monkey"), Datum::from("dog")]
    );
    assert_eq!(result.distinct("artist").unwrap(), vec!["dog", "monkey"]);

    for request in transport.requests() {
        assert_eq!(request.get("token"), Some(&json!("test-token")));
        assert_eq!(request.get("db"), Some(&json!(DB)));
    }
}

#[tokio::test]
async fn test_empty_match_is_empty_selection() {
    let server = FakeServer::new();
    seed(&server);
    let (_, client) = server.client();
    let module = client.database(DB).module(MODULE);

    let selection = module.filter(Filter::new("artist", "cat")).await.unwrap();
    assert!(selection.is_empty());

    let err = selection.to_entry("carol").await.unwrap_err();
    assert!(matches!(err, Error::EmptyMatch { .. }));
}

#[tokio::test]
async fn test_set_then_read_back() {
    let server = FakeServer::new();
    seed(&server);
    let (_, client) = server.client();
    let module = client.database(DB).module(MODULE);

    let selection = module.filter(Field::new("artist").eq("monkey")).await.unwrap();
    selection.set_field("artist", "cat").await.unwrap();

    let artists = selection.get_field("artist").await.unwrap();
    assert_eq!(artists.len(), 2);
    assert!(artists.iter().all(|a| a.as_str() == Some("cat")));

    let remaining = module.filter(Field::new("artist").eq("monkey")).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_delete_removes_records() {
    let server = FakeServer::new();
    seed(&server);
    let (_, client) = server.client();
    let module = client.database(DB).module(MODULE);

    let selection = module.filter(Field::new("pipeline").eq("light")).await.unwrap();
    selection.delete().await.unwrap();

    assert_eq!(server.count(DB, MODULE), 2);
    assert!(module
        .filter(Field::new("pipeline").eq("light"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_compound_filter_and_wire_form() {
    let server = FakeServer::new();
    seed(&server);
    let (transport, client) = server.client();
    let module = client.database(DB).module(MODULE);

    let filters = Field::new("artist")
        .eq("monkey")
        .and(Field::new("pipeline").eq("light"));
    let selection = module.filter(&filters).await.unwrap();
    assert_eq!(selection.ids(), ["3"]);

    // the caller's list stays unqualified
    assert_eq!(filters.filters().next().unwrap().field(), "artist");

    let sent = transport.last_request().unwrap();
    let wire = FilterList::from_wire(sent.get("sign_filter_array").unwrap()).unwrap();
    assert_eq!(
        wire.filters().map(|f| f.field().to_string()).collect::<Vec<_>>(),
        vec!["shot_task.artist", "shot_task.pipeline"]
    );
}

#[tokio::test]
async fn test_history_get_and_count_agree() {
    let server = FakeServer::new();
    seed(&server);
    server.add_history("1", "comp", "Check");
    server.add_history("1", "comp", "Approve");
    server.add_history("2", "comp", "Check");
    server.add_history("3", "light", "Check");
    let (_, client) = server.client();
    let module = client.database(DB).module(MODULE);

    let selection = module.filter(Field::new("pipeline").eq("comp")).await.unwrap();
    let history = selection.history();

    let all = history.get(None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(history.count(None).await.unwrap(), 3);

    let checks: FilterList = Field::new("status").eq("Check").into();
    let records = history.get(Some(checks.clone())).await.unwrap();
    assert_eq!(records.len() as u64, history.count(Some(checks)).await.unwrap());
    assert!(records.iter().all(|r| r.status == "Check"));
}

#[tokio::test]
async fn test_remote_rejection_surfaces_as_transport_error() {
    let server = FakeServer::new();
    let (_, client) = server.client();
    let module = client.database(DB).module(MODULE);

    let err = module.join_module_list().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
