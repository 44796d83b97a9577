//! CloudEvents webhook: handshake classification and delivery over HTTP.

use std::net::SocketAddr;

use serde_json::{json, Value};
use upload_tracer::config::HandshakeRule;

mod common;

#[tokio::test]
async fn test_options_handshake_by_method() {
    let addr: SocketAddr = "127.0.0.1:28401".parse().unwrap();
    let shutdown = common::spawn_service(common::service_config(addr)).await;

    let res = common::client()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{}/api/events/cloud", addr),
        )
        .header("WebHook-Request-Origin", "eventgrid.azure.net")
        .send()
        .await
        .expect("service unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["webhook-allowed-origin"],
        "eventgrid.azure.net"
    );
    assert!(res.text().await.unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_handshake_by_header() {
    let addr: SocketAddr = "127.0.0.1:28402".parse().unwrap();
    let mut config = common::service_config(addr);
    config.webhook.allowed_origin = "events.example.net".into();
    config.webhook.handshake = HandshakeRule::Header {
        name: "WebHook-Request-Origin".into(),
    };
    let shutdown = common::spawn_service(config).await;
    let client = common::client();
    let url = format!("http://{}/api/events/cloud", addr);

    let res = client
        .post(&url)
        .header("WebHook-Request-Origin", "events.example.net")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["webhook-allowed-origin"], "events.example.net");

    // Without the header an empty request is a (bad) delivery, not a handshake
    let res = client
        .request(reqwest::Method::OPTIONS, &url)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert!(res.headers().get("webhook-allowed-origin").is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn test_structured_delivery_links_or_acknowledges() {
    let addr: SocketAddr = "127.0.0.1:28403".parse().unwrap();
    let shutdown = common::spawn_service(common::service_config(addr)).await;
    let client = common::client();
    let url = format!("http://{}/api/events/cloud", addr);

    let linked = json!({
        "specversion": "1.0",
        "id": "evt-linked",
        "source": "/blobServices/default",
        "type": "Microsoft.Storage.BlobCreated",
        "traceparent": common::TRACEPARENT,
        "data": { "url": "https://acct.blob.core.windows.net/uploads/a.png" },
    });
    let res = client
        .post(&url)
        .header("content-type", "application/cloudevents+json")
        .body(linked.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["events"][0]["id"], "evt-linked");
    assert_eq!(body["events"][0]["outcome"], "linked");
    assert_eq!(body["events"][0]["link"]["operation_Id"], common::TRACE_ID);
    assert_eq!(body["events"][0]["link"]["id"], common::SPAN_ID);

    let mut malformed = linked.clone();
    malformed["id"] = json!("evt-malformed");
    malformed["traceparent"] = json!("00-4bf92f35-01");
    let body: Value = client
        .post(&url)
        .header("content-type", "application/cloudevents+json")
        .body(malformed.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["events"][0]["outcome"], "malformed");

    shutdown.trigger();
}

#[tokio::test]
async fn test_batch_and_binary_delivery() {
    let addr: SocketAddr = "127.0.0.1:28404".parse().unwrap();
    let shutdown = common::spawn_service(common::service_config(addr)).await;
    let client = common::client();
    let url = format!("http://{}/api/events/cloud", addr);

    let batch = json!([
        {
            "specversion": "1.0",
            "id": "a",
            "source": "/s",
            "type": "Microsoft.Storage.BlobCreated",
            "traceparent": common::TRACEPARENT,
        },
        {
            "specversion": "1.0",
            "id": "b",
            "source": "/s",
            "type": "Microsoft.Storage.BlobCreated",
        }
    ]);
    let body: Value = client
        .post(&url)
        .header("content-type", "application/cloudevents-batch+json")
        .body(batch.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["events"][0]["outcome"], "linked");
    assert_eq!(body["events"][1]["outcome"], "not_present");

    let res = client
        .post(&url)
        .header("ce-specversion", "1.0")
        .header("ce-id", "bin-1")
        .header("ce-source", "/s")
        .header("ce-type", "Microsoft.Storage.BlobCreated")
        .header("ce-traceparent", common::TRACEPARENT)
        .header("content-type", "application/json")
        .body(r#"{"url":"https://acct.blob.core.windows.net/uploads/a.png"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["events"][0]["id"], "bin-1");
    assert_eq!(body["events"][0]["link"]["operation_Id"], common::TRACE_ID);

    shutdown.trigger();
}

#[tokio::test]
async fn test_binary_delivery_without_data_under_both_rules() {
    let by_method: SocketAddr = "127.0.0.1:28405".parse().unwrap();
    let by_header: SocketAddr = "127.0.0.1:28406".parse().unwrap();

    let first = common::spawn_service(common::service_config(by_method)).await;
    let mut config = common::service_config(by_header);
    config.webhook.handshake = HandshakeRule::Header {
        name: "WebHook-Request-Origin".into(),
    };
    let second = common::spawn_service(config).await;
    let client = common::client();

    for (addr, method) in [
        (by_method, reqwest::Method::OPTIONS),
        (by_method, reqwest::Method::POST),
        (by_header, reqwest::Method::POST),
    ] {
        let res = client
            .request(method, format!("http://{}/api/events/cloud", addr))
            .header("WebHook-Request-Origin", "eventgrid.azure.net")
            .header("ce-specversion", "1.0")
            .header("ce-id", "bin-empty")
            .header("ce-source", "/s")
            .header("ce-type", "Microsoft.Storage.BlobCreated")
            .header("ce-traceparent", common::TRACEPARENT)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert!(res.headers().get("webhook-allowed-origin").is_none());
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["events"][0]["id"], "bin-empty");
        assert_eq!(body["events"][0]["outcome"], "linked");
        assert_eq!(body["events"][0]["link"]["operation_Id"], common::TRACE_ID);
    }

    first.trigger();
    second.trigger();
}
