//! HTTP-level scenarios for the notification channels, against httpmock.
//!
//! GREEN when:
//! - each channel hits its documented endpoint with its documented payload
//! - in-band refusals surface as Rejected, HTTP failures as NetworkUnavailable
//! - a broadcast whose first channel fails still reaches the later channels
//! - error text never contains the credential carried in the URL

use httpmock::prelude::*;
use nw_notify::{BarkNotifier, FeishuNotifier, Notifier, NotifierSet, NotifyError, PushmeNotifier};

// ---------------------------------------------------------------------------
// Feishu
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feishu_posts_interactive_card_to_hook() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/open-apis/bot/v2/hook/tok-123")
                .json_body_partial(r#"{"msg_type":"interactive"}"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"code":0,"msg":"success","data":{}}"#);
        })
        .await;

    let n = FeishuNotifier::new_with_base_url(server.base_url(), "tok-123".into()).unwrap();
    n.send_markdown("fund discount", "**price** 99.99").await.unwrap();
    m.assert_async().await;
}

#[tokio::test]
async fn feishu_nonzero_code_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/open-apis/bot/v2/hook/tok-123");
            then.status(200)
                .body(r#"{"code":19021,"msg":"sign match fail or timestamp is not within one hour from current time"}"#);
        })
        .await;

    let n = FeishuNotifier::new_with_base_url(server.base_url(), "tok-123".into()).unwrap();
    match n.send_markdown("t", "b").await {
        Err(NotifyError::Rejected { channel, message }) => {
            assert_eq!(channel, "feishu");
            assert!(message.contains("19021"), "got: {message}");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// PushMe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pushme_posts_form_with_prefixed_title() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/")
                .x_www_form_urlencoded_tuple("push_key", "pk-1")
                .x_www_form_urlencoded_tuple("title", "[#arbitrage!*]fund discount")
                .x_www_form_urlencoded_tuple("type", "markdown");
            then.status(200).body("success");
        })
        .await;

    let n = PushmeNotifier::new_with_base_url(
        server.base_url(),
        "pk-1".into(),
        "arbitrage".into(),
        "*".into(),
    )
    .unwrap();
    n.send_markdown("fund discount", "body").await.unwrap();
    m.assert_async().await;
}

#[tokio::test]
async fn pushme_non_success_body_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/");
            then.status(200).body("push_key error");
        })
        .await;

    let n = PushmeNotifier::new_with_base_url(server.base_url(), "pk-1".into(), "c".into(), "i".into())
        .unwrap();
    assert_eq!(
        n.send_markdown("t", "b").await,
        Err(NotifyError::Rejected {
            channel: "pushme",
            message: "push_key error".to_string(),
        })
    );
}

// ---------------------------------------------------------------------------
// Bark
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bark_posts_json_to_device_path() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/dev-key-9")
                .json_body_partial(r#"{"title":"t","group":"navwatch"}"#);
            then.status(200)
                .body(r#"{"code":200,"message":"success","timestamp":1700000000}"#);
        })
        .await;

    let n = BarkNotifier::new_with_base_url(server.base_url(), "dev-key-9".into(), "navwatch".into())
        .unwrap();
    n.send_markdown("t", "b").await.unwrap();
    m.assert_async().await;
}

#[tokio::test]
async fn bark_http_error_is_network_unavailable_without_key() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/dev-key-9");
            then.status(500);
        })
        .await;

    let n = BarkNotifier::new_with_base_url(server.base_url(), "dev-key-9".into(), "g".into())
        .unwrap();
    let err = n.send_markdown("t", "b").await.unwrap_err();
    assert!(matches!(err, NotifyError::NetworkUnavailable { channel: "bark", .. }));
    assert!(!err.to_string().contains("dev-key-9"), "got: {err}");
}

#[tokio::test]
async fn refused_connection_does_not_leak_token() {
    let n = FeishuNotifier::new_with_base_url("http://127.0.0.1:9".into(), "tok-secret-77".into())
        .unwrap();
    let err = n.send_markdown("t", "b").await.unwrap_err();
    assert!(matches!(err, NotifyError::NetworkUnavailable { .. }));
    assert!(!err.to_string().contains("tok-secret-77"), "got: {err}");
}

// ---------------------------------------------------------------------------
// Broadcast
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_reaches_later_channels_after_failure() {
    let server = MockServer::start_async().await;
    let feishu = server
        .mock_async(|when, then| {
            when.method(POST).path("/open-apis/bot/v2/hook/tok-123");
            then.status(502);
        })
        .await;
    let pushme = server
        .mock_async(|when, then| {
            when.method(POST).path("/");
            then.status(200).body("success");
        })
        .await;
    let bark = server
        .mock_async(|when, then| {
            when.method(POST).path("/dev-key-9");
            then.status(200).body(r#"{"code":200,"message":"success"}"#);
        })
        .await;

    let set = NotifierSet::new()
        .with(Box::new(
            FeishuNotifier::new_with_base_url(server.base_url(), "tok-123".into()).unwrap(),
        ))
        .with(Box::new(
            PushmeNotifier::new_with_base_url(server.base_url(), "pk".into(), "c".into(), "i".into())
                .unwrap(),
        ))
        .with(Box::new(
            BarkNotifier::new_with_base_url(server.base_url(), "dev-key-9".into(), "g".into())
                .unwrap(),
        ));

    let report = set.broadcast("t", "b").await;
    feishu.assert_hits_async(1).await;
    pushme.assert_hits_async(1).await;
    bark.assert_hits_async(1).await;

    assert_eq!(report.attempted(), 3);
    assert_eq!(report.delivered(), 2);
    assert!(matches!(
        report.first_error(),
        Some(NotifyError::NetworkUnavailable { channel: "feishu", .. })
    ));
}
