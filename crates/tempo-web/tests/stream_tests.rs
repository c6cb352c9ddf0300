//! Integration tests for the time stream: wire format, connection
//! teardown, server shutdown, and a full round trip through the
//! terminal consumer over a real socket.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::DateTime;
use futures::StreamExt;
use tempo_client::{Backoff, ConnectionState, Consumer, ConsumerOptions, HttpTransport};
use tempo_stream::{Frame, SseDecoder};
use tempo_types::{StreamEvent, TIME_EVENT};
use tempo_web::{AppState, build_router, serve};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tower::ServiceExt;

const WAIT: Duration = Duration::from_secs(5);

/// Read the body until `count` events have been decoded.
async fn read_events(
    body: &mut axum::body::BodyDataStream,
    decoder: &mut SseDecoder,
    count: usize,
) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while events.len() < count {
        let chunk = body.next().await.unwrap().unwrap();
        for frame in decoder.push(&chunk) {
            if let Frame::Event(event) = frame {
                events.push(event);
            }
        }
    }
    events
}

async fn wait_for_idle(state: &AppState) {
    timeout(WAIT, async {
        while state.active_streams() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn stream_emits_named_time_events() {
    let state = common::state();
    let response = build_router(Arc::clone(&state))
        .oneshot(Request::get("/sse/time").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    let mut body = response.into_body().into_data_stream();
    let mut decoder = SseDecoder::new();
    let events = timeout(WAIT, read_events(&mut body, &mut decoder, 3)).await.unwrap();

    let mut previous = None;
    for event in &events {
        assert_eq!(event.name, TIME_EVENT);
        let at = DateTime::parse_from_rfc3339(&event.payload).unwrap();
        if let Some(prev) = previous {
            assert!(at > prev);
        }
        previous = Some(at);
    }
    assert_eq!(state.active_streams(), 1);
}

#[tokio::test]
async fn dropping_the_response_releases_the_producer() {
    let state = common::state();
    let response = build_router(Arc::clone(&state))
        .oneshot(Request::get("/sse/time").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let mut body = response.into_body().into_data_stream();
    let mut decoder = SseDecoder::new();
    timeout(WAIT, read_events(&mut body, &mut decoder, 1)).await.unwrap();
    assert_eq!(state.active_streams(), 1);

    drop(body);
    wait_for_idle(&state).await;
}

#[tokio::test]
async fn shutdown_ends_every_open_stream() {
    let state = common::state();
    let router = build_router(Arc::clone(&state));

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(Request::get("/sse/time").body(Body::empty()).unwrap())
            .await
            .unwrap();
        bodies.push(response.into_body().into_data_stream());
    }
    assert_eq!(state.active_streams(), 2);

    state.shutdown.cancel();
    for mut body in bodies {
        // Drain what was buffered; the stream must then end on its own.
        timeout(WAIT, async { while body.next().await.is_some() {} })
            .await
            .unwrap();
    }
    wait_for_idle(&state).await;
}

#[tokio::test]
async fn shutdown_ends_a_stream_nobody_reads() {
    let state = common::state();
    let response = build_router(Arc::clone(&state))
        .oneshot(Request::get("/sse/time").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = response.into_body();

    // Long enough at the test interval to fill the connection's buffer,
    // leaving the producer blocked on a write.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(state.active_streams(), 1);

    state.shutdown.cancel();
    wait_for_idle(&state).await;
    drop(body);
}

#[tokio::test]
async fn consumer_follows_the_stream_and_survives_shutdown() {
    let state = common::state();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve(listener, Arc::clone(&state)));

    let base_url = format!("http://{addr}");
    let transport = HttpTransport::new(format!("{base_url}/sse/time")).unwrap();
    let fallback = transport.fetch_index_data(&base_url).await.unwrap().time;

    let options = ConsumerOptions {
        event_name: TIME_EVENT.to_owned(),
        backoff: Backoff {
            initial: Duration::from_millis(50),
            max: Duration::from_millis(200),
            max_attempts: Some(3),
        },
    };
    let subscription = Consumer::new(transport, options).spawn(fallback.clone());
    assert_eq!(subscription.latest(), fallback);

    // Two stream events replace the fallback.
    let mut latest = subscription.watch_latest();
    for _ in 0..2 {
        timeout(WAIT, latest.changed()).await.unwrap().unwrap();
    }
    let seen = subscription.latest();
    assert_ne!(seen, fallback);
    assert!(DateTime::parse_from_rfc3339(&seen).is_ok());

    // The server goes away: the consumer reconnects and keeps the value.
    state.shutdown.cancel();
    server.await.unwrap().unwrap();

    let mut states = subscription.watch_state();
    timeout(WAIT, async {
        loop {
            let current = *states.borrow_and_update();
            if matches!(
                current,
                ConnectionState::Reconnecting { .. } | ConnectionState::Exhausted { .. }
            ) {
                break;
            }
            states.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
    assert!(!subscription.latest().is_empty());

    subscription.close().await;
}
