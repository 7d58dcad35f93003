//! Contract tests for the SayHello RPC.
//!
//! Tests:
//! - Reply message is "Hello " + name, byte for byte
//! - Empty and unicode names round-trip unmodified
//! - Concurrent requests are independent

mod common;

use hail::proto::hail::v1::HelloRequest;

/// Reply is "Hello " followed by the request name.
#[tokio::test]
async fn test_say_hello_echoes_name() {
    let server = common::TestServer::start().await;
    let mut client = server.client().await;

    let response = client
        .say_hello(HelloRequest {
            name: "Alice".into(),
        })
        .await
        .expect("say_hello failed");

    assert_eq!(response.into_inner().message, "Hello Alice");

    server.shutdown().await;
}

/// An empty name still gets a greeting, not an error.
#[tokio::test]
async fn test_say_hello_accepts_empty_name() {
    let server = common::TestServer::start().await;
    let mut client = server.client().await;

    let response = client
        .say_hello(HelloRequest { name: String::new() })
        .await
        .expect("say_hello failed");

    assert_eq!(response.into_inner().message, "Hello ");

    server.shutdown().await;
}

/// Unicode names pass through unmodified.
#[tokio::test]
async fn test_say_hello_preserves_unicode_names() {
    let server = common::TestServer::start().await;
    let mut client = server.client().await;

    let response = client
        .say_hello(HelloRequest {
            name: "Grüße 世界".into(),
        })
        .await
        .expect("say_hello failed");

    assert_eq!(response.into_inner().message, "Hello Grüße 世界");

    server.shutdown().await;
}

/// Concurrent requests each get their own reply.
#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let server = common::TestServer::start().await;

    let mut tasks = Vec::new();
    for i in 0..8 {
        let mut client = server.client().await;
        tasks.push(async move {
            let name = format!("client-{i}");
            let response = client
                .say_hello(HelloRequest { name: name.clone() })
                .await
                .expect("say_hello failed");
            (name, response.into_inner().message)
        });
    }

    for (name, message) in futures::future::join_all(tasks).await {
        assert_eq!(message, format!("Hello {name}"));
    }

    server.shutdown().await;
}
