//! Test utilities and server harness for Hail tests.
//!
//! Provides:
//! - In-process test server setup
//! - gRPC client helpers

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Channel, Server};

use hail::proto::hail::v1::greeter_client::GreeterClient;
use hail::proto::hail::v1::greeter_server::GreeterServer;
use hail::service::GreeterService;

/// In-process Hail server bound to a random local port.
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<(), tonic::transport::Error>>,
}

impl TestServer {
    /// Start a server on 127.0.0.1 with a random port.
    pub async fn start() -> Self {
        hail::observability::tracing::init_test_tracing();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            Server::builder()
                .add_service(GreeterServer::new(GreeterService))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
        });

        Self {
            addr,
            shutdown_tx,
            handle,
        }
    }

    /// Connect a client to the test server.
    pub async fn client(&self) -> GreeterClient<Channel> {
        GreeterClient::connect(format!("http://{}", self.addr))
            .await
            .expect("failed to connect to test server")
    }

    /// Signal shutdown and wait for the server task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}
