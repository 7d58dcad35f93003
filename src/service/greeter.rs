//! SayHello RPC handler implementation.

use std::time::Instant;
use tonic::{Request, Response, Status};

use crate::generate_request_id;
use crate::observability::metrics;
use crate::proto::hail::v1::{HelloReply, HelloRequest};

/// Handle a SayHello RPC request.
///
/// The reply is "Hello " followed by the request name, unmodified.
#[tracing::instrument(skip(request), fields(request_id, name))]
pub async fn handle_say_hello(
    request: Request<HelloRequest>,
) -> Result<Response<HelloReply>, Status> {
    let started = Instant::now();
    let req = request.into_inner();

    let request_id = generate_request_id();
    tracing::Span::current().record("request_id", request_id.as_str());
    tracing::Span::current().record("name", req.name.as_str());

    let reply = HelloReply {
        message: format!("Hello {}", req.name),
    };

    metrics::record_rpc("SayHello", "ok", started.elapsed().as_secs_f64());
    tracing::debug!(message = %reply.message, "Greeting sent");

    Ok(Response::new(reply))
}
