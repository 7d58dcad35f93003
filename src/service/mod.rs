//! gRPC service handlers for Hail.

pub mod greeter;

use tonic::{Request, Response, Status};

use crate::proto::hail::v1::greeter_server::Greeter;
use crate::proto::hail::v1::{HelloReply, HelloRequest};

/// Greeter gRPC service implementation.
///
/// The scaffold ships exactly one handler; anything demo-specific lives in
/// [`greeter`].
#[derive(Debug, Default, Clone)]
pub struct GreeterService;

#[tonic::async_trait]
impl Greeter for GreeterService {
    async fn say_hello(
        &self,
        request: Request<HelloRequest>,
    ) -> Result<Response<HelloReply>, Status> {
        greeter::handle_say_hello(request).await
    }
}
