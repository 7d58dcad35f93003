//! Generated protobuf and gRPC code for the Hail greeter service.
//!
//! The source of truth is `proto/hail/v1/hail.proto` at the workspace root;
//! this crate exists so the server and the CLI share one generated stub.

pub mod hail {
    pub mod v1 {
        tonic::include_proto!("hail.v1");
    }
}
