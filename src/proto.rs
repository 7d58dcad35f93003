//! Re-exported protobuf and gRPC generated code.

pub use hail_proto::*;
