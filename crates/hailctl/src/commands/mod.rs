//! hailctl subcommand implementations.

pub mod greet;
