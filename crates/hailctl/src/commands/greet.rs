//! Greet command implementation.

use anyhow::{Context, Result};
use hail_proto::hail::v1::greeter_client::GreeterClient;
use hail_proto::hail::v1::HelloRequest;
use serde::Serialize;

use crate::OutputFormat;

#[derive(Serialize)]
struct GreetOutput {
    name: String,
    message: String,
}

pub async fn run(endpoint: &str, name: &str, format: OutputFormat) -> Result<()> {
    let mut client = GreeterClient::connect(endpoint.to_string())
        .await
        .context("failed to connect to server")?;

    let reply = client
        .say_hello(HelloRequest {
            name: name.to_string(),
        })
        .await
        .context("greet failed")?
        .into_inner();

    let output = GreetOutput {
        name: name.to_string(),
        message: reply.message,
    };

    match format {
        OutputFormat::Text => {
            println!("{}", output.message);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
