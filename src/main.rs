// Copyright 2026 The Prompt Relay Project
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use prompt_relay::config;
use prompt_relay::relay::Relay;
use prompt_relay::server;
use prompt_relay::upstream::{ReqwestUpstreamClient, UpstreamClient};

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "prompt-relay", about = "Prompt relay and streaming transcoder")]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "RELAY_BIND")]
    bind: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 8787, env = "RELAY_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let addr = SocketAddr::from((cli.bind, cli.port));
    tracing::info!(%addr, "prompt-relay starting");

    let config = match config::load_config(&config::EnvSource) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        endpoint = %config.endpoint,
        model = %config.default_model,
        upstream_streaming = config.upstream_streaming,
        has_credential = config.api_key.is_some(),
        "config loaded"
    );

    let upstream: Arc<dyn UpstreamClient> =
        Arc::new(ReqwestUpstreamClient::new(reqwest::Client::new(), config.clone()));
    let relay = Arc::new(Relay::new(config, upstream));

    let app = server::build_router(relay);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind to address");

    tracing::info!(%addr, "prompt-relay listening");

    axum::serve(listener, app)
        .await
        .expect("server error");
}
