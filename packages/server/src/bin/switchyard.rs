//! Gateway entrypoint: resolve configuration, bootstrap the queue
//! connection, assemble the dispatcher, and serve until interrupted.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use switchyard_server::config::GatewayConfig;
use switchyard_server::dispatch::{Dispatcher, RouteTable};
use switchyard_server::network::{NetworkConfig, NetworkModule};
use switchyard_server::transport::{
    establish, BlockingHttpClient, RemoteCallClient, TransportKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = GatewayConfig::parse();

    // The one strictly sequential phase: the queue connection and topology
    // must exist -- or startup must fail -- before the listener binds.
    let publisher = establish(&config)
        .await
        .context("queue bootstrap failed; refusing to start")?;

    let mut dispatcher = Dispatcher::new(RouteTable::from_config(&config));
    dispatcher.register(
        TransportKind::BlockingHttp,
        Arc::new(BlockingHttpClient::new()),
    );
    dispatcher.register(TransportKind::QueuePublish, Arc::new(publisher));
    dispatcher.register(TransportKind::RemoteCall, Arc::new(RemoteCallClient::new()));

    let network = NetworkConfig {
        host: config.bind_host.clone(),
        port: config.bind_port,
        ..NetworkConfig::default()
    };
    let mut module = NetworkModule::new(network, Arc::new(dispatcher));
    let port = module.start().await.context("failed to bind listener")?;
    info!(host = %config.bind_host, port, "gateway listening");

    module
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
}
