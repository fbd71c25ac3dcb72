use anyhow::Context;
use cardstack_lib::elaborate::start_server;
use cardstack_lib::RelayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = RelayConfig::from_env().context("Failed to read relay configuration")?;
    log::debug!("Relay config: {:?}", config);

    let server = start_server(&config)
        .await
        .context("Failed to start elaboration relay")?;
    println!("Elaboration relay listening on port {}", server.port);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    server.stop().await;

    Ok(())
}
