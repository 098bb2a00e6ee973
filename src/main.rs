use std::sync::Arc;

use log::info;
use recipe_clipper::{load_config, server, Clipper};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = load_config()?;
    let bind = config.server.bind.clone();
    let clipper = Clipper::builder().config(config).build()?;

    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|e| format!("failed to bind {bind}: {e}"))?;
    info!("Starting recipe clipper on {}", bind);

    server::serve(listener, Arc::new(clipper)).await?;
    Ok(())
}
