#[macro_use]
extern crate log;

use gamesave::{config, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    info!("gamesave is booting up, please standby...");

    info!("Reading configuration");
    let configuration = config::configure()?;

    server::run(configuration).await?;
    Ok(())
}
