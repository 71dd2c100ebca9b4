use anyhow::Result;
use mathlabs_eval::utils::logging;
use mathlabs_eval::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; environment variables win
    dotenvy::dotenv().ok();

    logging::init();

    let config = Config::from_env();

    let _run = App::initialize(config).await?.run().await?;

    Ok(())
}
