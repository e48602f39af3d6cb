use droplan_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    droplan_api::init_tracing();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (registry, routes)
    let (_state, router) = droplan_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    droplan_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
